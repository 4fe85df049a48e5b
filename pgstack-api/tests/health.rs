use pgstack_telemetry::tracing::init_test_tracing;
use reqwest::StatusCode;

use crate::support::test_app::spawn_test_app;

mod support;

// The 404 path (an empty result set) needs a reachable database and is
// covered by the error-mapping tests in the health route module; here the
// pool points at a closed port, so the query fails as a connection error.
#[tokio::test(flavor = "multi_thread")]
async fn health_query_failure_returns_500_without_details() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.health("app1").await;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("failed to parse error");
    assert_eq!(body["error"], "internal server error");
}
