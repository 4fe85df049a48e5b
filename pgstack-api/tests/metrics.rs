use pgstack_telemetry::tracing::init_test_tracing;

use crate::support::test_app::{provisioning_request, spawn_test_app};

mod support;

#[tokio::test(flavor = "multi_thread")]
async fn metrics_endpoint_returns_200() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("failed to execute request");

    // Assert
    assert!(response.status().is_success());
}

// The reconcile counters are emitted by the core crate while the recorder
// is installed by this one; both must register against the same global
// recorder for the series to show up in the exposition.
#[tokio::test(flavor = "multi_thread")]
async fn reconcile_metrics_reach_the_exposition() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    app.provision(&provisioning_request("app1")).await;

    // Act
    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("failed to execute request");

    // Assert
    assert!(response.status().is_success());
    let exposition = response.text().await.expect("failed to read exposition");
    assert!(exposition.contains("reconcile_attempts"));
    assert!(exposition.contains("reconcile_ok"));
    assert!(exposition.contains("reconcile_latency_ms"));
}

#[tokio::test(flavor = "multi_thread")]
async fn openapi_document_is_served() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app
        .client
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .expect("failed to execute request");

    // Assert
    assert!(response.status().is_success());
    let document: serde_json::Value = response.json().await.expect("failed to parse document");
    assert!(document["paths"]["/provision"].is_object());
    assert!(document["paths"]["/status/{app_name}"].is_object());
}
