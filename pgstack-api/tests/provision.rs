use std::collections::BTreeMap;

use pgstack::descriptor::{ResourceKind, ResourceSpec, SecretSpec};
use pgstack::outcome::{
    ApplyStatus, OutcomeSummary, ReconciliationOutcome, TeardownOutcome, TeardownStatus,
};
use pgstack::plan::secret_name;
use pgstack_telemetry::tracing::init_test_tracing;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::json;

use crate::support::test_app::{provisioning_request, spawn_test_app};

mod support;

const NAMESPACE: &str = "default";

#[tokio::test(flavor = "multi_thread")]
async fn provisioning_a_fresh_app_creates_the_full_stack() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.provision(&provisioning_request("app1")).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: ReconciliationOutcome = response.json().await.expect("failed to parse outcome");
    assert!(matches!(outcome.summary, OutcomeSummary::Success));
    assert_eq!(outcome.results.len(), 6);
    assert!(outcome
        .results
        .iter()
        .all(|result| result.status == ApplyStatus::Created));
    let kinds: Vec<ResourceKind> = outcome.results.iter().map(|result| result.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ResourceKind::Secret,
            ResourceKind::ConfigMap,
            ResourceKind::PersistentVolume,
            ResourceKind::PersistentVolumeClaim,
            ResourceKind::Workload,
            ResourceKind::NetworkEndpoint,
        ]
    );
    assert_eq!(app.gateway.object_count().await, 6);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeating_a_request_changes_nothing() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    app.provision(&provisioning_request("app1")).await;

    // Act
    let response = app.provision(&provisioning_request("app1")).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: ReconciliationOutcome = response.json().await.expect("failed to parse outcome");
    assert!(outcome
        .results
        .iter()
        .all(|result| result.status == ApplyStatus::Unchanged));
    assert_eq!(
        app.gateway
            .create_count(ResourceKind::Secret, NAMESPACE, &secret_name("app1"))
            .await,
        1
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_app_names_are_rejected_with_400() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.provision(&provisioning_request("Not-Valid")).await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("failed to parse error");
    assert!(body["error"].as_str().unwrap().contains("Not-Valid"));
    assert_eq!(app.gateway.object_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_positive_quantities_are_rejected_with_400() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    let body = json!({
        "app_name": "app1",
        "resource_requests": { "cpu": "250m", "memory": "256Mi", "storage": "0" },
        "exposure_policy": "cluster_internal",
    });

    // Act
    let response = app.provision_raw(body).await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn secret_drift_is_reported_as_a_conflict() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    app.provision(&provisioning_request("app1")).await;

    // Simulate an out-of-band edit that mangles the credential Secret.
    let overwritten = app
        .gateway
        .overwrite_spec(
            ResourceKind::Secret,
            NAMESPACE,
            &secret_name("app1"),
            ResourceSpec::Secret(SecretSpec {
                data: BTreeMap::from([(
                    "POSTGRES_USER".to_string(),
                    SecretString::from("intruder".to_string()),
                )]),
            }),
        )
        .await;
    assert!(overwritten);

    // Act
    let response = app.provision(&provisioning_request("app1")).await;

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let outcome: ReconciliationOutcome = response.json().await.expect("failed to parse outcome");
    assert!(outcome.has_immutable_drift());
}

#[tokio::test(flavor = "multi_thread")]
async fn teardown_deletes_the_stack() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;
    app.provision(&provisioning_request("app1")).await;

    // Act
    let response = app.teardown("app1").await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: TeardownOutcome = response.json().await.expect("failed to parse outcome");
    assert!(outcome
        .results
        .iter()
        .all(|result| result.status == TeardownStatus::Deleted));
    assert_eq!(app.gateway.object_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn teardown_of_an_absent_app_reports_every_resource_absent() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.teardown("ghost").await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: TeardownOutcome = response.json().await.expect("failed to parse outcome");
    assert!(outcome
        .results
        .iter()
        .all(|result| result.status == TeardownStatus::Absent));
}

#[tokio::test(flavor = "multi_thread")]
async fn teardown_with_an_invalid_name_is_rejected_with_400() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.teardown("Not-Valid").await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
