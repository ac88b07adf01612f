mod common;

use aeroform_airflow::{ADMIN_PASSWORD_STUB_ON_IMPORT, ClusterModel, cluster_to_state};
use aeroform_plugin::{
    CreateRequest, DeleteRequest, Diagnostics, DynamicValue, ImportStateRequest, ReadRequest,
    Resource, ResourceWithImportState, UpdateRequest,
};
use aeroform_sdk::InMemoryClusterService;
use common::{DEFAULT_FOLDER, TestProvider, cluster_config};
use serde_json::json;
use std::time::Duration;

async fn create(provider: &TestProvider, config: &serde_json::Value) -> DynamicValue {
    let response = provider
        .resource
        .create(CreateRequest {
            plan: provider.plan_create(config),
        })
        .await;
    assert!(
        !response.diagnostics.has_error(),
        "{:?}",
        response.diagnostics
    );
    response.state.unwrap()
}

fn decode(state: &DynamicValue) -> ClusterModel {
    state.get(&mut Diagnostics::new()).unwrap()
}

#[tokio::test]
async fn test_create_populates_computed_attributes() {
    let provider = TestProvider::new().await;
    let state = decode(&create(&provider, &cluster_config()).await);

    let cluster_id = state.id.get().unwrap().clone();
    assert!(cluster_id.starts_with("c9q"));
    assert_eq!(state.folder_id.get().map(String::as_str), Some(DEFAULT_FOLDER));
    assert_eq!(state.status.get().map(String::as_str), Some("RUNNING"));
    assert!(state.created_at.is_known());
    assert_eq!(state.deletion_protection.get(), Some(&false));
    assert_eq!(
        state.admin_password.get().map(String::as_str),
        Some("s3cret-Passw0rd")
    );

    let remote = provider.service.cluster(&cluster_id).await.unwrap();
    assert_eq!(remote.config.airflow.config["core.load_examples"], "False");
    assert_eq!(remote.folder_id, DEFAULT_FOLDER);
}

#[tokio::test]
async fn test_read_after_create_matches_remote_cluster() {
    let provider = TestProvider::new().await;
    let created = create(&provider, &cluster_config()).await;

    let response = provider
        .resource
        .read(ReadRequest {
            state: created.clone(),
        })
        .await;
    assert!(response.diagnostics.is_empty());
    let read = response.state.unwrap();
    assert_eq!(read, created);

    let mut expected = decode(&created);
    let remote = provider
        .service
        .cluster(expected.id.get().unwrap())
        .await
        .unwrap();
    assert!(cluster_to_state(&remote, &mut expected).is_empty());
    assert_eq!(decode(&read), expected);
}

#[tokio::test]
async fn test_read_of_deleted_cluster_removes_resource() {
    let provider = TestProvider::new().await;
    let created = create(&provider, &cluster_config()).await;
    let cluster_id = decode(&created).id.get().unwrap().clone();

    provider.service.remove(&cluster_id).await;

    let response = provider.resource.read(ReadRequest { state: created }).await;
    assert!(response.state.is_none());
    assert!(response.diagnostics.is_empty());
}

#[tokio::test]
async fn test_read_without_id_is_an_error() {
    let provider = TestProvider::new().await;
    provider
        .service
        .insert(aeroform_sdk::Cluster::default())
        .await;

    let response = provider
        .resource
        .read(ReadRequest {
            state: DynamicValue::new(json!({ "name": "airflow-test" })),
        })
        .await;
    assert!(response.state.is_none());
    let error = response.diagnostics.errors().next().unwrap();
    assert_eq!(error.summary, "Missing Airflow cluster ID");
    assert_eq!(
        error.attribute.as_ref().map(ToString::to_string).as_deref(),
        Some("id")
    );
    assert!(provider.service.calls().await.is_empty());
}

#[tokio::test]
async fn test_create_failure_returns_no_state() {
    let provider = TestProvider::new().await;
    provider
        .service
        .fail_next("create", "quota limit exceeded")
        .await;

    let response = provider
        .resource
        .create(CreateRequest {
            plan: provider.plan_create(&cluster_config()),
        })
        .await;
    assert!(response.state.is_none());
    let error = response.diagnostics.errors().next().unwrap();
    assert_eq!(error.summary, "Failed to create Airflow cluster");
    assert!(error.detail.contains("quota limit exceeded"));
}

#[tokio::test(start_paused = true)]
async fn test_create_timeout_from_config() {
    let service = InMemoryClusterService::new().with_latency(Duration::from_secs(3600));
    let provider = TestProvider::with_service(service).await;

    let mut config = cluster_config();
    config["timeouts"] = json!({ "create": "10m" });

    let response = provider
        .resource
        .create(CreateRequest {
            plan: provider.plan_create(&config),
        })
        .await;
    assert!(response.state.is_none());
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics.errors().next().unwrap().summary,
        "Airflow cluster create timed out"
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_default_timeout() {
    let service = InMemoryClusterService::new().with_latency(Duration::from_secs(31 * 60));
    let provider = TestProvider::with_service(service).await;

    let started = tokio::time::Instant::now();
    let response = provider
        .resource
        .create(CreateRequest {
            plan: provider.plan_create(&cluster_config()),
        })
        .await;
    assert!(response.state.is_none());
    assert!(response.diagnostics.has_error());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(30 * 60));
    assert!(elapsed < Duration::from_secs(31 * 60));
}

#[tokio::test]
async fn test_update_sends_changed_fields() {
    let provider = TestProvider::new().await;
    let created = create(&provider, &cluster_config()).await;

    let mut config = cluster_config();
    config["description"] = json!("nightly DAG runner");
    config["worker"] = json!({ "min_count": 2, "max_count": 4, "resource_preset_id": "c1-m4" });

    let response = provider
        .resource
        .update(UpdateRequest {
            plan: provider.plan_update(&config, &created),
            state: created,
        })
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let state = decode(&response.state.unwrap());
    assert_eq!(
        state.description.get().map(String::as_str),
        Some("nightly DAG runner")
    );
    let remote = provider
        .service
        .cluster(state.id.get().unwrap())
        .await
        .unwrap();
    assert_eq!(remote.config.worker.max_count, 4);
    assert_eq!(remote.description, "nightly DAG runner");
}

#[tokio::test]
async fn test_update_without_changes_skips_api() {
    let provider = TestProvider::new().await;
    let created = create(&provider, &cluster_config()).await;
    let calls_before = provider.service.calls().await;

    let mut config = cluster_config();
    config["timeouts"] = json!({ "update": "2h" });

    let response = provider
        .resource
        .update(UpdateRequest {
            plan: provider.plan_update(&config, &created),
            state: created,
        })
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(provider.service.calls().await, calls_before);

    let state = decode(&response.state.unwrap());
    assert_eq!(
        state.timeouts.get().unwrap().update.get().map(String::as_str),
        Some("2h")
    );
}

#[tokio::test]
async fn test_update_of_admin_password_warns() {
    let provider = TestProvider::new().await;
    let created = create(&provider, &cluster_config()).await;

    let mut config = cluster_config();
    config["admin_password"] = json!("an0ther-Passw0rd");

    let response = provider
        .resource
        .update(UpdateRequest {
            plan: provider.plan_update(&config, &created),
            state: created,
        })
        .await;
    assert!(!response.diagnostics.has_error());
    let warning = response.diagnostics.warnings().next().unwrap();
    assert_eq!(
        warning.attribute.as_ref().map(ToString::to_string).as_deref(),
        Some("admin_password")
    );
    assert!(
        !provider.service.calls().await.contains(&"update"),
        "password changes are not sent"
    );
}

#[tokio::test(start_paused = true)]
async fn test_update_timeout() {
    let (provider, created) = slow_provider_with_cluster(Duration::from_secs(600)).await;

    let mut config = cluster_config();
    config["name"] = json!("airflow-renamed");
    config["timeouts"] = json!({ "update": "1m" });

    let response = provider
        .resource
        .update(UpdateRequest {
            plan: provider.plan_update(&config, &created),
            state: created,
        })
        .await;
    assert!(response.state.is_none());
    assert_eq!(
        response.diagnostics.errors().next().unwrap().summary,
        "Airflow cluster update timed out"
    );
}

/// Provider whose service answers every call after `latency`, holding a copy
/// of a cluster created through a fast provider
async fn slow_provider_with_cluster(latency: Duration) -> (TestProvider, DynamicValue) {
    let seed = TestProvider::new().await;
    let created = create(&seed, &cluster_config()).await;
    let cluster_id = decode(&created).id.get().unwrap().clone();

    let slow = InMemoryClusterService::new().with_latency(latency);
    slow.insert(seed.service.cluster(&cluster_id).await.unwrap())
        .await;
    (TestProvider::with_service(slow).await, created)
}

#[tokio::test(start_paused = true)]
async fn test_update_default_timeout() {
    let (provider, created) = slow_provider_with_cluster(Duration::from_secs(61 * 60)).await;

    let mut config = cluster_config();
    config["name"] = json!("airflow-renamed");

    let started = tokio::time::Instant::now();
    let response = provider
        .resource
        .update(UpdateRequest {
            plan: provider.plan_update(&config, &created),
            state: created,
        })
        .await;
    assert!(response.state.is_none());
    let error = response.diagnostics.errors().next().unwrap();
    assert_eq!(error.summary, "Airflow cluster update timed out");
    assert!(error.detail.contains("1h"));

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(60 * 60));
    assert!(elapsed < Duration::from_secs(61 * 60));
}

#[tokio::test(start_paused = true)]
async fn test_delete_default_timeout() {
    let (provider, created) = slow_provider_with_cluster(Duration::from_secs(16 * 60)).await;

    let started = tokio::time::Instant::now();
    let response = provider.resource.delete(DeleteRequest { state: created }).await;
    assert_eq!(response.diagnostics.len(), 1);
    let error = response.diagnostics.errors().next().unwrap();
    assert_eq!(error.summary, "Airflow cluster delete timed out");
    assert!(error.detail.contains("15m"));

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(15 * 60));
    assert!(elapsed < Duration::from_secs(16 * 60));
}

#[tokio::test(start_paused = true)]
async fn test_delete_timeout_from_state() {
    let (provider, created) = slow_provider_with_cluster(Duration::from_secs(600)).await;
    let mut state = created.as_json().clone();
    state["timeouts"] = json!({ "delete": "2m" });

    let started = tokio::time::Instant::now();
    let response = provider
        .resource
        .delete(DeleteRequest {
            state: DynamicValue::new(state),
        })
        .await;
    assert_eq!(
        response.diagnostics.errors().next().unwrap().summary,
        "Airflow cluster delete timed out"
    );
    assert!(started.elapsed() < Duration::from_secs(3 * 60));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let provider = TestProvider::new().await;
    let created = create(&provider, &cluster_config()).await;
    let cluster_id = decode(&created).id.get().unwrap().clone();

    let response = provider
        .resource
        .delete(DeleteRequest {
            state: created.clone(),
        })
        .await;
    assert!(response.diagnostics.is_empty());
    assert!(provider.service.cluster(&cluster_id).await.is_none());

    let response = provider.resource.delete(DeleteRequest { state: created }).await;
    assert!(response.diagnostics.is_empty());
}

#[tokio::test]
async fn test_delete_protected_cluster_fails() {
    let provider = TestProvider::new().await;
    let mut config = cluster_config();
    config["deletion_protection"] = json!(true);
    let created = create(&provider, &config).await;

    let response = provider.resource.delete(DeleteRequest { state: created }).await;
    assert_eq!(
        response.diagnostics.errors().next().unwrap().summary,
        "Failed to delete Airflow cluster"
    );
}

#[tokio::test]
async fn test_import_sets_password_stub() {
    let provider = TestProvider::new().await;
    let created = create(&provider, &cluster_config()).await;
    let cluster_id = decode(&created).id.get().unwrap().clone();

    let import = provider.resource.as_import_state().unwrap();
    let response = import
        .import_state(ImportStateRequest {
            id: cluster_id.clone(),
        })
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(
        response.state.as_json(),
        &json!({ "id": cluster_id, "admin_password": ADMIN_PASSWORD_STUB_ON_IMPORT })
    );

    let response = provider
        .resource
        .read(ReadRequest {
            state: response.state,
        })
        .await;
    let state = decode(&response.state.unwrap());
    assert_eq!(state.name.get().map(String::as_str), Some("airflow-test"));
    assert_eq!(
        state.admin_password.get().map(String::as_str),
        Some(ADMIN_PASSWORD_STUB_ON_IMPORT)
    );
}

#[tokio::test]
async fn test_import_of_unknown_id_still_sets_stub() {
    let provider = TestProvider::new().await;
    let import = provider.resource.as_import_state().unwrap();
    let response = import
        .import_state(ImportStateRequest {
            id: "c9q-whatever".to_string(),
        })
        .await;
    assert_eq!(
        response.state.as_json()["admin_password"],
        json!(ADMIN_PASSWORD_STUB_ON_IMPORT)
    );
}
