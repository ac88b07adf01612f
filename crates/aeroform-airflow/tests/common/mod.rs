use aeroform_airflow::AirflowProvider;
use aeroform_plugin::plan::propose_new_state;
use aeroform_plugin::{DynamicValue, ProviderServer, Resource};
use aeroform_sdk::InMemoryClusterService;
use serde_json::{Value, json};
use std::sync::Arc;

pub const RESOURCE_TYPE: &str = "aeroform_airflow_cluster";
#[allow(dead_code)]
pub const DEFAULT_FOLDER: &str = "b1g-default";

pub struct TestProvider {
    pub service: Arc<InMemoryClusterService>,
    pub resource: Box<dyn Resource>,
}

impl TestProvider {
    pub async fn new() -> Self {
        Self::with_service(InMemoryClusterService::new()).await
    }

    pub async fn with_service(service: InMemoryClusterService) -> Self {
        let service = Arc::new(service);
        let provider = AirflowProvider::with_service(service.clone(), Some(DEFAULT_FOLDER.into()));
        let server = ProviderServer::start(&provider).await.unwrap();
        let resource = server.resource(RESOURCE_TYPE).ok().unwrap();
        Self { service, resource }
    }

    #[allow(dead_code)]
    /// Planned state for creating a cluster from `config`
    pub fn plan_create(&self, config: &Value) -> DynamicValue {
        propose_new_state(
            &self.resource.schema(),
            &DynamicValue::new(config.clone()),
            None,
        )
    }

    #[allow(dead_code)]
    /// Planned state for updating `prior` to `config`
    pub fn plan_update(&self, config: &Value, prior: &DynamicValue) -> DynamicValue {
        propose_new_state(
            &self.resource.schema(),
            &DynamicValue::new(config.clone()),
            Some(prior),
        )
    }
}

/// A complete, valid cluster configuration
pub fn cluster_config() -> Value {
    json!({
        "name": "airflow-test",
        "description": "DAG runner",
        "labels": { "env": "test" },
        "admin_password": "s3cret-Passw0rd",
        "service_account_id": "aje-sa",
        "subnet_ids": ["e9b-subnet-a", "e2l-subnet-b"],
        "airflow_config": {
            "core": { "load_examples": "False" },
            "webserver": { "expose_config": "True" }
        },
        "pip_packages": ["pandas"],
        "code_sync": { "s3": { "bucket": "dags-bucket" } },
        "webserver": { "count": 1, "resource_preset_id": "c1-m4" },
        "scheduler": { "count": 1, "resource_preset_id": "c1-m4" },
        "worker": { "min_count": 1, "max_count": 2, "resource_preset_id": "c1-m4" },
        "logging": { "enabled": true, "log_group_id": "e23-group", "min_level": "INFO" }
    })
}
