//! In-process cluster service
//!
//! Behaves like the control plane closely enough to drive a resource end to
//! end: assigns IDs, fills server-side fields, applies update masks and
//! reports missing clusters as not found. Latency, pending operations and
//! one-shot failures can be injected.

use crate::airflow::{
    Cluster, ClusterStatus, CreateClusterRequest, Health, NetworkConfig, UpdateClusterRequest,
};
use crate::error::{Result, SdkError};
use crate::operation::Operation;
use crate::service::ClusterService;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Default)]
pub struct InMemoryClusterService {
    clusters: Mutex<BTreeMap<String, Cluster>>,
    operations: Mutex<HashMap<String, PendingOperation>>,
    failures: Mutex<HashMap<&'static str, String>>,
    calls: Mutex<Vec<&'static str>>,
    sequence: AtomicU64,
    latency: Duration,
    pending_polls: u32,
}

#[derive(Debug)]
struct PendingOperation {
    operation: Operation,
    polls_left: u32,
}

impl InMemoryClusterService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Operations report `done` only after this many polls
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Make the next call of `method` fail with an API error
    pub async fn fail_next(&self, method: &'static str, message: impl Into<String>) {
        self.failures.lock().await.insert(method, message.into());
    }

    /// Store a cluster as if it had been created out of band
    pub async fn insert(&self, cluster: Cluster) {
        self.clusters.lock().await.insert(cluster.id.clone(), cluster);
    }

    /// Drop a cluster as if it had been deleted out of band
    pub async fn remove(&self, cluster_id: &str) -> Option<Cluster> {
        self.clusters.lock().await.remove(cluster_id)
    }

    pub async fn cluster(&self, cluster_id: &str) -> Option<Cluster> {
        self.clusters.lock().await.get(cluster_id).cloned()
    }

    /// Names of the service methods called so far, in order
    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}{n:017}")
    }

    async fn enter(&self, method: &'static str) -> Result<()> {
        self.calls.lock().await.push(method);
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        match self.failures.lock().await.remove(method) {
            Some(message) => Err(SdkError::Api { code: 500, message }),
            None => Ok(()),
        }
    }

    async fn start_operation(&self, description: &str, cluster_id: &str) -> Operation {
        let operation = Operation {
            id: self.next_id("op"),
            description: description.to_string(),
            created_at: Some(Utc::now()),
            done: self.pending_polls == 0,
            metadata: Some(serde_json::json!({ "clusterId": cluster_id })),
            error: None,
            response: None,
        };
        if !operation.done {
            self.operations.lock().await.insert(
                operation.id.clone(),
                PendingOperation {
                    operation: operation.clone(),
                    polls_left: self.pending_polls,
                },
            );
        }
        operation
    }
}

#[async_trait]
impl ClusterService for InMemoryClusterService {
    async fn get(&self, cluster_id: &str) -> Result<Cluster> {
        self.enter("get").await?;
        self.clusters
            .lock()
            .await
            .get(cluster_id)
            .cloned()
            .ok_or_else(|| SdkError::NotFound(format!("cluster {cluster_id}")))
    }

    async fn create(&self, request: &CreateClusterRequest) -> Result<Operation> {
        self.enter("create").await?;
        if request.name.is_empty() {
            return Err(SdkError::InvalidRequest("name is required".to_string()));
        }
        if request.folder_id.is_empty() {
            return Err(SdkError::InvalidRequest("folder_id is required".to_string()));
        }
        if request.admin_password.is_empty() {
            return Err(SdkError::InvalidRequest(
                "admin_password is required".to_string(),
            ));
        }

        let cluster = Cluster {
            id: self.next_id("c9q"),
            folder_id: request.folder_id.clone(),
            created_at: Some(Utc::now()),
            name: request.name.clone(),
            description: request.description.clone(),
            labels: request.labels.clone(),
            config: request.config.clone(),
            health: Health::Alive,
            status: ClusterStatus::Running,
            network: NetworkConfig {
                subnet_ids: request.network.subnet_ids.clone(),
                security_group_ids: request.network.security_group_ids.clone(),
            },
            code_sync: request.code_sync.clone(),
            deletion_protection: request.deletion_protection,
            service_account_id: request.service_account_id.clone(),
            logging: request.logging.clone(),
        };

        let cluster_id = cluster.id.clone();
        self.clusters.lock().await.insert(cluster_id.clone(), cluster);
        tracing::debug!(cluster_id = %cluster_id, "In-memory cluster created");
        Ok(self.start_operation("Create Airflow cluster", &cluster_id).await)
    }

    async fn update(&self, request: &UpdateClusterRequest) -> Result<Operation> {
        self.enter("update").await?;
        let mut clusters = self.clusters.lock().await;
        let cluster = clusters
            .get_mut(&request.cluster_id)
            .ok_or_else(|| SdkError::NotFound(format!("cluster {}", request.cluster_id)))?;

        for path in &request.update_mask.paths {
            let spec = &request.config_spec;
            match path.as_str() {
                "name" => cluster.name = request.name.clone(),
                "description" => cluster.description = request.description.clone(),
                "labels" => cluster.labels = request.labels.clone(),
                "service_account_id" => {
                    cluster.service_account_id = request.service_account_id.clone()
                }
                "deletion_protection" => {
                    cluster.deletion_protection = request.deletion_protection
                }
                "code_sync" => cluster.code_sync = request.code_sync.clone(),
                "network_spec.security_group_ids" => {
                    cluster.network.security_group_ids =
                        request.network_spec.security_group_ids.clone()
                }
                "config_spec.airflow.config" => cluster.config.airflow = spec.airflow.clone(),
                "config_spec.webserver" => cluster.config.webserver = spec.webserver.clone(),
                "config_spec.scheduler" => cluster.config.scheduler = spec.scheduler.clone(),
                "config_spec.triggerer" => cluster.config.triggerer = spec.triggerer.clone(),
                "config_spec.worker" => cluster.config.worker = spec.worker.clone(),
                "config_spec.dependencies" => {
                    cluster.config.dependencies = spec.dependencies.clone()
                }
                "config_spec.lockbox" => cluster.config.lockbox = spec.lockbox.clone(),
                "logging" => cluster.logging = request.logging.clone(),
                other => {
                    return Err(SdkError::InvalidRequest(format!(
                        "unsupported update mask path: {other}"
                    )));
                }
            }
        }
        drop(clusters);

        Ok(self
            .start_operation("Update Airflow cluster", &request.cluster_id)
            .await)
    }

    async fn delete(&self, cluster_id: &str) -> Result<Operation> {
        self.enter("delete").await?;
        let removed = self.clusters.lock().await.remove(cluster_id);
        match removed {
            Some(cluster) if cluster.deletion_protection => {
                self.clusters.lock().await.insert(cluster.id.clone(), cluster);
                Err(SdkError::Api {
                    code: 400,
                    message: "cluster is protected from deletion".to_string(),
                })
            }
            Some(_) => Ok(self.start_operation("Delete Airflow cluster", cluster_id).await),
            None => Err(SdkError::NotFound(format!("cluster {cluster_id}"))),
        }
    }

    async fn get_operation(&self, operation_id: &str) -> Result<Operation> {
        self.enter("get_operation").await?;
        let mut operations = self.operations.lock().await;
        let pending = operations
            .get_mut(operation_id)
            .ok_or_else(|| SdkError::NotFound(format!("operation {operation_id}")))?;

        pending.polls_left = pending.polls_left.saturating_sub(1);
        if pending.polls_left == 0 {
            pending.operation.done = true;
        }
        Ok(pending.operation.clone())
    }
}
