//! Cluster service abstraction

use crate::airflow::{Cluster, CreateClusterRequest, UpdateClusterRequest};
use crate::error::Result;
use crate::operation::{self, Operation, WaitConfig};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::sleep;

/// Cluster API of the managed Airflow service
///
/// Implemented by [`RestClusterService`](crate::RestClusterService) for the
/// real control plane and by
/// [`InMemoryClusterService`](crate::InMemoryClusterService) for tests.
#[async_trait]
pub trait ClusterService: Send + Sync {
    /// Fetch a cluster; a missing cluster is `SdkError::NotFound`
    async fn get(&self, cluster_id: &str) -> Result<Cluster>;

    async fn create(&self, request: &CreateClusterRequest) -> Result<Operation>;

    async fn update(&self, request: &UpdateClusterRequest) -> Result<Operation>;

    async fn delete(&self, cluster_id: &str) -> Result<Operation>;

    async fn get_operation(&self, operation_id: &str) -> Result<Operation>;
}

/// Entry point of the SDK: the cluster service plus operation waiting
#[derive(Clone)]
pub struct Sdk {
    clusters: Arc<dyn ClusterService>,
    wait: WaitConfig,
}

impl Sdk {
    pub fn new(clusters: Arc<dyn ClusterService>, wait: WaitConfig) -> Self {
        Self { clusters, wait }
    }

    pub fn clusters(&self) -> &dyn ClusterService {
        self.clusters.as_ref()
    }

    /// Poll `operation` until it is done
    pub async fn wait_operation(&self, mut operation: Operation) -> Result<Operation> {
        while !operation.done {
            tracing::debug!(
                operation_id = %operation.id,
                "Waiting for operation: {}",
                operation.description
            );
            sleep(self.wait.poll_interval).await;
            operation = self.clusters.get_operation(&operation.id).await?;
        }
        operation::finished(operation)
    }
}

impl std::fmt::Debug for Sdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk").field("wait", &self.wait).finish()
    }
}
