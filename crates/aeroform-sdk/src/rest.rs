//! REST client for the managed Airflow API
//!
//! Talks JSON over HTTPS with bearer-token authentication. A 404 from the
//! API becomes `SdkError::NotFound`; other failures carry the API message.

use crate::airflow::{Cluster, CreateClusterRequest, UpdateClusterRequest};
use crate::error::{Result, SdkError};
use crate::operation::Operation;
use crate::service::ClusterService;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

const CLUSTERS_PATH: &str = "airflow/v1/clusters";
const OPERATIONS_PATH: &str = "operations";

/// Connection settings for [`RestClusterService`]
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the API gateway, without trailing slash
    pub endpoint: String,
    pub token: String,
}

pub struct RestClusterService {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl RestClusterService {
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token,
        }
    }

    fn cluster_url(&self, cluster_id: Option<&str>) -> String {
        match cluster_id {
            Some(id) => format!("{}/{}/{}", self.endpoint, CLUSTERS_PATH, id),
            None => format!("{}/{}", self.endpoint, CLUSTERS_PATH),
        }
    }

    fn operation_url(&self, operation_id: &str) -> String {
        format!("{}/{}/{}", self.endpoint, OPERATIONS_PATH, operation_id)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body, what)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl std::fmt::Debug for RestClusterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClusterService")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl ClusterService for RestClusterService {
    async fn get(&self, cluster_id: &str) -> Result<Cluster> {
        require_cluster_id(cluster_id)?;
        let url = self.cluster_url(Some(cluster_id));
        tracing::debug!("GET {}", url);
        self.send(self.client.get(&url), &format!("cluster {cluster_id}"))
            .await
    }

    async fn create(&self, request: &CreateClusterRequest) -> Result<Operation> {
        let url = self.cluster_url(None);
        tracing::debug!("POST {}", url);
        self.send(self.client.post(&url).json(request), "cluster")
            .await
    }

    async fn update(&self, request: &UpdateClusterRequest) -> Result<Operation> {
        require_cluster_id(&request.cluster_id)?;
        let url = self.cluster_url(Some(&request.cluster_id));
        tracing::debug!("PATCH {}", url);
        self.send(
            self.client.patch(&url).json(request),
            &format!("cluster {}", request.cluster_id),
        )
        .await
    }

    async fn delete(&self, cluster_id: &str) -> Result<Operation> {
        require_cluster_id(cluster_id)?;
        let url = self.cluster_url(Some(cluster_id));
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(&url), &format!("cluster {cluster_id}"))
            .await
    }

    async fn get_operation(&self, operation_id: &str) -> Result<Operation> {
        let url = self.operation_url(operation_id);
        self.send(self.client.get(&url), &format!("operation {operation_id}"))
            .await
    }
}

/// An empty ID would address the cluster collection instead of one cluster
fn require_cluster_id(cluster_id: &str) -> Result<()> {
    if cluster_id.is_empty() {
        return Err(SdkError::InvalidRequest(
            "cluster_id is required".to_string(),
        ));
    }
    Ok(())
}

/// Map a non-success HTTP status to an error
fn check_status(status: StatusCode, body: &str, what: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND {
        return Err(SdkError::NotFound(what.to_string()));
    }

    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
    Err(SdkError::Api {
        code: status.as_u16(),
        message,
    })
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}
