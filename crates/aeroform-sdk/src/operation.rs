//! Long-running operations
//!
//! Every mutation of the control plane returns an [`Operation`]. The SDK
//! polls it until `done`; an operation that finished with an error becomes
//! [`SdkError::OperationFailed`]. Deadlines are the caller's business.

use crate::error::{Result, SdkError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub id: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub done: bool,
    /// Operation-specific metadata, e.g. `{"clusterId": "..."}`
    pub metadata: Option<serde_json::Value>,
    pub error: Option<Status>,
    pub response: Option<serde_json::Value>,
}

impl Operation {
    /// Cluster the operation acts on, taken from its metadata
    pub fn cluster_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.get("clusterId")?.as_str()
    }
}

/// Error status of a failed operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

/// Polling configuration for operation waits
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between two polls of an unfinished operation
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Turn a finished operation into a result
pub(crate) fn finished(operation: Operation) -> Result<Operation> {
    match operation.error {
        Some(status) => Err(SdkError::OperationFailed {
            id: operation.id,
            code: status.code,
            message: status.message,
        }),
        None => Ok(operation),
    }
}
