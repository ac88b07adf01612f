//! Managed Airflow API messages
//!
//! JSON field names follow the REST mapping of the cluster API (camelCase).
//! `ClusterConfig::airflow.config` is flat: keys are `"section.key"`.

use crate::logging::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Managed Airflow cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Required when decoding
    pub id: String,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub config: ClusterConfig,
    #[serde(default)]
    pub health: Health,
    #[serde(default)]
    pub status: ClusterStatus,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub code_sync: CodeSyncConfig,
    #[serde(default)]
    pub deletion_protection: bool,
    #[serde(default)]
    pub service_account_id: String,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    pub airflow: AirflowConfig,
    pub webserver: ComponentConfig,
    pub scheduler: ComponentConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggerer: Option<ComponentConfig>,
    pub worker: WorkerConfig,
    pub dependencies: Dependencies,
    pub lockbox: LockboxConfig,
}

/// Airflow configuration overrides, keyed by `"section.key"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AirflowConfig {
    pub config: BTreeMap<String, String>,
}

/// Webserver, scheduler or triggerer instances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentConfig {
    pub count: i64,
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    pub min_count: i64,
    pub max_count: i64,
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resources {
    pub resource_preset_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dependencies {
    pub pip_packages: Vec<String>,
    pub deb_packages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockboxConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkConfig {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

/// DAG source bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeSyncConfig {
    pub s3: S3Config,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Config {
    pub bucket: String,
}

/// Where cluster logs are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Default log group of a folder
    FolderId(String),
    LogGroupId(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LoggingWire", into = "LoggingWire")]
pub struct LoggingConfig {
    pub enabled: bool,
    pub destination: Option<LogDestination>,
    pub min_level: LogLevel,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LoggingWire {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_group_id: Option<String>,
    min_level: LogLevel,
}

impl From<LoggingWire> for LoggingConfig {
    fn from(wire: LoggingWire) -> Self {
        let destination = match (wire.folder_id, wire.log_group_id) {
            (_, Some(group)) => Some(LogDestination::LogGroupId(group)),
            (Some(folder), None) => Some(LogDestination::FolderId(folder)),
            (None, None) => None,
        };
        Self {
            enabled: wire.enabled,
            destination,
            min_level: wire.min_level,
        }
    }
}

impl From<LoggingConfig> for LoggingWire {
    fn from(config: LoggingConfig) -> Self {
        let (folder_id, log_group_id) = match config.destination {
            Some(LogDestination::FolderId(folder)) => (Some(folder), None),
            Some(LogDestination::LogGroupId(group)) => (None, Some(group)),
            None => (None, None),
        };
        Self {
            enabled: config.enabled,
            folder_id,
            log_group_id,
            min_level: config.min_level,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterStatus {
    #[default]
    StatusUnknown,
    Creating,
    Running,
    Error,
    Stopping,
    Stopped,
    Starting,
    Updating,
    Deleting,
}

impl ClusterStatus {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            ClusterStatus::StatusUnknown => "STATUS_UNKNOWN",
            ClusterStatus::Creating => "CREATING",
            ClusterStatus::Running => "RUNNING",
            ClusterStatus::Error => "ERROR",
            ClusterStatus::Stopping => "STOPPING",
            ClusterStatus::Stopped => "STOPPED",
            ClusterStatus::Starting => "STARTING",
            ClusterStatus::Updating => "UPDATING",
            ClusterStatus::Deleting => "DELETING",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    #[default]
    HealthUnknown,
    Alive,
    Dead,
    Degraded,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    pub folder_id: String,
    pub name: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
    pub config: ClusterConfig,
    pub network: NetworkConfig,
    pub code_sync: CodeSyncConfig,
    pub deletion_protection: bool,
    pub service_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
    pub admin_password: String,
}

// Request dumps end up in debug logs; keep the password out of them.
impl fmt::Debug for CreateClusterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateClusterRequest")
            .field("folder_id", &self.folder_id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("labels", &self.labels)
            .field("config", &self.config)
            .field("network", &self.network)
            .field("code_sync", &self.code_sync)
            .field("deletion_protection", &self.deletion_protection)
            .field("service_account_id", &self.service_account_id)
            .field("logging", &self.logging)
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

/// Paths of the fields an update touches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn push(&mut self, path: impl Into<String>) {
        self.paths.push(path.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// JSON mapping of a field mask is a single comma separated string.
impl Serialize for FieldMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.paths.join(","))
    }
}

impl<'de> Deserialize<'de> for FieldMask {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(Self {
            paths: joined
                .split(',')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterRequest {
    #[serde(skip)]
    pub cluster_id: String,
    pub update_mask: FieldMask,
    pub name: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
    pub config_spec: ClusterConfig,
    pub code_sync: CodeSyncConfig,
    pub network_spec: NetworkSpec,
    pub deletion_protection: bool,
    pub service_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSpec {
    pub security_group_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_logging_wire_format() {
        let logging = LoggingConfig {
            enabled: true,
            destination: Some(LogDestination::LogGroupId("e23-group".to_string())),
            min_level: LogLevel::Info,
        };
        assert_eq!(
            serde_json::to_value(&logging).unwrap(),
            json!({ "enabled": true, "logGroupId": "e23-group", "minLevel": "INFO" })
        );

        let parsed: LoggingConfig =
            serde_json::from_value(json!({ "enabled": false, "folderId": "b1g" })).unwrap();
        assert_eq!(
            parsed.destination,
            Some(LogDestination::FolderId("b1g".to_string()))
        );
        assert_eq!(parsed.min_level, LogLevel::Unspecified);
    }

    #[test]
    fn test_field_mask_json() {
        let mut mask = FieldMask::default();
        mask.push("name");
        mask.push("config_spec.worker");
        assert_eq!(
            serde_json::to_value(&mask).unwrap(),
            json!("name,config_spec.worker")
        );
        let parsed: FieldMask = serde_json::from_value(json!("name,labels")).unwrap();
        assert!(parsed.contains("labels"));
    }

    #[test]
    fn test_cluster_tolerates_missing_fields() {
        let cluster: Cluster = serde_json::from_value(json!({
            "id": "c9q-1",
            "name": "af",
            "status": "RUNNING"
        }))
        .unwrap();
        assert_eq!(cluster.status, ClusterStatus::Running);
        assert!(cluster.logging.is_none());
        assert!(cluster.config.triggerer.is_none());
    }

    #[test]
    fn test_cluster_requires_id() {
        let err = serde_json::from_value::<Cluster>(json!({ "clusters": [] })).unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn test_create_request_debug_hides_password() {
        let request = CreateClusterRequest {
            admin_password: "hunter2".to_string(),
            ..Default::default()
        };
        let dump = format!("{request:?}");
        assert!(!dump.contains("hunter2"));
        assert!(dump.contains("<redacted>"));
    }
}
