//! Declarative model of an Airflow cluster
//!
//! Decoded fresh from plan, state or config on every lifecycle call. Every
//! field is tri-state, see [`Value`].

use aeroform_plugin::Timeouts;
use aeroform_plugin::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `section -> key -> value` overrides of `airflow.cfg`
pub type AirflowConfigSections = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterModel {
    pub id: Value<String>,
    pub folder_id: Value<String>,
    pub created_at: Value<String>,
    pub name: Value<String>,
    pub description: Value<String>,
    pub labels: Value<BTreeMap<String, String>>,
    pub admin_password: Value<String>,
    pub service_account_id: Value<String>,
    pub subnet_ids: Value<BTreeSet<String>>,
    pub security_group_ids: Value<BTreeSet<String>>,
    pub deletion_protection: Value<bool>,
    pub status: Value<String>,
    pub airflow_config: Value<AirflowConfigSections>,
    pub pip_packages: Value<BTreeSet<String>>,
    pub deb_packages: Value<BTreeSet<String>>,
    pub code_sync: Value<CodeSyncModel>,
    pub webserver: Value<ComponentModel>,
    pub scheduler: Value<ComponentModel>,
    pub triggerer: Value<ComponentModel>,
    pub worker: Value<WorkerModel>,
    pub lockbox_secrets_backend: Value<LockboxModel>,
    pub logging: Value<LoggingModel>,
    pub timeouts: Value<Timeouts>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSyncModel {
    pub s3: Value<S3Model>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Model {
    pub bucket: Value<String>,
}

/// Webserver, scheduler or triggerer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentModel {
    pub count: Value<i64>,
    pub resource_preset_id: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerModel {
    pub min_count: Value<i64>,
    pub max_count: Value<i64>,
    pub resource_preset_id: Value<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockboxModel {
    pub enabled: Value<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingModel {
    pub enabled: Value<bool>,
    pub folder_id: Value<String>,
    pub log_group_id: Value<String>,
    pub min_level: Value<String>,
}

impl ClusterModel {
    /// Timeouts block, empty when not configured
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts.get().cloned().unwrap_or_default()
    }

    /// Cluster ID for log fields; empty when not yet known
    pub fn cluster_id(&self) -> &str {
        self.id.get().map(String::as_str).unwrap_or_default()
    }
}
