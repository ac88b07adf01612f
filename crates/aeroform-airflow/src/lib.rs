//! Managed Airflow cluster resource
//!
//! Provides the `<provider>_airflow_cluster` resource: its schema and
//! validators, the mapping between the declarative model and the cluster
//! API, and the lifecycle adapter that drives create, read, update, delete
//! and import through [`aeroform_sdk`].
//!
//! # Example
//!
//! ```ignore
//! use aeroform_airflow::AirflowProvider;
//! use aeroform_plugin::ProviderServer;
//!
//! let server = ProviderServer::start(&AirflowProvider::new()).await?;
//! let resource = server.resource("aeroform_airflow_cluster")?;
//! ```

pub mod api;
pub mod mapping;
pub mod model;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod validators;

pub use mapping::{build_create_cluster_request, build_update_cluster_request, cluster_to_state};
pub use model::{
    ClusterModel, CodeSyncModel, ComponentModel, LockboxModel, LoggingModel, S3Model, WorkerModel,
};
pub use provider::{AirflowProvider, PROVIDER_TYPE_NAME, ProviderContext};
pub use resource::{
    ADMIN_PASSWORD_STUB_ON_IMPORT, AirflowClusterResource, CREATE_TIMEOUT, DELETE_TIMEOUT,
    UPDATE_TIMEOUT,
};
pub use schema::cluster_resource_schema;
pub use validators::{airflow_config_validator, allowed_log_levels, log_level_validator};
