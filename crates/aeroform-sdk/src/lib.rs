//! Managed Airflow API client
//!
//! This crate provides the messages and the cluster service used by the
//! Aeroform Airflow resource.
//!
//! # Features
//!
//! - Cluster create / get / update / delete returning long-running operations
//! - Operation polling through [`Sdk::wait_operation`]
//! - REST transport ([`RestClusterService`]) and an in-process service
//!   ([`InMemoryClusterService`]) for tests
//!
//! # Example
//!
//! ```ignore
//! use aeroform_sdk::{RestClusterService, RestConfig, Sdk, WaitConfig};
//! use std::sync::Arc;
//!
//! let service = RestClusterService::new(RestConfig {
//!     endpoint: "https://api.cloud.example".to_string(),
//!     token: std::env::var("AEROFORM_TOKEN")?,
//! });
//! let sdk = Sdk::new(Arc::new(service), WaitConfig::default());
//!
//! let cluster = sdk.clusters().get("c9q0000000000000001").await?;
//! ```

pub mod airflow;
pub mod error;
pub mod logging;
pub mod memory;
pub mod operation;
pub mod rest;
pub mod service;

pub use airflow::{
    AirflowConfig, Cluster, ClusterConfig, ClusterStatus, CodeSyncConfig, ComponentConfig,
    CreateClusterRequest, Dependencies, FieldMask, Health, LockboxConfig, LogDestination,
    LoggingConfig, NetworkConfig, NetworkSpec, Resources, S3Config, UpdateClusterRequest,
    WorkerConfig,
};
pub use error::{Result, SdkError};
pub use logging::LogLevel;
pub use memory::InMemoryClusterService;
pub use operation::{Operation, Status, WaitConfig};
pub use rest::{RestClusterService, RestConfig};
pub use service::{ClusterService, Sdk};
