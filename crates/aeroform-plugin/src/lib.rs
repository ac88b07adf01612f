//! Aeroform resource plugin contract
//!
//! This crate defines what a provider resource and its host agree on:
//! diagnostics, attribute paths, tri-state values, schemas and validators,
//! the lifecycle traits, plus the host-side planning and state store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 host (aero CLI)                  │
//! │   plan::plan_resource   state::StateManager      │
//! └─────────────────┬───────────────────────────────┘
//!                   │ DynamicValue + Diagnostics
//! ┌─────────────────▼───────────────────────────────┐
//! │               aeroform-plugin                    │
//! │  trait Provider ── ProviderServer                │
//! │  trait Resource + ResourceWith{Configure,        │
//! │                   ImportState, ValidateConfig}   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │     provider resources (aeroform-airflow)        │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod diagnostics;
pub mod dynamic;
pub mod error;
pub mod path;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod state;
pub mod timeouts;
pub mod validator;
pub mod value;

// Re-exports
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use dynamic::DynamicValue;
pub use error::{PluginError, Result};
pub use path::{AttributePath, PathStep};
pub use plan::{Action, ActionType, ApplyResult, Plan, PlanSummary};
pub use provider::{Provider, ProviderData, ProviderServer, ResourceFactory};
pub use resource::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ImportStateRequest,
    ImportStateResponse, ReadRequest, ReadResponse, Resource, ResourceWithConfigure,
    ResourceWithImportState, ResourceWithValidateConfig, UpdateRequest, UpdateResponse,
    ValidateConfigRequest, ValidateConfigResponse,
};
pub use schema::{Attribute, AttributeType, Block, Schema};
pub use state::{ResourceState, StateFile, StateLock, StateManager};
pub use timeouts::Timeouts;
pub use value::{UNKNOWN_VALUE, Value};
