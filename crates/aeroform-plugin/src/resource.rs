//! Resource lifecycle contract
//!
//! A resource implements [`Resource`] for CRUD and opts into optional
//! capabilities (configure, import, config validation) by implementing the
//! matching trait and exposing it through the `as_*` accessors.

use crate::diagnostics::Diagnostics;
use crate::dynamic::DynamicValue;
use crate::path::AttributePath;
use crate::provider::ProviderData;
use crate::schema::Schema;
use async_trait::async_trait;

/// CRUD lifecycle of a managed resource
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name, e.g. `aeroform_airflow_cluster`
    fn type_name(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    /// Create the resource; `state` must be fully populated on success
    async fn create(&self, request: CreateRequest) -> CreateResponse;

    /// Refresh state; `state: None` in the response means the resource is gone
    async fn read(&self, request: ReadRequest) -> ReadResponse;

    async fn update(&self, request: UpdateRequest) -> UpdateResponse;

    async fn delete(&self, request: DeleteRequest) -> DeleteResponse;

    fn as_configure(&mut self) -> Option<&mut dyn ResourceWithConfigure> {
        None
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        None
    }

    fn as_validate_config(&self) -> Option<&dyn ResourceWithValidateConfig> {
        None
    }
}

/// Receives provider-level data (API clients, defaults) after construction
pub trait ResourceWithConfigure: Resource {
    fn configure(&mut self, provider_data: Option<ProviderData>, diags: &mut Diagnostics);
}

/// Supports `import` by external identifier
#[async_trait]
pub trait ResourceWithImportState: Resource {
    async fn import_state(&self, request: ImportStateRequest) -> ImportStateResponse;
}

/// Semantic validation of a configuration beyond the schema
#[async_trait]
pub trait ResourceWithValidateConfig: Resource {
    async fn validate_config(&self, request: ValidateConfigRequest) -> ValidateConfigResponse;
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub plan: DynamicValue,
}

#[derive(Debug, Clone, Default)]
pub struct CreateResponse {
    pub state: Option<DynamicValue>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub state: DynamicValue,
}

#[derive(Debug, Clone, Default)]
pub struct ReadResponse {
    pub state: Option<DynamicValue>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub state: DynamicValue,
    pub plan: DynamicValue,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateResponse {
    pub state: Option<DynamicValue>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub state: DynamicValue,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct ImportStateRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportStateResponse {
    pub state: DynamicValue,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct ValidateConfigRequest {
    pub config: DynamicValue,
}

#[derive(Debug, Clone, Default)]
pub struct ValidateConfigResponse {
    pub diagnostics: Diagnostics,
}

/// Seed the imported state with the identifier at `path`
pub fn import_state_passthrough_id(
    path: &AttributePath,
    request: &ImportStateRequest,
    response: &mut ImportStateResponse,
) {
    if request.id.is_empty() {
        response.diagnostics.add_error(
            "Missing Resource Import Identifier",
            "The import identifier must not be empty.",
        );
        return;
    }
    response
        .state
        .set_attribute(path, &request.id, &mut response.diagnostics);
}
