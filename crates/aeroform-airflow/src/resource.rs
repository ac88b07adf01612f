//! The `airflow_cluster` resource
//!
//! Every lifecycle call decodes its payload into a [`ClusterModel`], talks to
//! the cluster API under the resolved deadline and hands back the new state.
//! Failures are reported as diagnostics; nothing is rolled back or retried.

use crate::api;
use crate::mapping::{
    build_create_cluster_request, build_update_cluster_request, cluster_to_state,
};
use crate::model::ClusterModel;
use crate::provider::ProviderContext;
use crate::schema::cluster_resource_schema;
use aeroform_plugin::resource::import_state_passthrough_id;
use aeroform_plugin::timeouts::{self, Opts};
use aeroform_plugin::{
    AttributePath, CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, Diagnostics,
    DynamicValue, ImportStateRequest, ImportStateResponse, ProviderData, ReadRequest,
    ReadResponse, Resource, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithValidateConfig, Schema, UpdateRequest, UpdateResponse, ValidateConfigRequest,
    ValidateConfigResponse,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

pub const CREATE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const DELETE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// `admin_password` cannot be read back, imported state carries this instead
pub const ADMIN_PASSWORD_STUB_ON_IMPORT: &str =
    "<real value unknown because resource was imported>";

#[derive(Debug, Default)]
pub struct AirflowClusterResource {
    context: Option<Arc<ProviderContext>>,
}

impl AirflowClusterResource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory registered with the provider
    pub fn new_resource() -> Box<dyn Resource> {
        Box::new(Self::new())
    }

    fn context(&self, diags: &mut Diagnostics) -> Option<&ProviderContext> {
        if self.context.is_none() {
            diags.add_error(
                "Unconfigured Airflow cluster resource",
                "The provider has not been configured. Please report this issue to the provider developers.",
            );
        }
        self.context.as_deref()
    }

    async fn create_cluster(
        &self,
        request: CreateRequest,
        diags: &mut Diagnostics,
    ) -> Option<DynamicValue> {
        let context = self.context(diags)?;
        let mut plan: ClusterModel = request.plan.get(diags)?;

        let create_request = build_create_cluster_request(&plan, context.folder_id.as_deref())
            .map_err(|d| diags.append(d))
            .ok()?;
        tracing::debug!(request = ?create_request, "Create Airflow cluster request");

        let deadline = plan.timeouts().create(CREATE_TIMEOUT, diags);
        if diags.has_error() {
            return None;
        }

        let outcome = timeout(deadline, async {
            match api::create_cluster(&context.sdk, &create_request).await {
                Ok(cluster_id) => plan.id = cluster_id.into(),
                Err(diagnostic) => {
                    diags.push(diagnostic);
                    return;
                }
            }
            api::update_state(&context.sdk, &mut plan, diags).await;
        })
        .await;
        if outcome.is_err() {
            add_timeout_error(diags, "create", deadline);
        }
        if diags.has_error() {
            return None;
        }

        let state = DynamicValue::from_model(&plan, diags);
        tracing::debug!(cluster_id = %plan.cluster_id(), "Finished creating Airflow cluster");
        state
    }

    async fn read_cluster(
        &self,
        request: ReadRequest,
        diags: &mut Diagnostics,
    ) -> Option<DynamicValue> {
        let context = self.context(diags)?;
        let mut state: ClusterModel = request.state.get(diags)?;

        let cluster_id = state.cluster_id().to_string();
        tracing::debug!(cluster_id = %cluster_id, "Reading Airflow cluster");

        let cluster = match api::get_cluster_by_id(&context.sdk, &cluster_id).await {
            Ok(Some(cluster)) => cluster,
            Ok(None) => return None,
            Err(diagnostic) => {
                diags.push(diagnostic);
                return None;
            }
        };

        diags.append(cluster_to_state(&cluster, &mut state));
        if diags.has_error() {
            return None;
        }

        let new_state = DynamicValue::from_model(&state, diags);
        tracing::debug!(cluster_id = %cluster_id, "Finished reading Airflow cluster");
        new_state
    }

    async fn update_cluster(
        &self,
        request: UpdateRequest,
        diags: &mut Diagnostics,
    ) -> Option<DynamicValue> {
        let context = self.context(diags)?;
        let plan = request.plan.get::<ClusterModel>(diags);
        let state = request.state.get::<ClusterModel>(diags);
        let (Some(mut plan), Some(state)) = (plan, state) else {
            return None;
        };
        if !plan.id.is_known() {
            plan.id = state.id.clone();
        }

        let cluster_id = state.cluster_id().to_string();
        tracing::debug!(cluster_id = %cluster_id, "Updating Airflow cluster");

        let deadline = plan.timeouts().update(UPDATE_TIMEOUT, diags);
        if diags.has_error() {
            return None;
        }

        if plan.admin_password.is_known() && plan.admin_password != state.admin_password {
            diags.add_attribute_warning(
                AttributePath::root("admin_password"),
                "Airflow cluster admin password is not updated",
                "The admin password is only used when the cluster is created. \
                 The new value is stored in state but the cluster keeps its current password.",
            );
        }

        let update_request = build_update_cluster_request(&state, &plan)
            .map_err(|d| diags.append(d))
            .ok()?;

        if update_request.update_mask.is_empty() {
            tracing::debug!(cluster_id = %cluster_id, "No Airflow cluster fields changed");
            let mut unchanged = state;
            unchanged.admin_password = plan.admin_password;
            unchanged.timeouts = plan.timeouts;
            return DynamicValue::from_model(&unchanged, diags);
        }
        tracing::debug!(request = ?update_request, "Update Airflow cluster request");

        let outcome = timeout(deadline, async {
            if let Err(diagnostic) = api::update_cluster(&context.sdk, &update_request).await {
                diags.push(diagnostic);
                return;
            }
            api::update_state(&context.sdk, &mut plan, diags).await;
        })
        .await;
        if outcome.is_err() {
            add_timeout_error(diags, "update", deadline);
        }
        if diags.has_error() {
            return None;
        }

        let new_state = DynamicValue::from_model(&plan, diags);
        tracing::debug!(cluster_id = %cluster_id, "Finished updating Airflow cluster");
        new_state
    }

    async fn delete_cluster(&self, request: DeleteRequest, diags: &mut Diagnostics) {
        let Some(context) = self.context(diags) else {
            return;
        };
        let Some(state) = request.state.get::<ClusterModel>(diags) else {
            return;
        };

        let cluster_id = state.cluster_id().to_string();
        tracing::debug!(cluster_id = %cluster_id, "Deleting Airflow cluster");

        let deadline = state.timeouts().delete(DELETE_TIMEOUT, diags);
        if diags.has_error() {
            return;
        }

        match timeout(deadline, api::delete_cluster(&context.sdk, &cluster_id)).await {
            Ok(Ok(())) => {}
            Ok(Err(diagnostic)) => diags.push(diagnostic),
            Err(_) => add_timeout_error(diags, "delete", deadline),
        }

        tracing::debug!(cluster_id = %cluster_id, "Finished deleting Airflow cluster");
    }
}

fn add_timeout_error(diags: &mut Diagnostics, operation: &str, deadline: Duration) {
    diags.add_error(
        format!("Airflow cluster {operation} timed out"),
        format!(
            "The {operation} operation did not finish within {}",
            humantime::format_duration(deadline)
        ),
    );
}

#[async_trait]
impl Resource for AirflowClusterResource {
    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_airflow_cluster")
    }

    fn schema(&self) -> Schema {
        let mut schema = cluster_resource_schema();
        schema.blocks.insert(
            "timeouts".to_string(),
            timeouts::block(Opts {
                create: true,
                update: true,
                delete: true,
                ..Default::default()
            }),
        );
        schema
    }

    async fn create(&self, request: CreateRequest) -> CreateResponse {
        let mut diagnostics = Diagnostics::new();
        let state = self.create_cluster(request, &mut diagnostics).await;
        CreateResponse { state, diagnostics }
    }

    async fn read(&self, request: ReadRequest) -> ReadResponse {
        let mut diagnostics = Diagnostics::new();
        let state = self.read_cluster(request, &mut diagnostics).await;
        ReadResponse { state, diagnostics }
    }

    async fn update(&self, request: UpdateRequest) -> UpdateResponse {
        let mut diagnostics = Diagnostics::new();
        let state = self.update_cluster(request, &mut diagnostics).await;
        UpdateResponse { state, diagnostics }
    }

    async fn delete(&self, request: DeleteRequest) -> DeleteResponse {
        let mut diagnostics = Diagnostics::new();
        self.delete_cluster(request, &mut diagnostics).await;
        DeleteResponse { diagnostics }
    }

    fn as_configure(&mut self) -> Option<&mut dyn ResourceWithConfigure> {
        Some(self)
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }

    fn as_validate_config(&self) -> Option<&dyn ResourceWithValidateConfig> {
        Some(self)
    }
}

impl ResourceWithConfigure for AirflowClusterResource {
    fn configure(&mut self, provider_data: Option<ProviderData>, diags: &mut Diagnostics) {
        let Some(provider_data) = provider_data else {
            return;
        };

        match provider_data.downcast::<ProviderContext>() {
            Ok(context) => self.context = Some(context),
            Err(_) => diags.add_error(
                "Unexpected Resource Configure Type",
                "Expected ProviderContext as provider data. Please report this issue to the provider developers.",
            ),
        }
    }
}

#[async_trait]
impl ResourceWithImportState for AirflowClusterResource {
    async fn import_state(&self, request: ImportStateRequest) -> ImportStateResponse {
        let mut response = ImportStateResponse::default();
        import_state_passthrough_id(&AttributePath::root("id"), &request, &mut response);

        response.state.set_attribute(
            &AttributePath::root("admin_password"),
            ADMIN_PASSWORD_STUB_ON_IMPORT,
            &mut response.diagnostics,
        );
        response
    }
}

#[async_trait]
impl ResourceWithValidateConfig for AirflowClusterResource {
    async fn validate_config(&self, request: ValidateConfigRequest) -> ValidateConfigResponse {
        let mut response = ValidateConfigResponse::default();
        let Some(cluster) = request.config.get::<ClusterModel>(&mut response.diagnostics) else {
            return response;
        };

        // Unknown destinations are judged once they are known.
        if let Some(logging) = cluster.logging.get() {
            let undecided = logging.folder_id.is_unknown() || logging.log_group_id.is_unknown();
            if !undecided && logging.folder_id.is_null() == logging.log_group_id.is_null() {
                response.diagnostics.add_attribute_error(
                    AttributePath::root("logging"),
                    "Invalid Airflow cluster logging configuration",
                    "Exactly one of the attributes `folder_id` and `log_group_id` must be specified",
                );
            }
        }
        response
    }
}
