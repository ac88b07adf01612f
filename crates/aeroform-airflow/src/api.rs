//! Cluster API calls used by the resource
//!
//! Each helper performs one SDK call, waits for the resulting operation and
//! turns failures into a diagnostic. Deadlines are applied by the caller.

use crate::mapping::cluster_to_state;
use crate::model::ClusterModel;
use aeroform_plugin::{AttributePath, Diagnostic, Diagnostics};
use aeroform_sdk::{Cluster, CreateClusterRequest, Sdk, UpdateClusterRequest};

/// Create a cluster and return its ID once the operation is done
pub async fn create_cluster(
    sdk: &Sdk,
    request: &CreateClusterRequest,
) -> Result<String, Diagnostic> {
    let failed = |detail: String| Diagnostic::error("Failed to create Airflow cluster", detail);

    let operation = sdk
        .clusters()
        .create(request)
        .await
        .map_err(|e| failed(e.to_string()))?;
    let cluster_id = operation
        .cluster_id()
        .map(str::to_string)
        .ok_or_else(|| failed(format!("Operation {} has no cluster ID", operation.id)))?;
    tracing::debug!(cluster_id = %cluster_id, "Waiting for Airflow cluster creation");

    sdk.wait_operation(operation)
        .await
        .map_err(|e| failed(e.to_string()))?;
    Ok(cluster_id)
}

/// The state must carry the ID of the cluster it describes
fn require_cluster_id(cluster_id: &str, operation: &str) -> Result<(), Diagnostic> {
    if cluster_id.is_empty() {
        return Err(Diagnostic::error(
            "Missing Airflow cluster ID",
            format!("The state has no cluster ID, the cluster cannot be {operation}."),
        )
        .with_attribute(AttributePath::root("id")));
    }
    Ok(())
}

/// Fetch a cluster; `None` means it no longer exists
pub async fn get_cluster_by_id(sdk: &Sdk, cluster_id: &str) -> Result<Option<Cluster>, Diagnostic> {
    require_cluster_id(cluster_id, "read")?;
    match sdk.clusters().get(cluster_id).await {
        Ok(cluster) => Ok(Some(cluster)),
        Err(e) if e.is_not_found() => {
            tracing::debug!(cluster_id = %cluster_id, "Airflow cluster not found");
            Ok(None)
        }
        Err(e) => Err(Diagnostic::error(
            "Failed to get Airflow cluster",
            format!("Error while requesting API to get Airflow cluster {cluster_id}: {e}"),
        )),
    }
}

pub async fn update_cluster(sdk: &Sdk, request: &UpdateClusterRequest) -> Result<(), Diagnostic> {
    let failed = |detail: String| Diagnostic::error("Failed to update Airflow cluster", detail);

    let operation = sdk
        .clusters()
        .update(request)
        .await
        .map_err(|e| failed(e.to_string()))?;
    sdk.wait_operation(operation)
        .await
        .map_err(|e| failed(e.to_string()))?;
    Ok(())
}

/// Delete a cluster; a cluster that is already gone counts as deleted
pub async fn delete_cluster(sdk: &Sdk, cluster_id: &str) -> Result<(), Diagnostic> {
    require_cluster_id(cluster_id, "deleted")?;
    let failed = |detail: String| Diagnostic::error("Failed to delete Airflow cluster", detail);

    let operation = match sdk.clusters().delete(cluster_id).await {
        Ok(operation) => operation,
        Err(e) if e.is_not_found() => {
            tracing::debug!(cluster_id = %cluster_id, "Airflow cluster already deleted");
            return Ok(());
        }
        Err(e) => return Err(failed(e.to_string())),
    };
    sdk.wait_operation(operation)
        .await
        .map_err(|e| failed(e.to_string()))?;
    Ok(())
}

/// Read the cluster identified by `state.id` back into `state`
///
/// A missing cluster is an error here: it was just created or updated.
pub async fn update_state(sdk: &Sdk, state: &mut ClusterModel, diags: &mut Diagnostics) {
    let cluster_id = state.cluster_id().to_string();
    tracing::debug!(cluster_id = %cluster_id, "Reading Airflow cluster");

    let cluster = match get_cluster_by_id(sdk, &cluster_id).await {
        Ok(Some(cluster)) => cluster,
        Ok(None) => {
            diags.add_error(
                "Airflow cluster not found",
                format!("Airflow cluster with id {cluster_id} not found"),
            );
            return;
        }
        Err(diagnostic) => {
            diags.push(diagnostic);
            return;
        }
    };

    diags.append(cluster_to_state(&cluster, state));
}
