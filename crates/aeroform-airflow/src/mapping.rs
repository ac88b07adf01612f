//! Conversion between [`ClusterModel`] and API messages

use crate::model::{
    AirflowConfigSections, ClusterModel, CodeSyncModel, ComponentModel, LockboxModel,
    LoggingModel, S3Model, WorkerModel,
};
use aeroform_plugin::{AttributePath, Diagnostics, Value};
use aeroform_sdk::{
    AirflowConfig, Cluster, ClusterConfig, CodeSyncConfig, ComponentConfig, CreateClusterRequest,
    Dependencies, FieldMask, LockboxConfig, LogDestination, LogLevel, LoggingConfig,
    NetworkConfig, NetworkSpec, Resources, S3Config, UpdateClusterRequest, WorkerConfig,
};
use chrono::SecondsFormat;
use std::collections::{BTreeMap, BTreeSet};

pub fn build_create_cluster_request(
    plan: &ClusterModel,
    provider_folder: Option<&str>,
) -> Result<CreateClusterRequest, Diagnostics> {
    let mut diags = Diagnostics::new();

    let folder_id = plan
        .folder_id
        .get()
        .map(String::as_str)
        .filter(|folder| !folder.is_empty())
        .or(provider_folder.filter(|folder| !folder.is_empty()));
    let Some(folder_id) = folder_id else {
        diags.add_attribute_error(
            AttributePath::root("folder_id"),
            "Folder is not specified",
            "Set `folder_id` on the resource or configure a default folder for the provider.",
        );
        return Err(diags);
    };

    let logging = logging_config(&plan.logging, &mut diags);
    if diags.has_error() {
        return Err(diags);
    }

    Ok(CreateClusterRequest {
        folder_id: folder_id.to_string(),
        name: plan.name.value_or_default(),
        description: plan.description.value_or_default(),
        labels: plan.labels.value_or_default(),
        config: cluster_config(plan),
        network: NetworkConfig {
            subnet_ids: set_to_vec(&plan.subnet_ids),
            security_group_ids: set_to_vec(&plan.security_group_ids),
        },
        code_sync: code_sync_config(&plan.code_sync),
        deletion_protection: plan.deletion_protection.value_or_default(),
        service_account_id: plan.service_account_id.value_or_default(),
        logging,
        admin_password: plan.admin_password.value_or_default(),
    })
}

/// Update request with a mask of the fields that differ between state and plan
pub fn build_update_cluster_request(
    state: &ClusterModel,
    plan: &ClusterModel,
) -> Result<UpdateClusterRequest, Diagnostics> {
    let mut diags = Diagnostics::new();

    let Some(cluster_id) = state.id.get().filter(|id| !id.is_empty()) else {
        diags.add_attribute_error(
            AttributePath::root("id"),
            "Missing Airflow cluster ID",
            "The state has no cluster ID, the cluster cannot be updated.",
        );
        return Err(diags);
    };

    let mut mask = FieldMask::default();
    let mut track = |changed: bool, path: &str| {
        if changed {
            mask.push(path);
        }
    };
    track(changed(&state.name, &plan.name), "name");
    track(changed(&state.description, &plan.description), "description");
    track(changed(&state.labels, &plan.labels), "labels");
    track(
        changed(&state.service_account_id, &plan.service_account_id),
        "service_account_id",
    );
    track(
        changed(&state.deletion_protection, &plan.deletion_protection),
        "deletion_protection",
    );
    track(changed(&state.code_sync, &plan.code_sync), "code_sync");
    track(
        changed(&state.security_group_ids, &plan.security_group_ids),
        "network_spec.security_group_ids",
    );
    track(
        changed(&state.airflow_config, &plan.airflow_config),
        "config_spec.airflow.config",
    );
    track(changed(&state.webserver, &plan.webserver), "config_spec.webserver");
    track(changed(&state.scheduler, &plan.scheduler), "config_spec.scheduler");
    track(changed(&state.triggerer, &plan.triggerer), "config_spec.triggerer");
    track(changed(&state.worker, &plan.worker), "config_spec.worker");
    track(
        changed(&state.pip_packages, &plan.pip_packages)
            || changed(&state.deb_packages, &plan.deb_packages),
        "config_spec.dependencies",
    );
    track(
        changed(&state.lockbox_secrets_backend, &plan.lockbox_secrets_backend),
        "config_spec.lockbox",
    );
    track(changed(&state.logging, &plan.logging), "logging");

    let logging = logging_config(&plan.logging, &mut diags);
    if diags.has_error() {
        return Err(diags);
    }

    Ok(UpdateClusterRequest {
        cluster_id: cluster_id.clone(),
        update_mask: mask,
        name: plan.name.value_or_default(),
        description: plan.description.value_or_default(),
        labels: plan.labels.value_or_default(),
        config_spec: cluster_config(plan),
        code_sync: code_sync_config(&plan.code_sync),
        network_spec: NetworkSpec {
            security_group_ids: set_to_vec(&plan.security_group_ids),
        },
        deletion_protection: plan.deletion_protection.value_or_default(),
        service_account_id: plan.service_account_id.value_or_default(),
        logging,
    })
}

/// Overwrite every server-derived attribute of `state` with `cluster`
///
/// `admin_password` and `timeouts` are never returned by the API and are
/// left untouched. Empty optional values stay null if they were null.
pub fn cluster_to_state(cluster: &Cluster, state: &mut ClusterModel) -> Diagnostics {
    let mut diags = Diagnostics::new();

    state.id = Value::Known(cluster.id.clone());
    state.folder_id = Value::Known(cluster.folder_id.clone());
    state.created_at = Value::from_option(
        cluster
            .created_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    state.name = Value::Known(cluster.name.clone());
    state.description = or_null(cluster.description.clone(), &state.description);
    state.labels = or_null(cluster.labels.clone(), &state.labels);
    state.service_account_id = Value::Known(cluster.service_account_id.clone());
    state.subnet_ids = Value::Known(cluster.network.subnet_ids.iter().cloned().collect());
    state.security_group_ids = or_null(
        cluster.network.security_group_ids.iter().cloned().collect(),
        &state.security_group_ids,
    );
    state.deletion_protection = Value::Known(cluster.deletion_protection);
    state.status = Value::Known(cluster.status.as_str_name().to_string());

    let sections = split_airflow_config(&cluster.config.airflow.config, &mut diags);
    state.airflow_config = or_null(sections, &state.airflow_config);

    let dependencies = &cluster.config.dependencies;
    state.pip_packages = or_null(
        dependencies.pip_packages.iter().cloned().collect(),
        &state.pip_packages,
    );
    state.deb_packages = or_null(
        dependencies.deb_packages.iter().cloned().collect(),
        &state.deb_packages,
    );

    state.code_sync = Value::Known(CodeSyncModel {
        s3: Value::Known(S3Model {
            bucket: Value::Known(cluster.code_sync.s3.bucket.clone()),
        }),
    });
    state.webserver = Value::Known(component_model(&cluster.config.webserver));
    state.scheduler = Value::Known(component_model(&cluster.config.scheduler));
    state.triggerer = Value::from_option(cluster.config.triggerer.as_ref().map(component_model));
    state.worker = Value::Known(WorkerModel {
        min_count: Value::Known(cluster.config.worker.min_count),
        max_count: Value::Known(cluster.config.worker.max_count),
        resource_preset_id: Value::Known(
            cluster.config.worker.resources.resource_preset_id.clone(),
        ),
    });

    let lockbox_enabled = cluster.config.lockbox.enabled;
    state.lockbox_secrets_backend = if !lockbox_enabled && state.lockbox_secrets_backend.is_null()
    {
        Value::Null
    } else {
        Value::Known(LockboxModel {
            enabled: Value::Known(lockbox_enabled),
        })
    };

    state.logging = match &cluster.logging {
        Some(logging) => Value::Known(logging_model(logging, state.logging.get())),
        None => Value::Null,
    };

    diags
}

/// Flatten `section -> key -> value` into `"section.key" -> value`
pub fn flatten_airflow_config(sections: &AirflowConfigSections) -> BTreeMap<String, String> {
    sections
        .iter()
        .flat_map(|(section, entries)| {
            entries
                .iter()
                .map(move |(key, value)| (format!("{section}.{key}"), value.clone()))
        })
        .collect()
}

/// Split `"section.key"` keys on their first dot
pub fn split_airflow_config(
    flat: &BTreeMap<String, String>,
    diags: &mut Diagnostics,
) -> AirflowConfigSections {
    let mut sections = AirflowConfigSections::new();
    for (flat_key, value) in flat {
        match flat_key.split_once('.') {
            Some((section, key)) => {
                sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(key.to_string(), value.clone());
            }
            None => diags.add_attribute_warning(
                AttributePath::root("airflow_config"),
                "Unexpected Airflow config key",
                format!("Key {flat_key:?} returned by the API has no section and was skipped"),
            ),
        }
    }
    sections
}

/// A plan value that is still unknown is not a change
fn changed<T: PartialEq>(state: &Value<T>, plan: &Value<T>) -> bool {
    !plan.is_unknown() && state != plan
}

fn or_null<T: Default + PartialEq>(value: T, prior: &Value<T>) -> Value<T> {
    if value == T::default() && prior.is_null() {
        Value::Null
    } else {
        Value::Known(value)
    }
}

fn set_to_vec(value: &Value<BTreeSet<String>>) -> Vec<String> {
    value
        .get()
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default()
}

fn cluster_config(plan: &ClusterModel) -> ClusterConfig {
    ClusterConfig {
        airflow: AirflowConfig {
            config: plan
                .airflow_config
                .get()
                .map(flatten_airflow_config)
                .unwrap_or_default(),
        },
        webserver: plan.webserver.get().map(component_config).unwrap_or_default(),
        scheduler: plan.scheduler.get().map(component_config).unwrap_or_default(),
        triggerer: plan.triggerer.get().map(component_config),
        worker: plan
            .worker
            .get()
            .map(|worker| WorkerConfig {
                min_count: worker.min_count.value_or_default(),
                max_count: worker.max_count.value_or_default(),
                resources: Resources {
                    resource_preset_id: worker.resource_preset_id.value_or_default(),
                },
            })
            .unwrap_or_default(),
        dependencies: Dependencies {
            pip_packages: set_to_vec(&plan.pip_packages),
            deb_packages: set_to_vec(&plan.deb_packages),
        },
        lockbox: LockboxConfig {
            enabled: plan
                .lockbox_secrets_backend
                .get()
                .map(|lockbox| lockbox.enabled.value_or_default())
                .unwrap_or_default(),
        },
    }
}

fn component_config(component: &ComponentModel) -> ComponentConfig {
    ComponentConfig {
        count: component.count.value_or_default(),
        resources: Resources {
            resource_preset_id: component.resource_preset_id.value_or_default(),
        },
    }
}

fn component_model(component: &ComponentConfig) -> ComponentModel {
    ComponentModel {
        count: Value::Known(component.count),
        resource_preset_id: Value::Known(component.resources.resource_preset_id.clone()),
    }
}

fn code_sync_config(code_sync: &Value<CodeSyncModel>) -> CodeSyncConfig {
    let bucket = code_sync
        .get()
        .and_then(|sync| sync.s3.get())
        .map(|s3| s3.bucket.value_or_default())
        .unwrap_or_default();
    CodeSyncConfig {
        s3: S3Config { bucket },
    }
}

fn logging_config(logging: &Value<LoggingModel>, diags: &mut Diagnostics) -> Option<LoggingConfig> {
    let logging = logging.get()?;

    let destination = match (logging.folder_id.get(), logging.log_group_id.get()) {
        (_, Some(group)) => Some(LogDestination::LogGroupId(group.clone())),
        (Some(folder), None) => Some(LogDestination::FolderId(folder.clone())),
        (None, None) => None,
    };

    let min_level = match logging.min_level.get() {
        Some(name) => LogLevel::from_str_name(name).unwrap_or_else(|| {
            diags.add_attribute_error(
                AttributePath::root("logging").attribute("min_level"),
                "Invalid log level",
                format!("Unknown log level {name:?}"),
            );
            LogLevel::Unspecified
        }),
        None => LogLevel::Unspecified,
    };

    Some(LoggingConfig {
        enabled: logging.enabled.value_or_default(),
        destination,
        min_level,
    })
}

fn logging_model(logging: &LoggingConfig, prior: Option<&LoggingModel>) -> LoggingModel {
    let (folder_id, log_group_id) = match &logging.destination {
        Some(LogDestination::FolderId(folder)) => (Value::Known(folder.clone()), Value::Null),
        Some(LogDestination::LogGroupId(group)) => (Value::Null, Value::Known(group.clone())),
        None => (Value::Null, Value::Null),
    };

    let prior_level_null = prior.is_none_or(|p| p.min_level.is_null());
    let min_level = if logging.min_level == LogLevel::Unspecified && prior_level_null {
        Value::Null
    } else {
        Value::Known(logging.min_level.as_str_name().to_string())
    };

    LoggingModel {
        enabled: Value::Known(logging.enabled),
        folder_id,
        log_group_id,
        min_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeroform_plugin::Timeouts;
    use aeroform_sdk::{ClusterStatus, NetworkConfig};
    use chrono::{TimeZone, Utc};

    fn known<T>(value: T) -> Value<T> {
        Value::Known(value)
    }

    fn component(count: i64) -> Value<ComponentModel> {
        known(ComponentModel {
            count: known(count),
            resource_preset_id: known("c1-m4".to_string()),
        })
    }

    fn plan() -> ClusterModel {
        ClusterModel {
            name: known("airflow".to_string()),
            admin_password: known("secret".to_string()),
            service_account_id: known("sa-1".to_string()),
            subnet_ids: known(["s-b".to_string(), "s-a".to_string()].into()),
            airflow_config: known(
                [(
                    "core".to_string(),
                    [("load_examples".to_string(), "False".to_string())].into(),
                )]
                .into(),
            ),
            code_sync: known(CodeSyncModel {
                s3: known(S3Model {
                    bucket: known("dags".to_string()),
                }),
            }),
            webserver: component(1),
            scheduler: component(1),
            worker: known(WorkerModel {
                min_count: known(1),
                max_count: known(3),
                resource_preset_id: known("c1-m4".to_string()),
            }),
            logging: known(LoggingModel {
                enabled: known(true),
                folder_id: Value::Null,
                log_group_id: known("e23-group".to_string()),
                min_level: known("INFO".to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_request_uses_provider_folder() {
        let request = build_create_cluster_request(&plan(), Some("b1g-default")).unwrap();
        assert_eq!(request.folder_id, "b1g-default");
        assert_eq!(request.network.subnet_ids, vec!["s-a", "s-b"]);
        assert_eq!(
            request.config.airflow.config.get("core.load_examples"),
            Some(&"False".to_string())
        );
        assert_eq!(
            request.logging.unwrap().destination,
            Some(LogDestination::LogGroupId("e23-group".to_string()))
        );
        assert!(request.config.triggerer.is_none());
        assert_eq!(request.admin_password, "secret");
    }

    #[test]
    fn test_create_request_plan_folder_wins() {
        let mut plan = plan();
        plan.folder_id = known("b1g-own".to_string());
        let request = build_create_cluster_request(&plan, Some("b1g-default")).unwrap();
        assert_eq!(request.folder_id, "b1g-own");
    }

    #[test]
    fn test_create_request_without_folder() {
        let diags = build_create_cluster_request(&plan(), None).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags.errors().next().unwrap().summary,
            "Folder is not specified"
        );
    }

    #[test]
    fn test_update_mask_lists_changed_fields() {
        let mut state = plan();
        state.id = known("c9q-1".to_string());
        let mut plan = state.clone();
        plan.description = known("nightly DAGs".to_string());
        plan.worker = known(WorkerModel {
            min_count: known(2),
            max_count: known(4),
            resource_preset_id: known("c1-m4".to_string()),
        });
        plan.pip_packages = known(["pandas".to_string()].into());

        let request = build_update_cluster_request(&state, &plan).unwrap();
        assert_eq!(request.cluster_id, "c9q-1");
        assert_eq!(
            request.update_mask.paths,
            vec!["description", "config_spec.worker", "config_spec.dependencies"]
        );
        assert_eq!(request.config_spec.worker.max_count, 4);
    }

    #[test]
    fn test_update_mask_empty_when_unchanged() {
        let mut state = plan();
        state.id = known("c9q-1".to_string());
        let mut plan = state.clone();
        plan.admin_password = known("rotated".to_string());
        plan.timeouts = known(Timeouts {
            update: known("2h".to_string()),
            ..Default::default()
        });
        plan.status = Value::Unknown;

        let request = build_update_cluster_request(&state, &plan).unwrap();
        assert!(request.update_mask.is_empty());
    }

    #[test]
    fn test_update_requires_cluster_id() {
        let diags = build_update_cluster_request(&plan(), &plan()).unwrap_err();
        assert!(diags.has_error());
    }

    #[test]
    fn test_airflow_config_split_on_first_dot() {
        let flat: BTreeMap<String, String> = [
            ("core.dags_folder".to_string(), "/dags".to_string()),
            ("webserver.auth.backend".to_string(), "x".to_string()),
            ("orphan".to_string(), "y".to_string()),
        ]
        .into();

        let mut diags = Diagnostics::new();
        let sections = split_airflow_config(&flat, &mut diags);
        assert_eq!(sections["core"]["dags_folder"], "/dags");
        assert_eq!(sections["webserver"]["auth.backend"], "x");
        assert_eq!(sections.len(), 2);
        assert_eq!(diags.warnings().count(), 1);
        assert!(!diags.has_error());
    }

    fn remote_cluster() -> Cluster {
        let request = build_create_cluster_request(&plan(), Some("b1g")).unwrap();
        Cluster {
            id: "c9q-1".to_string(),
            folder_id: request.folder_id,
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            name: request.name,
            description: request.description,
            labels: request.labels,
            config: request.config,
            status: ClusterStatus::Running,
            network: NetworkConfig {
                subnet_ids: request.network.subnet_ids,
                security_group_ids: request.network.security_group_ids,
            },
            code_sync: request.code_sync,
            deletion_protection: request.deletion_protection,
            service_account_id: request.service_account_id,
            logging: request.logging,
            ..Default::default()
        }
    }

    #[test]
    fn test_cluster_to_state_round_trip() {
        let mut state = plan();
        state.timeouts = known(Timeouts {
            create: known("45m".to_string()),
            ..Default::default()
        });

        let diags = cluster_to_state(&remote_cluster(), &mut state);
        assert!(diags.is_empty());

        assert_eq!(state.id, known("c9q-1".to_string()));
        assert_eq!(state.folder_id, known("b1g".to_string()));
        assert_eq!(state.created_at, known("2024-05-01T12:00:00Z".to_string()));
        assert_eq!(state.status, known("RUNNING".to_string()));
        assert_eq!(state.admin_password, known("secret".to_string()));
        assert_eq!(state.timeouts.get().unwrap().create, known("45m".to_string()));
        assert_eq!(state.airflow_config, plan().airflow_config);
        assert_eq!(state.logging, plan().logging);
        assert_eq!(state.worker, plan().worker);
        assert_eq!(state.deletion_protection, known(false));
    }

    #[test]
    fn test_cluster_to_state_keeps_null_for_empty_values() {
        let mut state = plan();
        let diags = cluster_to_state(&remote_cluster(), &mut state);
        assert!(diags.is_empty());
        assert!(state.description.is_null());
        assert!(state.labels.is_null());
        assert!(state.security_group_ids.is_null());
        assert!(state.pip_packages.is_null());
        assert!(state.lockbox_secrets_backend.is_null());
        assert!(state.triggerer.is_null());

        let mut state = plan();
        state.security_group_ids = known(BTreeSet::new());
        state.lockbox_secrets_backend = known(LockboxModel {
            enabled: known(false),
        });
        cluster_to_state(&remote_cluster(), &mut state);
        assert_eq!(state.security_group_ids, known(BTreeSet::new()));
        assert_eq!(
            state.lockbox_secrets_backend.get().unwrap().enabled,
            known(false)
        );
    }

    #[test]
    fn test_logging_min_level_unspecified() {
        let mut remote = remote_cluster();
        remote.logging = Some(LoggingConfig {
            enabled: true,
            destination: Some(LogDestination::FolderId("b1g".to_string())),
            min_level: LogLevel::Unspecified,
        });

        let mut state = ClusterModel::default();
        cluster_to_state(&remote, &mut state);
        let logging = state.logging.get().unwrap();
        assert!(logging.min_level.is_null());
        assert_eq!(logging.folder_id, known("b1g".to_string()));
        assert!(logging.log_group_id.is_null());
    }
}
