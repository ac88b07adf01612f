//! Schema of the `airflow_cluster` resource

use crate::validators::{airflow_config_validator, log_level_validator};
use aeroform_plugin::{Attribute, AttributeType, Schema};

fn string_map() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

fn component(description: &str) -> Attribute {
    Attribute::object([
        (
            "count",
            Attribute::number()
                .required()
                .description("The number of instances."),
        ),
        (
            "resource_preset_id",
            Attribute::string()
                .required()
                .description("ID of the preset for computational resources."),
        ),
    ])
    .description(description)
}

pub fn cluster_resource_schema() -> Schema {
    let attributes = [
        (
            "id",
            Attribute::string()
                .computed()
                .description("The resource identifier."),
        ),
        (
            "folder_id",
            Attribute::string()
                .optional()
                .computed()
                .requires_replace()
                .description(
                    "The folder identifier that resource belongs to. \
                     If it is not provided, the default provider folder is used.",
                ),
        ),
        (
            "created_at",
            Attribute::string()
                .computed()
                .description("The creation timestamp of the resource."),
        ),
        (
            "name",
            Attribute::string()
                .required()
                .description("The resource name."),
        ),
        (
            "description",
            Attribute::string()
                .optional()
                .description("The resource description."),
        ),
        (
            "labels",
            Attribute::map_of(AttributeType::String)
                .optional()
                .description("A set of key/value label pairs assigned to the resource."),
        ),
        (
            "admin_password",
            Attribute::string()
                .required()
                .sensitive()
                .description("Password that is used to log in to Apache Airflow web UI under `admin` user."),
        ),
        (
            "service_account_id",
            Attribute::string()
                .required()
                .description("Service account which linked to the resource."),
        ),
        (
            "subnet_ids",
            Attribute::set_of(AttributeType::String)
                .required()
                .requires_replace()
                .description("IDs of VPC network subnets where instances of the cluster are attached."),
        ),
        (
            "security_group_ids",
            Attribute::set_of(AttributeType::String)
                .optional()
                .description("The list of security groups applied to resource or their components."),
        ),
        (
            "deletion_protection",
            Attribute::bool()
                .optional()
                .computed()
                .description("The `true` value means that resource is protected from accidental deletion."),
        ),
        (
            "status",
            Attribute::string()
                .computed()
                .description("Status of the cluster."),
        ),
        (
            "airflow_config",
            Attribute::map_of(string_map())
                .optional()
                .map_validator(airflow_config_validator())
                .description("Configuration of the Apache Airflow application itself, as `section -> key -> value`."),
        ),
        (
            "pip_packages",
            Attribute::set_of(AttributeType::String)
                .optional()
                .description("Python packages that are installed in the cluster."),
        ),
        (
            "deb_packages",
            Attribute::set_of(AttributeType::String)
                .optional()
                .description("System packages that are installed in the cluster."),
        ),
        (
            "code_sync",
            Attribute::object([(
                "s3",
                Attribute::object([(
                    "bucket",
                    Attribute::string()
                        .required()
                        .description("The name of the Object Storage bucket that stores DAG files."),
                )])
                .required()
                .description("Currently only Object Storage (S3) is supported as the source of DAG files."),
            )])
            .required()
            .description("Parameters of the location and access to the code that will be executed in the cluster."),
        ),
        (
            "webserver",
            component("Configuration of the webserver instances.").required(),
        ),
        (
            "scheduler",
            component("Configuration of the scheduler instances.").required(),
        ),
        (
            "triggerer",
            component("Configuration of the triggerer instances.").optional(),
        ),
        (
            "worker",
            Attribute::object([
                (
                    "min_count",
                    Attribute::number()
                        .required()
                        .description("The minimum number of worker instances."),
                ),
                (
                    "max_count",
                    Attribute::number()
                        .required()
                        .description("The maximum number of worker instances."),
                ),
                (
                    "resource_preset_id",
                    Attribute::string()
                        .required()
                        .description("ID of the preset for computational resources."),
                ),
            ])
            .required()
            .description("Configuration of the worker instances."),
        ),
        (
            "lockbox_secrets_backend",
            Attribute::object([(
                "enabled",
                Attribute::bool()
                    .required()
                    .description("Enables usage of Lockbox Secrets Backend."),
            )])
            .optional()
            .description("Configuration of Lockbox Secrets Backend."),
        ),
        (
            "logging",
            Attribute::object([
                (
                    "enabled",
                    Attribute::bool()
                        .required()
                        .description("Enables delivery of logs generated by the Airflow components to Cloud Logging."),
                ),
                (
                    "folder_id",
                    Attribute::string()
                        .optional()
                        .description("Logs will be written to default log group of specified folder."),
                ),
                (
                    "log_group_id",
                    Attribute::string()
                        .optional()
                        .description("Logs will be written to the specified log group."),
                ),
                (
                    "min_level",
                    Attribute::string()
                        .optional()
                        .string_validator(log_level_validator())
                        .description("Logs with lower severity are not written to Cloud Logging."),
                ),
            ])
            .optional()
            .computed()
            .description("Cloud Logging configuration."),
        ),
    ];

    Schema {
        version: 0,
        description: "Managed Airflow cluster.".to_string(),
        attributes: attributes
            .into_iter()
            .map(|(name, attribute)| (name.to_string(), attribute))
            .collect(),
        blocks: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeroform_plugin::DynamicValue;
    use serde_json::json;

    #[test]
    fn test_computed_and_sensitive_attributes() {
        let schema = cluster_resource_schema();
        let computed: Vec<&str> = schema
            .attributes
            .iter()
            .filter(|(_, a)| a.computed)
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(
            computed,
            vec![
                "created_at",
                "deletion_protection",
                "folder_id",
                "id",
                "logging",
                "status"
            ]
        );
        let sensitive: Vec<&str> = schema.sensitive_attributes().collect();
        assert_eq!(sensitive, vec!["admin_password"]);
    }

    #[test]
    fn test_replacement_attributes() {
        let schema = cluster_resource_schema();
        let mut replaced: Vec<&str> = schema
            .attributes
            .iter()
            .filter(|(_, a)| a.requires_replace)
            .map(|(name, _)| name.as_str())
            .collect();
        replaced.sort();
        assert_eq!(replaced, vec!["folder_id", "subnet_ids"]);
    }

    #[test]
    fn test_validate_runs_nested_validators() {
        let schema = cluster_resource_schema();
        let config = DynamicValue::new(json!({
            "name": "af",
            "admin_password": "pw",
            "service_account_id": "sa",
            "subnet_ids": ["s1"],
            "code_sync": { "s3": { "bucket": "dags" } },
            "webserver": { "count": 1, "resource_preset_id": "c1-m4" },
            "scheduler": { "count": 1, "resource_preset_id": "c1-m4" },
            "worker": { "min_count": 1, "max_count": 2, "resource_preset_id": "c1-m4" },
            "airflow_config": { "core.x": { "k": "v" } },
            "logging": { "enabled": true, "folder_id": "b1g", "min_level": "LOUD" },
        }));

        let diags = schema.validate(&config);
        let paths: Vec<String> = diags
            .errors()
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(
            paths,
            vec![
                "airflow_config[\"core.x\"]".to_string(),
                "logging.min_level".to_string()
            ]
        );
    }

    #[test]
    fn test_validate_reports_missing_required() {
        let schema = cluster_resource_schema();
        let diags = schema.validate(&DynamicValue::new(json!({ "name": "af" })));
        let missing: Vec<String> = diags
            .errors()
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect();
        assert!(missing.contains(&"admin_password".to_string()));
        assert!(missing.contains(&"worker".to_string()));
        assert!(!missing.contains(&"triggerer".to_string()));
    }
}
