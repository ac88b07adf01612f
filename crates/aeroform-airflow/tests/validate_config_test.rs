mod common;

use aeroform_plugin::{
    Diagnostics, DynamicValue, Resource, ResourceWithValidateConfig, UNKNOWN_VALUE,
    ValidateConfigRequest,
};
use common::{TestProvider, cluster_config};
use serde_json::{Value, json};

async fn validate(provider: &TestProvider, config: Value) -> Diagnostics {
    let validator = provider.resource.as_validate_config().unwrap();
    validator
        .validate_config(ValidateConfigRequest {
            config: DynamicValue::new(config),
        })
        .await
        .diagnostics
}

fn with_logging(logging: Value) -> Value {
    let mut config = cluster_config();
    config["logging"] = logging;
    config
}

#[tokio::test]
async fn test_logging_with_both_destinations() {
    let provider = TestProvider::new().await;
    let diags = validate(
        &provider,
        with_logging(json!({ "enabled": true, "folder_id": "b1g", "log_group_id": "e23" })),
    )
    .await;

    assert_eq!(diags.len(), 1);
    let error = diags.errors().next().unwrap();
    assert_eq!(error.summary, "Invalid Airflow cluster logging configuration");
    assert_eq!(
        error.detail,
        "Exactly one of the attributes `folder_id` and `log_group_id` must be specified"
    );
    assert_eq!(
        error.attribute.as_ref().map(ToString::to_string).as_deref(),
        Some("logging")
    );
}

#[tokio::test]
async fn test_logging_without_destination() {
    let provider = TestProvider::new().await;
    let diags = validate(&provider, with_logging(json!({ "enabled": false }))).await;

    assert_eq!(diags.len(), 1);
    assert!(diags.has_error());
}

#[tokio::test]
async fn test_logging_with_exactly_one_destination() {
    let provider = TestProvider::new().await;
    for logging in [
        json!({ "enabled": true, "folder_id": "b1g" }),
        json!({ "enabled": true, "log_group_id": "e23", "min_level": "ERROR" }),
    ] {
        let diags = validate(&provider, with_logging(logging)).await;
        assert!(diags.is_empty(), "{diags:?}");
    }
}

#[tokio::test]
async fn test_logging_absent_or_unknown() {
    let provider = TestProvider::new().await;
    assert!(validate(&provider, with_logging(Value::Null)).await.is_empty());
    assert!(
        validate(&provider, with_logging(json!(UNKNOWN_VALUE)))
            .await
            .is_empty()
    );
    assert!(
        validate(
            &provider,
            with_logging(json!({ "enabled": true, "log_group_id": UNKNOWN_VALUE }))
        )
        .await
        .is_empty()
    );
}

#[tokio::test]
async fn test_schema_rejects_dotted_config_sections() {
    let provider = TestProvider::new().await;
    let schema = provider.resource.schema();

    let mut config = cluster_config();
    config["airflow_config"] = json!({ "core.dags": { "folder": "/dags" } });
    let diags = schema.validate(&DynamicValue::new(config));
    assert_eq!(diags.len(), 1);
    assert!(diags.errors().next().unwrap().detail.contains("must not contain dots"));

    let diags = schema.validate(&DynamicValue::new(cluster_config()));
    assert!(diags.is_empty(), "{diags:?}");
}

#[tokio::test]
async fn test_schema_rejects_unnamed_log_levels() {
    let provider = TestProvider::new().await;
    let schema = provider.resource.schema();

    for (level, valid) in [
        ("TRACE", true),
        ("FATAL", true),
        ("LEVEL_UNSPECIFIED", false),
        ("NOTICE", false),
    ] {
        let config = with_logging(json!({ "enabled": true, "folder_id": "b1g", "min_level": level }));
        let diags = schema.validate(&DynamicValue::new(config));
        assert_eq!(diags.is_empty(), valid, "{level}: {diags:?}");
    }
}

#[tokio::test]
async fn test_schema_validates_timeouts() {
    let provider = TestProvider::new().await;
    let schema = provider.resource.schema();

    let mut config = cluster_config();
    config["timeouts"] = json!({ "create": "eventually", "delete": "20m" });
    let diags = schema.validate(&DynamicValue::new(config));
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags
            .errors()
            .next()
            .unwrap()
            .attribute
            .as_ref()
            .map(ToString::to_string)
            .as_deref(),
        Some("timeouts.create")
    );
}
