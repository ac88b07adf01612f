//! Attribute validators of the cluster schema

use aeroform_plugin::validator::{self, MapValidator, StringValidator};
use aeroform_sdk::LogLevel;
use regex::Regex;
use std::sync::Arc;

/// Section names of `airflow_config` are joined with their keys by a dot
/// on the wire, so they must not contain one themselves.
pub fn airflow_config_validator() -> Arc<dyn MapValidator> {
    let no_dots = Regex::new(r"^[^.]*$").expect("valid regex");
    validator::keys_are(vec![validator::regex_matches(no_dots, "must not contain dots")])
}

/// Every named log level except the zero value
pub fn allowed_log_levels() -> Vec<String> {
    LogLevel::VALUES
        .iter()
        .filter(|(_, value)| *value != 0)
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn log_level_validator() -> Arc<dyn StringValidator> {
    validator::one_of(allowed_log_levels())
}
