//! Attribute validators
//!
//! Validators are attached to schema attributes and run by
//! [`Schema::validate`](crate::schema::Schema::validate) on known config
//! values before the resource's own config validation.

use crate::diagnostics::Diagnostics;
use crate::path::AttributePath;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Validates a known string value
pub trait StringValidator: Send + Sync + fmt::Debug {
    fn description(&self) -> String;

    fn validate_string(&self, path: &AttributePath, value: &str, diags: &mut Diagnostics);
}

/// Validates a known map value
pub trait MapValidator: Send + Sync + fmt::Debug {
    fn description(&self) -> String;

    fn validate_map(
        &self,
        path: &AttributePath,
        value: &serde_json::Map<String, serde_json::Value>,
        diags: &mut Diagnostics,
    );
}

/// Validator attached to a schema attribute
#[derive(Debug, Clone)]
pub enum AttributeValidator {
    String(Arc<dyn StringValidator>),
    Map(Arc<dyn MapValidator>),
}

impl AttributeValidator {
    pub fn description(&self) -> String {
        match self {
            AttributeValidator::String(v) => v.description(),
            AttributeValidator::Map(v) => v.description(),
        }
    }
}

/// String must be one of a fixed set of values
#[derive(Debug, Clone)]
pub struct OneOf {
    values: Vec<String>,
}

pub fn one_of<I, S>(values: I) -> Arc<dyn StringValidator>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Arc::new(OneOf {
        values: values.into_iter().map(Into::into).collect(),
    })
}

impl OneOf {
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl StringValidator for OneOf {
    fn description(&self) -> String {
        let quoted: Vec<String> = self.values.iter().map(|v| format!("{v:?}")).collect();
        format!("value must be one of: [{}]", quoted.join(" "))
    }

    fn validate_string(&self, path: &AttributePath, value: &str, diags: &mut Diagnostics) {
        if self.values.iter().any(|v| v == value) {
            return;
        }
        diags.add_attribute_error(
            path.clone(),
            "Invalid Attribute Value Match",
            format!("Attribute {} {}, got: {:?}", path, self.description(), value),
        );
    }
}

/// String must match a regular expression
#[derive(Debug, Clone)]
pub struct RegexMatches {
    regex: Regex,
    message: String,
}

pub fn regex_matches(regex: Regex, message: impl Into<String>) -> Arc<dyn StringValidator> {
    Arc::new(RegexMatches {
        regex,
        message: message.into(),
    })
}

impl StringValidator for RegexMatches {
    fn description(&self) -> String {
        if self.message.is_empty() {
            format!("value must match regular expression '{}'", self.regex)
        } else {
            self.message.clone()
        }
    }

    fn validate_string(&self, path: &AttributePath, value: &str, diags: &mut Diagnostics) {
        if self.regex.is_match(value) {
            return;
        }
        diags.add_attribute_error(
            path.clone(),
            "Invalid Attribute Value Match",
            format!("Attribute {} {}, got: {}", path, self.description(), value),
        );
    }
}

/// Every key of a map must satisfy the wrapped string validators
#[derive(Debug, Clone)]
pub struct KeysAre {
    validators: Vec<Arc<dyn StringValidator>>,
}

pub fn keys_are(validators: Vec<Arc<dyn StringValidator>>) -> Arc<dyn MapValidator> {
    Arc::new(KeysAre { validators })
}

impl MapValidator for KeysAre {
    fn description(&self) -> String {
        let inner: Vec<String> = self.validators.iter().map(|v| v.description()).collect();
        format!("map keys must satisfy all validations: {}", inner.join(" + "))
    }

    fn validate_map(
        &self,
        path: &AttributePath,
        value: &serde_json::Map<String, serde_json::Value>,
        diags: &mut Diagnostics,
    ) {
        for key in value.keys() {
            let key_path = path.clone().key(key.clone());
            for validator in &self.validators {
                validator.validate_string(&key_path, key, diags);
            }
        }
    }
}

/// String must parse as a duration such as `30m` or `1h30m`
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationValue;

pub fn duration() -> Arc<dyn StringValidator> {
    Arc::new(DurationValue)
}

impl StringValidator for DurationValue {
    fn description(&self) -> String {
        "string must be a valid duration, e.g. \"30s\", \"20m\" or \"2h45m\"".to_string()
    }

    fn validate_string(&self, path: &AttributePath, value: &str, diags: &mut Diagnostics) {
        if let Err(e) = humantime::parse_duration(value) {
            diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute Value",
                format!("Attribute {} {}: {}", path, self.description(), e),
            );
        }
    }
}
