//! `timeouts` block support
//!
//! Resources declare a `timeouts { create = "..." update = "..." delete = "..." }`
//! block; each lifecycle call resolves its deadline from the block, falling
//! back to the resource's default.

use crate::diagnostics::Diagnostics;
use crate::path::AttributePath;
use crate::schema::{Attribute, Block};
use crate::validator;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Which operations the block exposes
#[derive(Debug, Clone, Copy, Default)]
pub struct Opts {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

/// Schema block for the selected operations
pub fn block(opts: Opts) -> Block {
    let mut attributes = BTreeMap::new();
    for (name, enabled) in [
        ("create", opts.create),
        ("update", opts.update),
        ("delete", opts.delete),
    ] {
        if enabled {
            attributes.insert(
                name.to_string(),
                Attribute::string()
                    .optional()
                    .description(format!(
                        "A string that can be parsed as a duration, e.g. \"30s\" or \"2h45m\". \
                         Bounds the {name} operation."
                    ))
                    .string_validator(validator::duration()),
            );
        }
    }
    Block {
        description: "Operation timeouts".to_string(),
        attributes,
    }
}

/// Decoded `timeouts` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub create: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub update: Value<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub delete: Value<String>,
}

impl Timeouts {
    pub fn create(&self, default: Duration, diags: &mut Diagnostics) -> Duration {
        resolve("create", &self.create, default, diags)
    }

    pub fn update(&self, default: Duration, diags: &mut Diagnostics) -> Duration {
        resolve("update", &self.update, default, diags)
    }

    pub fn delete(&self, default: Duration, diags: &mut Diagnostics) -> Duration {
        resolve("delete", &self.delete, default, diags)
    }
}

fn resolve(
    name: &str,
    value: &Value<String>,
    default: Duration,
    diags: &mut Diagnostics,
) -> Duration {
    let Some(raw) = value.get() else {
        return default;
    };
    match humantime::parse_duration(raw) {
        Ok(duration) => duration,
        Err(e) => {
            diags.add_attribute_error(
                AttributePath::root("timeouts").attribute(name),
                "Timeout Cannot Be Parsed",
                format!("Unable to parse {name} timeout {raw:?}: {e}"),
            );
            default
        }
    }
}
