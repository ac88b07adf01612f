//! Resource schema declaration
//!
//! The schema describes accepted attributes, which of them are computed by
//! the provider, and the validators to run on configuration values.

use crate::diagnostics::Diagnostics;
use crate::dynamic::DynamicValue;
use crate::path::AttributePath;
use crate::validator::{AttributeValidator, MapValidator, StringValidator};
use crate::value::UNKNOWN_VALUE;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Type of an attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
    Number,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    /// Single nested object with its own attributes
    Object(BTreeMap<String, Attribute>),
}

/// Attribute declaration
#[derive(Debug, Clone, Default)]
pub struct Attribute {
    pub attribute_type: Option<AttributeType>,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing this attribute replaces the resource
    pub requires_replace: bool,
    pub validators: Vec<AttributeValidator>,
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.attribute_type == other.attribute_type
            && self.required == other.required
            && self.optional == other.optional
            && self.computed == other.computed
            && self.sensitive == other.sensitive
            && self.requires_replace == other.requires_replace
    }
}

impl Eq for Attribute {}

impl Attribute {
    fn with_type(attribute_type: AttributeType) -> Self {
        Self {
            attribute_type: Some(attribute_type),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::with_type(AttributeType::String)
    }

    pub fn bool() -> Self {
        Self::with_type(AttributeType::Bool)
    }

    pub fn number() -> Self {
        Self::with_type(AttributeType::Number)
    }

    pub fn set_of(element: AttributeType) -> Self {
        Self::with_type(AttributeType::Set(Box::new(element)))
    }

    pub fn list_of(element: AttributeType) -> Self {
        Self::with_type(AttributeType::List(Box::new(element)))
    }

    pub fn map_of(element: AttributeType) -> Self {
        Self::with_type(AttributeType::Map(Box::new(element)))
    }

    pub fn object<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (S, Attribute)>,
        S: Into<String>,
    {
        Self::with_type(AttributeType::Object(
            attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn string_validator(mut self, validator: Arc<dyn StringValidator>) -> Self {
        self.validators.push(AttributeValidator::String(validator));
        self
    }

    pub fn map_validator(mut self, validator: Arc<dyn MapValidator>) -> Self {
        self.validators.push(AttributeValidator::Map(validator));
        self
    }
}

/// Nested block, such as `timeouts`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
}

/// Schema of a resource type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
    pub blocks: BTreeMap<String, Block>,
}

impl Schema {
    /// Run required-attribute checks and attribute validators on a config
    pub fn validate(&self, config: &DynamicValue) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let empty = serde_json::Map::new();
        let object = config.as_json().as_object().unwrap_or(&empty);

        for (name, attribute) in &self.attributes {
            validate_attribute(
                &AttributePath::root(name.clone()),
                attribute,
                object.get(name),
                &mut diags,
            );
        }
        for (name, block) in &self.blocks {
            let Some(block_value) = object.get(name).and_then(|v| v.as_object()) else {
                continue;
            };
            for (attr_name, attribute) in &block.attributes {
                validate_attribute(
                    &AttributePath::root(name.clone()).attribute(attr_name.clone()),
                    attribute,
                    block_value.get(attr_name),
                    &mut diags,
                );
            }
        }
        diags
    }

    pub fn sensitive_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.sensitive)
            .map(|(name, _)| name.as_str())
    }
}

fn validate_attribute(
    path: &AttributePath,
    attribute: &Attribute,
    value: Option<&serde_json::Value>,
    diags: &mut Diagnostics,
) {
    let value = match value {
        None | Some(serde_json::Value::Null) => {
            if attribute.required {
                diags.add_attribute_error(
                    path.clone(),
                    "Missing Configuration for Required Attribute",
                    format!(
                        "Must set a configuration value for the {path} attribute as the provider has marked it as required."
                    ),
                );
            }
            return;
        }
        Some(serde_json::Value::String(s)) if s == UNKNOWN_VALUE => return,
        Some(v) => v,
    };

    if attribute.computed && !attribute.optional && !attribute.required {
        diags.add_attribute_error(
            path.clone(),
            "Invalid Configuration for Read-Only Attribute",
            format!("Cannot set value for the {path} attribute as the provider has marked it as read-only."),
        );
        return;
    }

    for validator in &attribute.validators {
        match (validator, value) {
            (AttributeValidator::String(v), serde_json::Value::String(s)) => {
                v.validate_string(path, s, diags)
            }
            (AttributeValidator::Map(v), serde_json::Value::Object(map)) => {
                v.validate_map(path, map, diags)
            }
            _ => {}
        }
    }

    if let (Some(AttributeType::Object(nested)), serde_json::Value::Object(map)) =
        (&attribute.attribute_type, value)
    {
        for (name, nested_attribute) in nested {
            validate_attribute(
                &path.clone().attribute(name.clone()),
                nested_attribute,
                map.get(name),
                diags,
            );
        }
    }
}
