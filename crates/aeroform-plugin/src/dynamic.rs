//! Dynamic values exchanged with the host
//!
//! Config, plan and state travel as JSON objects. Resources decode them into
//! typed models with [`DynamicValue::get`] and encode them back with
//! [`DynamicValue::from_model`]; conversion problems become diagnostics.

use crate::diagnostics::Diagnostics;
use crate::path::{AttributePath, PathStep};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicValue(serde_json::Value);

impl DynamicValue {
    pub fn new(json: serde_json::Value) -> Self {
        Self(json)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Decode into a typed model
    pub fn get<T: DeserializeOwned>(&self, diags: &mut Diagnostics) -> Option<T> {
        match serde_json::from_value(self.0.clone()) {
            Ok(model) => Some(model),
            Err(e) => {
                diags.add_error(
                    "Value Conversion Error",
                    format!("An unexpected error was encountered trying to convert the value: {e}"),
                );
                None
            }
        }
    }

    /// Encode a typed model
    pub fn from_model<T: Serialize>(model: &T, diags: &mut Diagnostics) -> Option<Self> {
        match serde_json::to_value(model) {
            Ok(json) => Some(Self(json)),
            Err(e) => {
                diags.add_error(
                    "Value Conversion Error",
                    format!("An unexpected error was encountered trying to encode the value: {e}"),
                );
                None
            }
        }
    }

    /// Value at `path`, `None` when any step is missing
    pub fn attribute(&self, path: &AttributePath) -> Option<&serde_json::Value> {
        let mut current = &self.0;
        for step in path.steps() {
            current = match step {
                PathStep::Attribute(name) | PathStep::ElementKey(name) => current.get(name)?,
                PathStep::ElementIndex(index) => current.get(*index)?,
            };
        }
        Some(current)
    }

    /// Set a single attribute, creating intermediate objects as needed
    ///
    /// Only attribute and key steps are supported.
    pub fn set_attribute<T: Serialize>(
        &mut self,
        path: &AttributePath,
        value: T,
        diags: &mut Diagnostics,
    ) {
        let encoded = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                diags.add_attribute_error(
                    path.clone(),
                    "Value Conversion Error",
                    format!("An unexpected error was encountered trying to encode the value: {e}"),
                );
                return;
            }
        };

        let Some((last, parents)) = path.steps().split_last() else {
            diags.add_error("Invalid Attribute Path", "Cannot set a value at an empty path");
            return;
        };

        if self.0.is_null() {
            self.0 = serde_json::Value::Object(serde_json::Map::new());
        }
        let mut current = &mut self.0;
        for step in parents {
            let name = match step {
                PathStep::Attribute(name) | PathStep::ElementKey(name) => name,
                PathStep::ElementIndex(_) => {
                    diags.add_attribute_error(
                        path.clone(),
                        "Invalid Attribute Path",
                        "List element steps cannot be set directly",
                    );
                    return;
                }
            };
            let Some(object) = current.as_object_mut() else {
                diags.add_attribute_error(
                    path.clone(),
                    "Invalid Attribute Path",
                    format!("Attribute {name} is not an object"),
                );
                return;
            };
            current = object
                .entry(name.clone())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if current.is_null() {
                *current = serde_json::Value::Object(serde_json::Map::new());
            }
        }

        match (last, current.as_object_mut()) {
            (PathStep::Attribute(name) | PathStep::ElementKey(name), Some(object)) => {
                object.insert(name.clone(), encoded);
            }
            _ => diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute Path",
                "Target of the path is not an object attribute",
            ),
        }
    }
}

impl From<serde_json::Value> for DynamicValue {
    fn from(json: serde_json::Value) -> Self {
        Self(json)
    }
}
