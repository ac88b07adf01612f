//! Change planning for managed resources
//!
//! The host compares configuration with prior state to decide, per
//! resource, whether to create, update, replace, delete or leave it alone.

use crate::dynamic::DynamicValue;
use crate::path::AttributePath;
use crate::schema::Schema;
use crate::value::UNKNOWN_VALUE;
use serde::{Deserialize, Serialize};

/// Represents a planned action for one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Resource address in the host (e.g. "aeroform_airflow_cluster.main")
    pub address: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource type name
    pub resource_type: String,

    /// Proposed new state, absent for deletes
    pub planned: Option<DynamicValue>,

    /// Changed attributes that force replacement
    pub requires_replace: Vec<AttributePath>,
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource in place
    Update,
    /// Delete and re-create
    Replace,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            replace: self.actions_by_type(ActionType::Replace).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, address: String, message: String) {
        self.succeeded.push(ActionResult {
            address,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, address: String, error: String) {
        self.failed.push(ActionResult {
            address,
            message: String::new(),
            error: Some(error),
        });
    }
}

/// Outcome of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub address: String,
    pub message: String,
    pub error: Option<String>,
}

/// Proposed new state for a resource
///
/// A non-null config value wins. Otherwise a computed attribute keeps its
/// prior value, or becomes unknown when there is no prior state.
pub fn propose_new_state(
    schema: &Schema,
    config: &DynamicValue,
    prior: Option<&DynamicValue>,
) -> DynamicValue {
    let empty = serde_json::Map::new();
    let config = config.as_json().as_object().unwrap_or(&empty);
    let prior = prior.and_then(|p| p.as_json().as_object());

    let mut proposed = serde_json::Map::new();
    for (name, attribute) in &schema.attributes {
        let configured = config.get(name).filter(|v| !v.is_null());
        let value = match (configured, prior) {
            (Some(v), _) => v.clone(),
            (None, _) if !attribute.computed => serde_json::Value::Null,
            (None, Some(prior)) => prior.get(name).cloned().unwrap_or_default(),
            (None, None) => serde_json::Value::String(UNKNOWN_VALUE.to_string()),
        };
        proposed.insert(name.clone(), value);
    }
    for name in schema.blocks.keys() {
        let value = config.get(name).cloned().unwrap_or_default();
        proposed.insert(name.clone(), value);
    }
    DynamicValue::new(serde_json::Value::Object(proposed))
}

/// Top-level attributes marked `requires_replace` whose value changed
pub fn replaced_attributes(
    schema: &Schema,
    prior: &DynamicValue,
    planned: &DynamicValue,
) -> Vec<AttributePath> {
    schema
        .attributes
        .iter()
        .filter(|(_, a)| a.requires_replace)
        .filter_map(|(name, _)| {
            let path = AttributePath::root(name.clone());
            let before = prior.attribute(&path).filter(|v| !v.is_null());
            let after = planned.attribute(&path).filter(|v| !v.is_null());
            match (before, after) {
                (Some(b), Some(a)) if a != b => Some(path),
                (Some(_), None) => Some(path),
                _ => None,
            }
        })
        .collect()
}

/// Decide what to do with one resource
pub fn plan_resource(
    address: impl Into<String>,
    resource_type: impl Into<String>,
    schema: &Schema,
    config: Option<&DynamicValue>,
    prior: Option<&DynamicValue>,
) -> Action {
    let address = address.into();
    let resource_type = resource_type.into();

    let Some(config) = config else {
        return Action {
            address,
            action_type: if prior.is_some() {
                ActionType::Delete
            } else {
                ActionType::NoOp
            },
            resource_type,
            planned: None,
            requires_replace: Vec::new(),
        };
    };

    let Some(prior_state) = prior else {
        return Action {
            address,
            action_type: ActionType::Create,
            resource_type,
            planned: Some(propose_new_state(schema, config, None)),
            requires_replace: Vec::new(),
        };
    };

    let planned = propose_new_state(schema, config, Some(prior_state));
    let requires_replace = replaced_attributes(schema, prior_state, &planned);
    let action_type = if !requires_replace.is_empty() {
        ActionType::Replace
    } else if differs(schema, prior_state, &planned) {
        ActionType::Update
    } else {
        ActionType::NoOp
    };

    Action {
        address,
        action_type,
        resource_type,
        planned: Some(planned),
        requires_replace,
    }
}

fn differs(schema: &Schema, prior: &DynamicValue, planned: &DynamicValue) -> bool {
    schema
        .attributes
        .keys()
        .chain(schema.blocks.keys())
        .any(|name| {
            let path = AttributePath::root(name.clone());
            let before = prior.attribute(&path).cloned().unwrap_or_default();
            let after = planned.attribute(&path).cloned().unwrap_or_default();
            before != after
        })
}
