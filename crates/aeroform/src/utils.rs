use aeroform_plugin::{ActionType, Diagnostics, Schema, Severity};
use colored::Colorize;

/// Print diagnostics to stderr, errors in red and warnings in yellow
pub fn print_diagnostics(diags: &Diagnostics) {
    for diag in diags.iter() {
        let label = match diag.severity {
            Severity::Error => "Error:".red().bold(),
            Severity::Warning => "Warning:".yellow().bold(),
        };
        match &diag.attribute {
            Some(path) => eprintln!("{} {} (at {})", label, diag.summary, path),
            None => eprintln!("{} {}", label, diag.summary),
        }
        if !diag.detail.is_empty() {
            eprintln!("  {}", diag.detail);
        }
    }
}

/// Print `diags` and fail if any of them is an error
pub fn check(diags: &Diagnostics, context: impl std::fmt::Display) -> anyhow::Result<()> {
    print_diagnostics(diags);
    if diags.has_error() {
        anyhow::bail!("{}", context);
    }
    Ok(())
}

/// Copy of a state object with sensitive top-level attributes replaced
pub fn mask_sensitive(schema: &Schema, value: &serde_json::Value) -> serde_json::Value {
    let mut masked = value.clone();
    if let Some(object) = masked.as_object_mut() {
        for name in schema.sensitive_attributes() {
            if let Some(v) = object.get_mut(name).filter(|v| !v.is_null()) {
                *v = serde_json::Value::String("(sensitive)".to_string());
            }
        }
    }
    masked
}

pub fn action_symbol(action_type: ActionType) -> colored::ColoredString {
    match action_type {
        ActionType::Create => "+".green(),
        ActionType::Update => "~".yellow(),
        ActionType::Replace => "-/+".magenta(),
        ActionType::Delete => "-".red(),
        ActionType::NoOp => " ".normal(),
    }
}
