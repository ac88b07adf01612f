use crate::host::Host;
use crate::project::Project;
use crate::utils;
use aeroform_plugin::{Diagnostics, DynamicValue, ValidateConfigRequest};
use colored::Colorize;
use std::path::Path;

pub async fn handle(root: &Path) -> anyhow::Result<()> {
    println!("{}", "Validating configuration...".blue());

    let project = Project::load(root)?;
    let host = Host::offline();

    let mut failed = 0;
    for (name, config) in &project.resources {
        let diags = validate_resource(&host, config).await;
        utils::print_diagnostics(&diags);
        if diags.has_error() {
            failed += 1;
            println!("  {} {}", "✗".red(), host.address(name));
        } else {
            println!("  {} {}", "✓".green(), host.address(name));
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{} of {} resources have invalid configuration",
            failed,
            project.resources.len()
        );
    }

    println!(
        "{}",
        format!("✓ {} resources are valid", project.resources.len())
            .green()
            .bold()
    );
    Ok(())
}

/// Schema checks followed by the resource's own validation
pub async fn validate_resource(host: &Host, config: &DynamicValue) -> Diagnostics {
    let mut diags = host.schema().validate(config);
    if let Some(validator) = host.resource.as_validate_config() {
        let response = validator
            .validate_config(ValidateConfigRequest {
                config: config.clone(),
            })
            .await;
        diags.append(response.diagnostics);
    }
    diags
}

/// Validate every resource of `project`, failing on the first error
pub async fn validate_project(host: &Host, project: &Project) -> anyhow::Result<()> {
    for (name, config) in &project.resources {
        let diags = validate_resource(host, config).await;
        utils::check(&diags, format!("Invalid configuration of {}", host.address(name)))?;
    }
    Ok(())
}
