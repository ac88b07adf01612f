use crate::host::Host;
use crate::utils;
use aeroform_plugin::StateManager;
use colored::Colorize;
use std::path::Path;

pub async fn handle(root: &Path) -> anyhow::Result<()> {
    let state = StateManager::new(root).load().await?;
    if state.resources.is_empty() {
        println!("No resources in state");
        return Ok(());
    }

    let schema = Host::offline().schema();
    println!(
        "{}",
        format!("State serial {} (updated {})", state.serial, state.updated_at).dimmed()
    );
    for (address, resource) in &state.resources {
        println!();
        println!("{} {}", "#".dimmed(), address.cyan().bold());
        let masked = utils::mask_sensitive(&schema, resource.value.as_json());
        println!("{}", serde_json::to_string_pretty(&masked)?);
    }
    Ok(())
}
