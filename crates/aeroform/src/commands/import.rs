use crate::host::Host;
use crate::utils;
use aeroform_plugin::{ImportStateRequest, ReadRequest, ResourceState, StateManager};
use colored::Colorize;
use std::path::Path;

pub async fn handle(root: &Path, name: &str, id: &str) -> anyhow::Result<()> {
    let host = Host::connect().await?;
    let address = host.address(name);

    let Some(importer) = host.resource.as_import_state() else {
        anyhow::bail!("{} does not support import", host.resource_type);
    };

    let manager = StateManager::new(root);
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    if state.get(&address).is_some() {
        anyhow::bail!("{} is already managed", address);
    }

    println!("Importing {} as {}...", id.cyan(), address.cyan());
    let imported = importer
        .import_state(ImportStateRequest { id: id.to_string() })
        .await;
    utils::check(&imported.diagnostics, format!("Failed to import {}", id))?;

    let response = host
        .resource
        .read(ReadRequest {
            state: imported.state,
        })
        .await;
    utils::check(&response.diagnostics, format!("Failed to read {}", id))?;
    let Some(value) = response.state else {
        anyhow::bail!("Cannot import non-existent remote object {}", id);
    };

    state.set(
        address.as_str(),
        ResourceState::new(host.resource_type.clone(), value),
    );
    manager.save(&mut state).await?;
    lock.release().await?;

    println!("{}", format!("✓ Imported {}", address).green().bold());
    println!(
        "{}",
        "The admin password is not readable from the API; set it in aeroform.yaml".dimmed()
    );
    Ok(())
}
