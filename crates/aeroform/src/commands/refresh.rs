use crate::host::Host;
use crate::utils;
use aeroform_plugin::{ReadRequest, ResourceState, StateManager};
use colored::Colorize;
use std::path::Path;

pub async fn handle(root: &Path) -> anyhow::Result<()> {
    let host = Host::connect().await?;
    let manager = StateManager::new(root);
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    println!("{}", "Refreshing state...".blue());
    let addresses: Vec<String> = state.addresses().map(str::to_string).collect();
    for address in &addresses {
        let prior = state.require(address)?;
        host.ensure_type(&prior.resource_type)?;

        let response = host
            .resource
            .read(ReadRequest {
                state: prior.value.clone(),
            })
            .await;
        utils::check(&response.diagnostics, format!("Failed to refresh {}", address))?;

        match response.state {
            Some(value) => {
                state.set(
                    address.as_str(),
                    ResourceState::new(host.resource_type.clone(), value),
                );
                println!("  {} {}", "✓".green(), address.cyan());
            }
            None => {
                state.remove(address);
                println!(
                    "  {} {} no longer exists, removed from state",
                    "-".red(),
                    address.cyan()
                );
            }
        }
    }

    manager.save(&mut state).await?;
    lock.release().await?;
    Ok(())
}
