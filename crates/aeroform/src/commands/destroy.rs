use crate::commands::apply;
use crate::host::Host;
use aeroform_plugin::{StateFile, StateManager};
use colored::Colorize;
use std::path::Path;

pub async fn handle(root: &Path, yes: bool) -> anyhow::Result<()> {
    let manager = StateManager::new(root);
    let mut state = manager.load().await?;
    if state.resources.is_empty() {
        println!("No resources in state");
        return Ok(());
    }

    println!("{}", "Resources to delete:".bold());
    for address in state.addresses() {
        println!("  {} {}", "-".red(), address.cyan());
    }
    if !yes {
        println!();
        println!(
            "{}",
            "Warning: the clusters and their data will be deleted.".yellow()
        );
        println!("Run with --yes to delete them");
        return Ok(());
    }

    let host = Host::connect().await?;
    let lock = manager.acquire_lock().await?;
    state = manager.load().await?;

    let addresses: Vec<String> = state.addresses().map(str::to_string).collect();
    let mut failed = 0;
    for address in &addresses {
        println!();
        println!("Deleting {}...", address.cyan());
        match destroy_one(&host, address, &mut state).await {
            Ok(()) => println!("  {} deleted", "✓".green()),
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}", "✗".red(), e);
            }
        }
        manager.save(&mut state).await?;
    }
    lock.release().await?;

    if failed > 0 {
        anyhow::bail!("{} of {} resources could not be deleted", failed, addresses.len());
    }
    println!();
    println!("{}", "✓ All resources destroyed".green().bold());
    Ok(())
}

async fn destroy_one(host: &Host, address: &str, state: &mut StateFile) -> anyhow::Result<()> {
    host.ensure_type(&state.require(address)?.resource_type)?;
    apply::delete(host, address, state).await
}
