use crate::commands::{plan, validate};
use crate::host::Host;
use crate::project::Project;
use crate::utils;
use aeroform_plugin::plan::propose_new_state;
use aeroform_plugin::{
    Action, ActionType, ApplyResult, CreateRequest, DeleteRequest, DynamicValue, ResourceState,
    StateFile, StateManager, UpdateRequest,
};
use colored::Colorize;
use std::path::Path;
use std::time::Instant;

pub async fn handle(root: &Path, yes: bool) -> anyhow::Result<()> {
    let project = Project::load(root)?;
    let host = Host::connect().await?;
    validate::validate_project(&host, &project).await?;

    let manager = StateManager::new(root);
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    let plan = plan::build_plan(&host, &project, &state)?;
    plan::print_plan(&plan);

    if !plan.has_changes {
        lock.release().await?;
        return Ok(());
    }
    if !yes {
        println!();
        println!("Run with --yes to apply these changes");
        lock.release().await?;
        return Ok(());
    }

    let started = Instant::now();
    let mut result = ApplyResult::new();
    for action in plan
        .actions
        .iter()
        .filter(|a| a.action_type != ActionType::NoOp)
    {
        println!();
        println!(
            "{} {}...",
            utils::action_symbol(action.action_type),
            action.address.cyan()
        );

        match apply_action(&host, &project, action, &mut state).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), action.action_type);
                result.add_success(action.address.clone(), action.action_type.to_string());
            }
            Err(e) => {
                eprintln!("  {} {}", "✗".red(), e);
                result.add_failure(action.address.clone(), e.to_string());
            }
        }
        manager.save(&mut state).await?;
    }
    result.duration_ms = started.elapsed().as_millis() as u64;
    lock.release().await?;

    println!();
    println!(
        "Apply finished in {:.1}s: {} succeeded, {} failed",
        result.duration_ms as f64 / 1000.0,
        result.succeeded.len(),
        result.failed.len()
    );
    if !result.is_success() {
        anyhow::bail!("{} changes failed", result.failed.len());
    }
    Ok(())
}

async fn apply_action(
    host: &Host,
    project: &Project,
    action: &Action,
    state: &mut StateFile,
) -> anyhow::Result<()> {
    let address = action.address.as_str();
    match action.action_type {
        ActionType::Create => {
            let planned = planned(action)?;
            create(host, address, planned, state).await
        }
        ActionType::Update => {
            let prior = state.require(address)?.value.clone();
            let response = host
                .resource
                .update(UpdateRequest {
                    state: prior,
                    plan: planned(action)?,
                })
                .await;
            if let Some(value) = response.state {
                state.set(address, ResourceState::new(host.resource_type.clone(), value));
            }
            utils::check(&response.diagnostics, format!("Failed to update {}", address))
        }
        ActionType::Replace => {
            delete(host, address, state).await?;
            let config = host
                .name_of(address)
                .and_then(|name| project.resources.get(name))
                .ok_or_else(|| anyhow::anyhow!("{} is not configured", address))?;
            let planned = propose_new_state(&host.schema(), config, None);
            create(host, address, planned, state).await
        }
        ActionType::Delete => delete(host, address, state).await,
        ActionType::NoOp => Ok(()),
    }
}

fn planned(action: &Action) -> anyhow::Result<DynamicValue> {
    action
        .planned
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No planned state for {}", action.address))
}

async fn create(
    host: &Host,
    address: &str,
    planned: DynamicValue,
    state: &mut StateFile,
) -> anyhow::Result<()> {
    let response = host.resource.create(CreateRequest { plan: planned }).await;
    if let Some(value) = response.state {
        state.set(address, ResourceState::new(host.resource_type.clone(), value));
    }
    utils::check(&response.diagnostics, format!("Failed to create {}", address))
}

/// Delete the remote object and drop it from the state
pub async fn delete(host: &Host, address: &str, state: &mut StateFile) -> anyhow::Result<()> {
    let prior = state.require(address)?.value.clone();
    let response = host.resource.delete(DeleteRequest { state: prior }).await;
    utils::check(&response.diagnostics, format!("Failed to delete {}", address))?;
    state.remove(address);
    Ok(())
}
