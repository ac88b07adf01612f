use crate::commands::validate;
use crate::host::Host;
use crate::project::Project;
use crate::utils;
use aeroform_plugin::plan::plan_resource;
use aeroform_plugin::{ActionType, Plan, StateFile, StateManager};
use colored::Colorize;
use std::path::Path;

pub async fn handle(root: &Path) -> anyhow::Result<()> {
    let project = Project::load(root)?;
    let host = Host::offline();
    validate::validate_project(&host, &project).await?;

    let state = StateManager::new(root).load().await?;
    let plan = build_plan(&host, &project, &state)?;
    print_plan(&plan);
    Ok(())
}

/// One action per configured resource plus a delete for every resource
/// that is in the state but no longer configured
pub fn build_plan(host: &Host, project: &Project, state: &StateFile) -> anyhow::Result<Plan> {
    let schema = host.schema();
    let mut actions = Vec::new();

    for (name, config) in &project.resources {
        let address = host.address(name);
        let prior = match state.get(&address) {
            Some(prior) => {
                host.ensure_type(&prior.resource_type)?;
                Some(&prior.value)
            }
            None => None,
        };
        actions.push(plan_resource(
            address,
            host.resource_type.clone(),
            &schema,
            Some(config),
            prior,
        ));
    }

    for (address, prior) in &state.resources {
        let configured = host
            .name_of(address)
            .is_some_and(|name| project.resources.contains_key(name));
        if !configured {
            host.ensure_type(&prior.resource_type)?;
            actions.push(plan_resource(
                address.clone(),
                prior.resource_type.clone(),
                &schema,
                None,
                Some(&prior.value),
            ));
        }
    }

    Ok(Plan::new(actions))
}

pub fn print_plan(plan: &Plan) {
    println!();
    if !plan.has_changes {
        println!("{}", "No changes. Infrastructure matches the configuration.".green());
        return;
    }

    println!("{}", "Planned changes:".bold());
    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        println!(
            "  {} {} ({})",
            utils::action_symbol(action.action_type),
            action.address.cyan(),
            action.action_type
        );
        for path in &action.requires_replace {
            println!("      {} forces replacement", path.to_string().yellow());
        }
    }
    println!();
    println!("Plan: {}", plan.summary());
}
