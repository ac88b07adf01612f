mod commands;
mod host;
mod project;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aero")]
#[command(about = "Declarative management of Airflow clusters", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory containing aeroform.yaml (searched upward from the current directory by default)
    #[arg(short = 'C', long, global = true, env = project::ENV_PROJECT_ROOT)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every resource in aeroform.yaml
    Validate,
    /// Show what apply would change
    Plan,
    /// Create, update or delete clusters to match aeroform.yaml
    Apply {
        /// Apply without stopping at the plan
        #[arg(short, long)]
        yes: bool,
    },
    /// Re-read every managed cluster and update the state
    Refresh,
    /// Bring an existing cluster under management
    Import {
        /// Resource name in aeroform.yaml
        name: String,
        /// Cluster ID
        id: String,
    },
    /// Delete every cluster recorded in the state
    Destroy {
        /// Delete without stopping at the list of resources
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the stored state
    Show,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if cli.verbose {
        filter = filter.add_directive(tracing::Level::DEBUG.into());
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("aero {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let root = project::find_project_root(cli.project.as_deref())?;
    tracing::debug!(project_root = %root.display(), "Using project root");

    match cli.command {
        Commands::Validate => commands::validate::handle(&root).await?,
        Commands::Plan => commands::plan::handle(&root).await?,
        Commands::Apply { yes } => commands::apply::handle(&root, yes).await?,
        Commands::Refresh => commands::refresh::handle(&root).await?,
        Commands::Import { name, id } => commands::import::handle(&root, &name, &id).await?,
        Commands::Destroy { yes } => commands::destroy::handle(&root, yes).await?,
        Commands::Show => commands::show::handle(&root).await?,
        Commands::Version => unreachable!("Version is handled before project discovery"),
    }

    Ok(())
}
