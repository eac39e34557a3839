mod commands;
mod console;

use ca1_cloud::{CloudError, Topology};
use ca1_cloud::topology::{DEFAULT_ADMIN_USERNAME, DEFAULT_LOCATION};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ca1")]
#[command(
    about = "Provision and tear down the CA1 Azure environment, safely re-runnable",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create whatever is missing of the CA1 environment
    Provision {
        /// Azure region for new resources
        #[arg(short, long, env = "CA1_LOCATION", default_value = DEFAULT_LOCATION)]
        location: String,
        /// Local administrator account on the VM
        #[arg(short, long, env = "CA1_ADMIN_USERNAME", default_value = DEFAULT_ADMIN_USERNAME)]
        admin_username: String,
    },
    /// Delete the resource group and everything in it
    Teardown {
        /// Accepted for symmetry with provision; deletion is by group name
        #[arg(short, long, env = "CA1_LOCATION", default_value = DEFAULT_LOCATION)]
        location: String,
    },
    /// Show which resources exist, without changing anything
    Status,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for the console report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if is_environment_error(&e) {
            eprintln!("{}", SETUP_HINT.yellow());
        }
        std::process::exit(1);
    }
}

const SETUP_HINT: &str =
    "Fix the local setup above and run the command again; resources already created are kept.";

/// Missing client, missing session or missing bootstrap file
fn is_environment_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<CloudError>())
        .any(CloudError::is_environment)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Provision {
            location,
            admin_username,
        } => {
            let topology = Topology::ca1(location, admin_username);
            commands::provision::handle(&topology).await?;
        }
        Commands::Teardown { location } => {
            tracing::debug!("Teardown requested (location {} is not used)", location);
            commands::teardown::handle(&Topology::default()).await?;
        }
        Commands::Status => {
            commands::status::handle(&Topology::default()).await?;
        }
        Commands::Version => {
            println!("ca1 {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
