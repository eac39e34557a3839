use crate::console::Spinner;
use ca1_cloud::{Teardown, TeardownOutcome, Topology};
use ca1_cloud_azure::AzureProvider;
use colored::Colorize;

pub async fn handle(topology: &Topology) -> anyhow::Result<()> {
    let provider = AzureProvider::new();
    super::check_session(&provider).await?;

    let group = topology.resource_group.as_str();
    let spinner = Spinner::new(&format!(
        "Tearing down {} (this can take several minutes)...",
        group
    ));
    let result = Teardown::new(&provider).run(group).await;
    spinner.finish();

    match result? {
        TeardownOutcome::NothingToTearDown => {
            println!(
                "{} resource group {} does not exist, nothing to tear down",
                "ℹ".blue(),
                group.cyan()
            );
        }
        TeardownOutcome::Deleted => {
            println!(
                "{} resource group {} and everything in it deleted",
                "✓".green(),
                group.cyan()
            );
        }
    }
    Ok(())
}
