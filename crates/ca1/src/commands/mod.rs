pub mod provision;
pub mod status;
pub mod teardown;

use crate::console::Spinner;
use ca1_cloud::{ProvisioningApi, preflight};
use colored::Colorize;

/// Verify the client and session before any side effect
pub(crate) async fn check_session(provider: &dyn ProvisioningApi) -> anyhow::Result<()> {
    let spinner = Spinner::new("Checking Azure CLI session...");
    let result = preflight(provider).await;
    spinner.finish();

    let status = result?;
    println!(
        "{} {}",
        "Azure account:".bold(),
        status.account_info.as_deref().unwrap_or("unknown").cyan()
    );
    Ok(())
}
