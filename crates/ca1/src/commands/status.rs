use crate::console::Spinner;
use ca1_cloud::{Topology, inspect};
use ca1_cloud_azure::AzureProvider;
use colored::Colorize;

pub async fn handle(topology: &Topology) -> anyhow::Result<()> {
    let provider = AzureProvider::new();
    super::check_session(&provider).await?;

    let spinner = Spinner::new("Querying resources...");
    let result = inspect(&provider, topology).await;
    spinner.finish();
    let report = result?;

    println!();
    for entry in &report.entries {
        let state = if entry.present {
            "present".green()
        } else {
            "missing".red()
        };
        println!("  {:<20} {:<12} {}", entry.kind.to_string(), entry.name, state);
    }

    println!();
    if report.is_complete() {
        println!("{}", "✓ Environment complete".green().bold());
    } else {
        println!(
            "{} {} of {} resources missing; run `ca1 provision`",
            "⚠".yellow(),
            report.missing().len(),
            report.entries.len()
        );
    }
    if let Some(ip) = &report.public_ip {
        println!("  Public IP: {}", ip.cyan());
    }
    Ok(())
}
