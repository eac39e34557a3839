use crate::console::{ConsoleObserver, PromptCredentialSource, Spinner};
use ca1_cloud::{BootstrapSource, ProvisionOutcome, ProvisionReport, Provisioner, Topology};
use ca1_cloud_azure::AzureProvider;
use colored::Colorize;

pub async fn handle(topology: &Topology) -> anyhow::Result<()> {
    let provider = AzureProvider::new();
    super::check_session(&provider).await?;

    println!(
        "{} {} in {}",
        "Provisioning".bold(),
        topology.resource_group.cyan(),
        topology.location.cyan()
    );
    println!();

    let spinner = Spinner::new("Starting...");
    let observer = ConsoleObserver::new(spinner.clone());
    let credentials = PromptCredentialSource::new(spinner.clone());

    let result = Provisioner::new(&provider)
        .with_observer(&observer)
        .provision(topology, &BootstrapSource::working_dir(), &credentials)
        .await;
    spinner.finish();

    print_report(&result?);
    Ok(())
}

fn print_report(report: &ProvisionReport) {
    println!();
    match report.outcome {
        ProvisionOutcome::AlreadyProvisioned => {
            println!("{}", "✓ Environment already provisioned".green().bold());
        }
        ProvisionOutcome::Provisioned => {
            println!(
                "{} ({}) in {:.1}s",
                "✓ Environment provisioned".green().bold(),
                report.summary(),
                report.duration_ms as f64 / 1000.0
            );
        }
    }

    match (&report.public_ip, report.ssh_command(), report.http_url()) {
        (Some(ip), Some(ssh), Some(url)) => {
            println!("  Public IP: {}", ip.cyan());
            println!("  SSH:       {}", ssh.cyan());
            println!("  HTTP:      {}", url.cyan());
        }
        _ => {
            println!(
                "  {} public IP not assigned yet; run `ca1 status` later",
                "⚠".yellow()
            );
        }
    }
}
