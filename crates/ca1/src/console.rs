//! Console rendering: spinner, live progress and the password prompt

use ca1_cloud::{CloudError, CredentialSource, ProvisionEvent, ProvisionObserver};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a blocking provider call is in flight
#[derive(Clone)]
pub struct Spinner {
    progress_bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));

        Self { progress_bar: pb }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.progress_bar.set_message(msg.into());
    }

    /// Print a line above the spinner
    pub fn println(&self, line: impl AsRef<str>) {
        self.progress_bar.println(line);
    }

    /// Hide the spinner while `f` owns the terminal
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.progress_bar.suspend(f)
    }

    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

/// Renders reconciler events as they arrive
pub struct ConsoleObserver {
    spinner: Spinner,
}

impl ConsoleObserver {
    pub fn new(spinner: Spinner) -> Self {
        Self { spinner }
    }
}

impl ProvisionObserver for ConsoleObserver {
    fn on_event(&self, event: &ProvisionEvent) {
        match event {
            ProvisionEvent::Checking { kind, name } => {
                self.spinner.set_message(format!("Checking {} {}...", kind, name));
            }
            ProvisionEvent::Reusing { kind, name } => {
                self.spinner.println(format!(
                    "  {} {} {} {}",
                    "✓".green(),
                    kind,
                    name.cyan(),
                    "(exists)".dimmed()
                ));
            }
            ProvisionEvent::Creating { kind, name } => {
                self.spinner.set_message(format!("Creating {} {}...", kind, name));
            }
            ProvisionEvent::Created { kind, name } => {
                self.spinner.println(format!(
                    "  {} {} {} {}",
                    "✓".green(),
                    kind,
                    name.cyan(),
                    "(created)".green()
                ));
            }
            ProvisionEvent::Repairing { kind, name, parent } => {
                self.spinner.println(format!(
                    "  {} {} {} missing from {}, adding it",
                    "⚠".yellow(),
                    kind,
                    name.cyan(),
                    parent.cyan()
                ));
            }
            ProvisionEvent::ShortCircuit { vm } => {
                self.spinner.println(format!(
                    "  {} VM {} already exists, skipping remaining steps",
                    "ℹ".blue(),
                    vm.cyan()
                ));
            }
        }
    }
}

/// Asks once for the VM admin password on the terminal, input hidden
pub struct PromptCredentialSource {
    spinner: Spinner,
}

impl PromptCredentialSource {
    pub fn new(spinner: Spinner) -> Self {
        Self { spinner }
    }
}

impl CredentialSource for PromptCredentialSource {
    fn admin_password(&self, username: &str) -> ca1_cloud::Result<String> {
        self.spinner.suspend(|| {
            dialoguer::Password::new()
                .with_prompt(format!("VM admin password for {}", username))
                .interact()
                .map_err(|e| CloudError::Credential(e.to_string()))
        })
    }
}
