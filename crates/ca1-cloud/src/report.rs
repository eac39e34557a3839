//! Progress events and run reports

use crate::model::ResourceKind;
use serde::{Deserialize, Serialize};

/// What the reconciler did with one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Already existed and was left untouched
    Reused,
    /// Did not exist and was created
    Created,
    /// Added to an existing parent left incomplete by an earlier run
    Repaired,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepAction::Reused => write!(f, "reused"),
            StepAction::Created => write!(f, "created"),
            StepAction::Repaired => write!(f, "repaired"),
        }
    }
}

/// Result of reconciling a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub kind: ResourceKind,
    pub name: String,
    pub action: StepAction,
}

/// Event emitted while a run progresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionEvent {
    Checking { kind: ResourceKind, name: String },
    Reusing { kind: ResourceKind, name: String },
    Creating { kind: ResourceKind, name: String },
    Created { kind: ResourceKind, name: String },
    Repairing { kind: ResourceKind, name: String, parent: String },
    /// The VM already exists; nothing else will be touched
    ShortCircuit { vm: String },
}

/// Receives progress events as they happen
pub trait ProvisionObserver: Send + Sync {
    fn on_event(&self, event: &ProvisionEvent);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProvisionObserver for NoopObserver {
    fn on_event(&self, _event: &ProvisionEvent) {}
}

/// How a provisioning run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// The VM already existed; the run made no changes
    AlreadyProvisioned,
    /// The run finished by creating the VM
    Provisioned,
}

/// Summary of a provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub outcome: ProvisionOutcome,

    /// Steps in the order they were reconciled
    pub steps: Vec<Step>,

    pub public_ip: Option<String>,

    pub admin_username: String,

    /// Wall-clock time of the run in milliseconds
    pub duration_ms: u64,
}

impl ProvisionReport {
    pub fn new(outcome: ProvisionOutcome, admin_username: impl Into<String>) -> Self {
        Self {
            outcome,
            steps: Vec::new(),
            public_ip: None,
            admin_username: admin_username.into(),
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, kind: ResourceKind, name: impl Into<String>, action: StepAction) {
        self.steps.push(Step {
            kind,
            name: name.into(),
            action,
        });
    }

    /// Steps with the given action
    pub fn steps_by_action(&self, action: StepAction) -> Vec<&Step> {
        self.steps.iter().filter(|s| s.action == action).collect()
    }

    pub fn has_changes(&self) -> bool {
        self.steps.iter().any(|s| s.action != StepAction::Reused)
    }

    /// `ssh <admin>@<ip>`
    pub fn ssh_command(&self) -> Option<String> {
        self.public_ip
            .as_ref()
            .map(|ip| format!("ssh {}@{}", self.admin_username, ip))
    }

    /// `http://<ip>:8080/`
    pub fn http_url(&self) -> Option<String> {
        self.public_ip
            .as_ref()
            .map(|ip| format!("http://{}:{}/", ip, crate::topology::HTTP_PORT))
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            created: self.steps_by_action(StepAction::Created).len(),
            repaired: self.steps_by_action(StepAction::Repaired).len(),
            reused: self.steps_by_action(StepAction::Reused).len(),
        }
    }
}

/// Counts of each action in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub created: usize,
    pub repaired: usize,
    pub reused: usize,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} repaired, {} reused",
            self.created, self.repaired, self.reused
        )
    }
}
