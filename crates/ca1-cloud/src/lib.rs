//! CA1 Cloud Infrastructure
//!
//! This crate provides the provider abstraction and the idempotent
//! reconciliation logic for the CA1 assignment environment: one resource
//! group holding a network, a subnet, a security group, a public IP, a NIC
//! and a single cloud-init bootstrapped Linux VM.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    ca1 CLI                       │
//! │          (provision / teardown / status)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                  ca1-cloud                       │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │     Provisioner / Teardown / inspect     │   │
//! │  │        ensure(kind, query, create)        │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait ProvisioningApi { ... }            │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ azure (az CLI)│
//! └───────────────┘
//! ```

pub mod bootstrap;
pub mod credential;
pub mod ensure;
pub mod error;
pub mod model;
pub mod preflight;
pub mod provider;
pub mod reconcile;
pub mod report;
pub mod status;
pub mod teardown;
pub mod topology;

// Re-exports
pub use bootstrap::{BootstrapPayload, BootstrapSource};
pub use credential::{AdminCredential, CredentialSource, EnvCredentialSource, FixedCredentialSource};
pub use ensure::{Ensured, ensure};
pub use error::{CloudError, Result};
pub use model::{
    NetworkInterface, PublicIp, ResourceGroup, ResourceKind, SecurityGroup, Subnet,
    VirtualMachine, VirtualNetwork,
};
pub use preflight::preflight;
pub use provider::{AuthStatus, NicBindings, ProvisioningApi, VmLaunch};
pub use reconcile::Provisioner;
pub use report::{
    NoopObserver, ProvisionEvent, ProvisionObserver, ProvisionOutcome, ProvisionReport,
    ReportSummary, Step, StepAction,
};
pub use status::{StatusEntry, StatusReport, inspect};
pub use teardown::{Teardown, TeardownOutcome};
pub use topology::Topology;
