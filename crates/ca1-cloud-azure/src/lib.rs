//! Azure provider for the CA1 environment
//!
//! This crate implements the `ProvisioningApi` trait on top of the Azure CLI,
//! so the reconcilers in `ca1-cloud` can drive a real subscription.
//!
//! # Requirements
//!
//! - `az` must be installed (or `CA1_AZ_PATH` must point at it)
//! - A session must be present (`az login`)
//!
//! # Example
//!
//! ```ignore
//! use ca1_cloud::{BootstrapSource, FixedCredentialSource, Provisioner, Topology, preflight};
//! use ca1_cloud_azure::AzureProvider;
//!
//! let provider = AzureProvider::new();
//! preflight(&provider).await?;
//!
//! let report = Provisioner::new(&provider)
//!     .provision(
//!         &Topology::default(),
//!         &BootstrapSource::working_dir(),
//!         &FixedCredentialSource::new("s3cret-Passw0rd"),
//!     )
//!     .await?;
//! println!("{}", report.summary());
//! ```

pub mod az;
pub mod error;
pub mod provider;

pub use az::{AZ_PATH_ENV, AzCli};
pub use error::{AzureError, Result};
pub use provider::AzureProvider;
