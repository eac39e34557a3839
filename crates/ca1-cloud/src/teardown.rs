//! Teardown reconciler
//!
//! The unit of deletion is the whole resource group; the provider cascades
//! the delete to everything inside it.

use crate::error::Result;
use crate::provider::ProvisioningApi;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownOutcome {
    /// The group did not exist; delete was not called
    NothingToTearDown,
    /// The group and its contents were deleted
    Deleted,
}

pub struct Teardown<'a> {
    provider: &'a dyn ProvisioningApi,
}

impl<'a> Teardown<'a> {
    pub fn new(provider: &'a dyn ProvisioningApi) -> Self {
        Self { provider }
    }

    /// Delete `resource_group` if it exists. Safe to repeat.
    pub async fn run(&self, resource_group: &str) -> Result<TeardownOutcome> {
        if self
            .provider
            .get_resource_group(resource_group)
            .await?
            .is_none()
        {
            tracing::info!(
                "Resource group {} does not exist, nothing to tear down",
                resource_group
            );
            return Ok(TeardownOutcome::NothingToTearDown);
        }

        tracing::info!("Deleting resource group {}", resource_group);
        self.provider.delete_resource_group(resource_group).await?;
        tracing::info!("Resource group {} deleted", resource_group);

        Ok(TeardownOutcome::Deleted)
    }
}
