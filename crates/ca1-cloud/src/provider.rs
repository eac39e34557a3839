//! Provisioning API trait definition

use crate::bootstrap::BootstrapPayload;
use crate::credential::AdminCredential;
use crate::error::Result;
use crate::model::{
    NetworkInterface, PublicIp, ResourceGroup, SecurityGroup, Subnet, VirtualMachine,
    VirtualNetwork,
};
use crate::topology::{
    NetworkSpec, NicSpec, PublicIpSpec, SecurityGroupSpec, SecurityRule, SubnetSpec, VmSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provisioning API abstraction
///
/// Every call blocks the caller until the provider has finished the
/// operation. Lookups return `Ok(None)` when the named resource does not
/// exist; absence is never an error.
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// Returns the provider name (e.g., "azure")
    fn name(&self) -> &str;

    /// Check that the client is installed and a session is present
    ///
    /// A missing client is reported as `Err(CloudError::ClientNotInstalled)`,
    /// a missing session as `Ok(AuthStatus { authenticated: false, .. })`.
    async fn check_auth(&self) -> Result<AuthStatus>;

    async fn get_resource_group(&self, name: &str) -> Result<Option<ResourceGroup>>;

    async fn create_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup>;

    /// Forced, blocking delete of the group and everything in it
    async fn delete_resource_group(&self, name: &str) -> Result<()>;

    async fn get_virtual_network(&self, group: &str, name: &str)
    -> Result<Option<VirtualNetwork>>;

    /// Create the network together with its initial subnet
    async fn create_virtual_network(
        &self,
        group: &str,
        location: &str,
        network: &NetworkSpec,
        subnet: &SubnetSpec,
    ) -> Result<VirtualNetwork>;

    /// Add a subnet to an existing network and persist the network
    async fn add_subnet(
        &self,
        group: &str,
        network: &VirtualNetwork,
        subnet: &SubnetSpec,
    ) -> Result<Subnet>;

    async fn get_security_group(&self, group: &str, name: &str) -> Result<Option<SecurityGroup>>;

    /// Create an empty security group; rules are added one by one
    async fn create_security_group(
        &self,
        group: &str,
        location: &str,
        spec: &SecurityGroupSpec,
    ) -> Result<SecurityGroup>;

    /// Add one rule to an existing security group, returning the rule name
    async fn create_security_rule(
        &self,
        group: &str,
        security_group: &str,
        rule: &SecurityRule,
    ) -> Result<String>;

    async fn get_public_ip(&self, group: &str, name: &str) -> Result<Option<PublicIp>>;

    async fn create_public_ip(
        &self,
        group: &str,
        location: &str,
        spec: &PublicIpSpec,
    ) -> Result<PublicIp>;

    async fn get_network_interface(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<NetworkInterface>>;

    async fn create_network_interface(
        &self,
        group: &str,
        location: &str,
        spec: &NicSpec,
        bindings: &NicBindings,
    ) -> Result<NetworkInterface>;

    async fn get_virtual_machine(&self, group: &str, name: &str)
    -> Result<Option<VirtualMachine>>;

    async fn create_virtual_machine(
        &self,
        group: &str,
        location: &str,
        spec: &VmSpec,
        launch: &VmLaunch<'_>,
    ) -> Result<VirtualMachine>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/subscription information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Identifiers a network interface is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicBindings {
    pub subnet_id: String,
    pub security_group_id: String,
    pub public_ip_id: String,
}

/// Everything the VM needs beyond its fixed spec
#[derive(Debug, Clone)]
pub struct VmLaunch<'a> {
    pub nic_id: &'a str,
    pub credential: &'a AdminCredential,
    pub custom_data: &'a BootstrapPayload,
}
