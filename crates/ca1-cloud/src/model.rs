//! Provider-side resources as observed through the provisioning API
//!
//! These are read models: the provider owns the resources, this crate only
//! carries the identifiers it needs to wire one resource to the next.

use serde::{Deserialize, Serialize};

/// The kinds of resource in the CA1 topology, in dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    SecurityGroup,
    /// A rule inside the security group, checked by name like any resource
    SecurityRule,
    PublicIp,
    NetworkInterface,
    VirtualMachine,
}

impl ResourceKind {
    /// All kinds, in the order they must be provisioned
    pub const ORDER: [ResourceKind; 8] = [
        ResourceKind::ResourceGroup,
        ResourceKind::VirtualNetwork,
        ResourceKind::Subnet,
        ResourceKind::SecurityGroup,
        ResourceKind::SecurityRule,
        ResourceKind::PublicIp,
        ResourceKind::NetworkInterface,
        ResourceKind::VirtualMachine,
    ];

    /// Kinds that must exist before this one can be created
    pub fn dependencies(&self) -> &'static [ResourceKind] {
        match self {
            ResourceKind::ResourceGroup => &[],
            ResourceKind::VirtualNetwork => &[ResourceKind::ResourceGroup],
            ResourceKind::Subnet => &[ResourceKind::VirtualNetwork],
            ResourceKind::SecurityGroup => &[ResourceKind::ResourceGroup],
            ResourceKind::SecurityRule => &[ResourceKind::SecurityGroup],
            ResourceKind::PublicIp => &[ResourceKind::ResourceGroup],
            ResourceKind::NetworkInterface => &[
                ResourceKind::Subnet,
                ResourceKind::SecurityGroup,
                ResourceKind::SecurityRule,
                ResourceKind::PublicIp,
            ],
            ResourceKind::VirtualMachine => &[ResourceKind::NetworkInterface],
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "Resource group",
            ResourceKind::VirtualNetwork => "Virtual network",
            ResourceKind::Subnet => "Subnet",
            ResourceKind::SecurityGroup => "Network security group",
            ResourceKind::SecurityRule => "Security rule",
            ResourceKind::PublicIp => "Public IP",
            ResourceKind::NetworkInterface => "Network interface",
            ResourceKind::VirtualMachine => "Virtual machine",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub id: String,
    pub name: String,
    pub address_prefixes: Vec<String>,
    pub subnets: Vec<Subnet>,
}

impl VirtualNetwork {
    /// Look up a subnet of this network by name
    pub fn subnet(&self, name: &str) -> Option<&Subnet> {
        self.subnets.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub address_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    /// Names of the security rules attached to the group
    pub rules: Vec<String>,
}

impl SecurityGroup {
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIp {
    pub id: String,
    pub name: String,
    /// Assigned address; absent until the provider allocates one
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    pub provisioning_state: Option<String>,
}
