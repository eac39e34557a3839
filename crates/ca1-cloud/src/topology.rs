//! Desired state of the CA1 environment
//!
//! One fixed topology: one network with one subnet, one security group with
//! inbound SSH and HTTP-8080 rules, one static public IP, one NIC and one
//! Linux VM. Names are constants; only the location and the admin username
//! vary between runs.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCATION: &str = "norwayeast";
pub const DEFAULT_ADMIN_USERNAME: &str = "ca1admin";

pub const RESOURCE_GROUP: &str = "ca1-rg";
pub const VIRTUAL_NETWORK: &str = "ca1-vnet";
pub const SUBNET: &str = "ca1-subnet";
pub const SECURITY_GROUP: &str = "ca1-nsg";
pub const PUBLIC_IP: &str = "ca1-pip";
pub const NETWORK_INTERFACE: &str = "ca1-nic";
pub const VIRTUAL_MACHINE: &str = "ca1-vm";

pub const NETWORK_ADDRESS_PREFIX: &str = "10.0.0.0/16";
pub const SUBNET_ADDRESS_PREFIX: &str = "10.0.1.0/24";

pub const VM_SIZE: &str = "Standard_B1s";

/// Bootstrap (cloud-init) file read from the working directory
pub const BOOTSTRAP_FILE: &str = "vm_init.yml";

pub const SSH_PORT: u16 = 22;
pub const HTTP_PORT: u16 = 8080;

/// Complete desired state handed to the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub location: String,
    pub resource_group: String,
    pub network: NetworkSpec,
    pub subnet: SubnetSpec,
    pub security_group: SecurityGroupSpec,
    pub public_ip: PublicIpSpec,
    pub nic: NicSpec,
    pub vm: VmSpec,
}

impl Topology {
    /// The CA1 assignment topology in `location`, administered by `admin_username`
    pub fn ca1(location: impl Into<String>, admin_username: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            resource_group: RESOURCE_GROUP.to_string(),
            network: NetworkSpec {
                name: VIRTUAL_NETWORK.to_string(),
                address_prefix: NETWORK_ADDRESS_PREFIX.to_string(),
            },
            subnet: SubnetSpec {
                name: SUBNET.to_string(),
                address_prefix: SUBNET_ADDRESS_PREFIX.to_string(),
            },
            security_group: SecurityGroupSpec {
                name: SECURITY_GROUP.to_string(),
                rules: vec![
                    SecurityRule::allow_inbound_tcp("allow-ssh", 1000, SSH_PORT),
                    SecurityRule::allow_inbound_tcp("allow-http-8080", 1010, HTTP_PORT),
                ],
            },
            public_ip: PublicIpSpec {
                name: PUBLIC_IP.to_string(),
                sku: PublicIpSku::Standard,
                allocation: IpAllocation::Static,
            },
            nic: NicSpec {
                name: NETWORK_INTERFACE.to_string(),
            },
            vm: VmSpec {
                name: VIRTUAL_MACHINE.to_string(),
                size: VM_SIZE.to_string(),
                image: ImageReference::ubuntu_jammy(),
                admin_username: admin_username.into(),
            },
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::ca1(DEFAULT_LOCATION, DEFAULT_ADMIN_USERNAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub address_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    pub address_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub name: String,
    pub rules: Vec<SecurityRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "Inbound",
            Direction::Outbound => "Outbound",
        }
    }
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Allow => "Allow",
            Access::Deny => "Deny",
        }
    }
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "Tcp",
            Protocol::Udp => "Udp",
        }
    }
}

/// A single security group rule, from any source address to any local address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub name: String,
    pub priority: u16,
    pub direction: Direction,
    pub access: Access,
    pub protocol: Protocol,
    pub destination_port: u16,
}

impl SecurityRule {
    pub fn allow_inbound_tcp(name: impl Into<String>, priority: u16, port: u16) -> Self {
        Self {
            name: name.into(),
            priority,
            direction: Direction::Inbound,
            access: Access::Allow,
            protocol: Protocol::Tcp,
            destination_port: port,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicIpSku {
    Basic,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAllocation {
    Dynamic,
    Static,
}

impl PublicIpSku {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicIpSku::Basic => "Basic",
            PublicIpSku::Standard => "Standard",
        }
    }
}

impl IpAllocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            IpAllocation::Dynamic => "Dynamic",
            IpAllocation::Static => "Static",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIpSpec {
    pub name: String,
    pub sku: PublicIpSku,
    pub allocation: IpAllocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicSpec {
    pub name: String,
}

/// Marketplace image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl ImageReference {
    pub fn ubuntu_jammy() -> Self {
        Self {
            publisher: "Canonical".to_string(),
            offer: "0001-com-ubuntu-server-jammy".to_string(),
            sku: "22_04-lts-gen2".to_string(),
            version: "latest".to_string(),
        }
    }

    /// `publisher:offer:sku:version`
    pub fn urn(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.publisher, self.offer, self.sku, self.version
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSpec {
    pub name: String,
    pub size: String,
    pub image: ImageReference,
    pub admin_username: String,
}
