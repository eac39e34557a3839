//! Read-only inspection of the topology

use crate::error::Result;
use crate::model::ResourceKind;
use crate::provider::ProvisioningApi;
use crate::topology::Topology;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub kind: ResourceKind,
    pub name: String,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub entries: Vec<StatusEntry>,
    pub public_ip: Option<String>,
}

impl StatusReport {
    pub fn is_present(&self, kind: ResourceKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind && e.present)
    }

    /// Every resource exists
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.present)
    }

    pub fn missing(&self) -> Vec<&StatusEntry> {
        self.entries.iter().filter(|e| !e.present).collect()
    }
}

/// Query every resource of `topology` without changing anything
///
/// Resources inside a missing group are reported missing without a query.
/// Security rules are read from their group, one entry per rule.
pub async fn inspect(provider: &dyn ProvisioningApi, topology: &Topology) -> Result<StatusReport> {
    let group = topology.resource_group.as_str();
    let entry = |kind: ResourceKind, name: &str, present: bool| StatusEntry {
        kind,
        name: name.to_string(),
        present,
    };

    let mut entries = Vec::new();
    let group_present = provider.get_resource_group(group).await?.is_some();
    entries.push(entry(ResourceKind::ResourceGroup, group, group_present));

    if !group_present {
        entries.push(entry(ResourceKind::VirtualNetwork, &topology.network.name, false));
        entries.push(entry(ResourceKind::Subnet, &topology.subnet.name, false));
        entries.push(entry(
            ResourceKind::SecurityGroup,
            &topology.security_group.name,
            false,
        ));
        for rule in &topology.security_group.rules {
            entries.push(entry(ResourceKind::SecurityRule, &rule.name, false));
        }
        entries.push(entry(ResourceKind::PublicIp, &topology.public_ip.name, false));
        entries.push(entry(ResourceKind::NetworkInterface, &topology.nic.name, false));
        entries.push(entry(ResourceKind::VirtualMachine, &topology.vm.name, false));
        return Ok(StatusReport {
            entries,
            public_ip: None,
        });
    }

    let network = provider
        .get_virtual_network(group, &topology.network.name)
        .await?;
    entries.push(entry(
        ResourceKind::VirtualNetwork,
        &topology.network.name,
        network.is_some(),
    ));
    entries.push(entry(
        ResourceKind::Subnet,
        &topology.subnet.name,
        network
            .as_ref()
            .is_some_and(|n| n.subnet(&topology.subnet.name).is_some()),
    ));

    let security_group = provider
        .get_security_group(group, &topology.security_group.name)
        .await?;
    entries.push(entry(
        ResourceKind::SecurityGroup,
        &topology.security_group.name,
        security_group.is_some(),
    ));
    for rule in &topology.security_group.rules {
        let present = security_group
            .as_ref()
            .is_some_and(|nsg| nsg.has_rule(&rule.name));
        entries.push(entry(ResourceKind::SecurityRule, &rule.name, present));
    }

    let public_ip = provider
        .get_public_ip(group, &topology.public_ip.name)
        .await?;
    entries.push(entry(
        ResourceKind::PublicIp,
        &topology.public_ip.name,
        public_ip.is_some(),
    ));
    let nic = provider
        .get_network_interface(group, &topology.nic.name)
        .await?;
    entries.push(entry(
        ResourceKind::NetworkInterface,
        &topology.nic.name,
        nic.is_some(),
    ));
    let vm = provider
        .get_virtual_machine(group, &topology.vm.name)
        .await?;
    entries.push(entry(
        ResourceKind::VirtualMachine,
        &topology.vm.name,
        vm.is_some(),
    ));

    Ok(StatusReport {
        entries,
        public_ip: public_ip.and_then(|ip| ip.ip_address),
    })
}
