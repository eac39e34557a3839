//! Provisioning reconciler
//!
//! Walks the topology in dependency order, creating only what is missing:
//!
//! ```text
//! group → network (+subnet) → subnet repair → security group → rules → public IP → NIC → VM
//! ```
//!
//! An existing VM means an earlier run completed, so the walk stops right
//! after the group and only the public IP is looked up.

use crate::bootstrap::BootstrapSource;
use crate::credential::CredentialSource;
use crate::ensure::{Ensured, ensure};
use crate::error::{CloudError, Result};
use crate::model::{ResourceKind, Subnet, VirtualNetwork};
use crate::provider::{NicBindings, ProvisioningApi, VmLaunch};
use crate::report::{
    NoopObserver, ProvisionEvent, ProvisionObserver, ProvisionOutcome, ProvisionReport,
    StepAction,
};
use crate::topology::Topology;
use std::time::Instant;

pub struct Provisioner<'a> {
    provider: &'a dyn ProvisioningApi,
    observer: &'a dyn ProvisionObserver,
}

impl<'a> Provisioner<'a> {
    pub fn new(provider: &'a dyn ProvisioningApi) -> Self {
        Self {
            provider,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn ProvisionObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Bring the provider in line with `topology`
    ///
    /// The bootstrap file is read and the credential requested only when the
    /// VM is about to be created. The first provider error aborts the run.
    pub async fn provision(
        &self,
        topology: &Topology,
        bootstrap: &BootstrapSource,
        credentials: &dyn CredentialSource,
    ) -> Result<ProvisionReport> {
        let start = Instant::now();
        let provider = self.provider;
        let group = topology.resource_group.as_str();
        let location = topology.location.as_str();

        let mut report =
            ProvisionReport::new(ProvisionOutcome::Provisioned, &topology.vm.admin_username);

        let resource_group = ensure(
            ResourceKind::ResourceGroup,
            group,
            self.observer,
            || provider.get_resource_group(group),
            || provider.create_resource_group(group, location),
        )
        .await?;
        report.record(ResourceKind::ResourceGroup, group, resource_group.action());

        // A freshly created group cannot contain the VM yet.
        if !resource_group.was_created()
            && let Some(vm) = provider
                .get_virtual_machine(group, &topology.vm.name)
                .await?
        {
            tracing::info!("VM {} already exists, nothing to provision", vm.name);
            self.observer
                .on_event(&ProvisionEvent::ShortCircuit { vm: vm.name.clone() });
            report.outcome = ProvisionOutcome::AlreadyProvisioned;
            report.record(ResourceKind::VirtualMachine, vm.name, StepAction::Reused);
            report.public_ip = provider
                .get_public_ip(group, &topology.public_ip.name)
                .await?
                .and_then(|ip| ip.ip_address);
            report.duration_ms = start.elapsed().as_millis() as u64;
            return Ok(report);
        }

        let network = ensure(
            ResourceKind::VirtualNetwork,
            &topology.network.name,
            self.observer,
            || provider.get_virtual_network(group, &topology.network.name),
            || {
                provider.create_virtual_network(
                    group,
                    location,
                    &topology.network,
                    &topology.subnet,
                )
            },
        )
        .await?;
        report.record(
            ResourceKind::VirtualNetwork,
            &topology.network.name,
            network.action(),
        );

        let (subnet, subnet_action) = self.reconcile_subnet(topology, &network).await?;
        report.record(ResourceKind::Subnet, &subnet.name, subnet_action);

        let security_group = ensure(
            ResourceKind::SecurityGroup,
            &topology.security_group.name,
            self.observer,
            || provider.get_security_group(group, &topology.security_group.name),
            || provider.create_security_group(group, location, &topology.security_group),
        )
        .await?;
        report.record(
            ResourceKind::SecurityGroup,
            &topology.security_group.name,
            security_group.action(),
        );

        // Rules are checked against the group as observed; an interrupted run
        // can leave the group without some of them.
        for rule in &topology.security_group.rules {
            let rule_name = rule.name.as_str();
            let present = security_group.get().has_rule(rule_name);
            let ensured = ensure(
                ResourceKind::SecurityRule,
                rule_name,
                self.observer,
                || {
                    std::future::ready(Ok::<_, CloudError>(
                        present.then(|| rule_name.to_string()),
                    ))
                },
                || provider.create_security_rule(group, &topology.security_group.name, rule),
            )
            .await?;
            report.record(ResourceKind::SecurityRule, rule_name, ensured.action());
        }

        let public_ip = ensure(
            ResourceKind::PublicIp,
            &topology.public_ip.name,
            self.observer,
            || provider.get_public_ip(group, &topology.public_ip.name),
            || provider.create_public_ip(group, location, &topology.public_ip),
        )
        .await?;
        report.record(
            ResourceKind::PublicIp,
            &topology.public_ip.name,
            public_ip.action(),
        );

        let bindings = NicBindings {
            subnet_id: subnet.id.clone(),
            security_group_id: security_group.get().id.clone(),
            public_ip_id: public_ip.get().id.clone(),
        };
        let nic = ensure(
            ResourceKind::NetworkInterface,
            &topology.nic.name,
            self.observer,
            || provider.get_network_interface(group, &topology.nic.name),
            || provider.create_network_interface(group, location, &topology.nic, &bindings),
        )
        .await?;
        report.record(ResourceKind::NetworkInterface, &topology.nic.name, nic.action());
        let nic = nic.into_inner();

        let payload = bootstrap.load().await?;
        let credential = credentials.admin_credential(&topology.vm.admin_username)?;

        self.observer.on_event(&ProvisionEvent::Creating {
            kind: ResourceKind::VirtualMachine,
            name: topology.vm.name.clone(),
        });
        let vm = provider
            .create_virtual_machine(
                group,
                location,
                &topology.vm,
                &VmLaunch {
                    nic_id: &nic.id,
                    credential: &credential,
                    custom_data: &payload,
                },
            )
            .await?;
        self.observer.on_event(&ProvisionEvent::Created {
            kind: ResourceKind::VirtualMachine,
            name: vm.name.clone(),
        });
        report.record(ResourceKind::VirtualMachine, vm.name, StepAction::Created);

        report.public_ip = match public_ip.into_inner().ip_address {
            Some(ip) => Some(ip),
            None => provider
                .get_public_ip(group, &topology.public_ip.name)
                .await?
                .and_then(|ip| ip.ip_address),
        };
        report.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!("Provisioning finished: {}", report.summary());
        Ok(report)
    }

    /// The subnet is checked even when the network already existed; an
    /// interrupted run can leave the network without it.
    async fn reconcile_subnet(
        &self,
        topology: &Topology,
        network: &Ensured<VirtualNetwork>,
    ) -> Result<(Subnet, StepAction)> {
        let name = topology.subnet.name.as_str();
        self.observer.on_event(&ProvisionEvent::Checking {
            kind: ResourceKind::Subnet,
            name: name.to_string(),
        });

        if let Some(subnet) = network.get().subnet(name) {
            let action = if network.was_created() {
                self.observer.on_event(&ProvisionEvent::Created {
                    kind: ResourceKind::Subnet,
                    name: name.to_string(),
                });
                StepAction::Created
            } else {
                tracing::info!("Subnet {} already exists, reusing", name);
                self.observer.on_event(&ProvisionEvent::Reusing {
                    kind: ResourceKind::Subnet,
                    name: name.to_string(),
                });
                StepAction::Reused
            };
            return Ok((subnet.clone(), action));
        }

        tracing::warn!(
            "Network {} has no subnet {}, adding it",
            network.get().name,
            name
        );
        self.observer.on_event(&ProvisionEvent::Repairing {
            kind: ResourceKind::Subnet,
            name: name.to_string(),
            parent: network.get().name.clone(),
        });
        let subnet = self
            .provider
            .add_subnet(&topology.resource_group, network.get(), &topology.subnet)
            .await?;
        Ok((subnet, StepAction::Repaired))
    }
}
