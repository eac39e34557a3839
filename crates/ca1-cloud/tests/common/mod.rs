#![allow(dead_code)]

use async_trait::async_trait;
use ca1_cloud::topology::{
    NetworkSpec, NicSpec, PublicIpSpec, SecurityGroupSpec, SecurityRule, SubnetSpec, VmSpec,
};
use ca1_cloud::{
    AuthStatus, CloudError, CredentialSource, NetworkInterface, NicBindings, ProvisioningApi,
    PublicIp, ResourceGroup, ResourceKind, Result, SecurityGroup, Subnet, Topology,
    VirtualMachine, VirtualNetwork, VmLaunch,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tempfile::TempDir;

pub const FAKE_IP: &str = "20.100.0.4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    CheckAuth,
    Get,
    Create,
    Update,
    Delete,
}

/// One recorded provider call
#[derive(Debug, Clone)]
pub struct Call {
    pub op: Op,
    pub kind: Option<ResourceKind>,
    pub name: String,
    /// Kinds known to exist once this call returned
    pub confirms: Vec<ResourceKind>,
}

#[derive(Debug, Clone)]
pub struct CreatedVm {
    pub nic_id: String,
    pub username: String,
    pub password: String,
    pub custom_data: String,
}

#[derive(Default)]
struct FakeState {
    groups: HashMap<String, ResourceGroup>,
    networks: HashMap<String, VirtualNetwork>,
    security_groups: HashMap<String, SecurityGroup>,
    public_ips: HashMap<String, PublicIp>,
    nics: HashMap<String, NetworkInterface>,
    vms: HashMap<String, VirtualMachine>,
    nic_bindings: Option<NicBindings>,
    created_vm: Option<CreatedVm>,
}

pub enum AuthMode {
    Authenticated,
    NoSession,
    NotInstalled,
}

/// In-memory provider that records every call
pub struct FakeProvider {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<Call>>,
    fail_create: Mutex<HashSet<ResourceKind>>,
    auth: AuthMode,
}

fn fake_id(group: &str, kind: &str, name: &str) -> String {
    format!(
        "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/{}/providers/{}/{}",
        group, kind, name
    )
}

impl FakeProvider {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            calls: Mutex::new(Vec::new()),
            fail_create: Mutex::new(HashSet::new()),
            auth: AuthMode::Authenticated,
        }
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    /// Every resource of `topology` already exists
    pub fn fully_provisioned(topology: &Topology) -> Self {
        let provider = Self::empty();
        provider.seed_group(topology);
        provider.seed_network(topology, true);
        provider.seed_security_group(topology);
        provider.seed_public_ip(topology);
        provider.seed_nic(topology);
        provider.seed_vm(topology);
        provider
    }

    pub fn seed_group(&self, topology: &Topology) {
        let group = &topology.resource_group;
        self.state.lock().unwrap().groups.insert(
            group.clone(),
            ResourceGroup {
                id: format!("/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/{}", group),
                name: group.clone(),
                location: topology.location.clone(),
            },
        );
    }

    pub fn seed_network(&self, topology: &Topology, with_subnet: bool) {
        let network = build_network(
            &topology.resource_group,
            &topology.network,
            with_subnet.then_some(&topology.subnet),
        );
        self.state
            .lock()
            .unwrap()
            .networks
            .insert(network.name.clone(), network);
    }

    /// Security group with every rule of `topology`
    pub fn seed_security_group(&self, topology: &Topology) {
        let mut nsg = build_security_group(&topology.resource_group, &topology.security_group);
        nsg.rules = topology
            .security_group
            .rules
            .iter()
            .map(|r| r.name.clone())
            .collect();
        self.state
            .lock()
            .unwrap()
            .security_groups
            .insert(nsg.name.clone(), nsg);
    }

    /// Security group holding only the named rules, as an interrupted run leaves it
    pub fn seed_security_group_with_rules(&self, topology: &Topology, rules: &[&str]) {
        let mut nsg = build_security_group(&topology.resource_group, &topology.security_group);
        nsg.rules = rules.iter().map(|r| r.to_string()).collect();
        self.state
            .lock()
            .unwrap()
            .security_groups
            .insert(nsg.name.clone(), nsg);
    }

    pub fn seed_public_ip(&self, topology: &Topology) {
        let ip = build_public_ip(&topology.resource_group, &topology.public_ip.name);
        self.state
            .lock()
            .unwrap()
            .public_ips
            .insert(ip.name.clone(), ip);
    }

    pub fn seed_nic(&self, topology: &Topology) {
        let name = &topology.nic.name;
        self.state.lock().unwrap().nics.insert(
            name.clone(),
            NetworkInterface {
                id: fake_id(
                    &topology.resource_group,
                    "Microsoft.Network/networkInterfaces",
                    name,
                ),
                name: name.clone(),
            },
        );
    }

    pub fn seed_vm(&self, topology: &Topology) {
        let name = &topology.vm.name;
        self.state.lock().unwrap().vms.insert(
            name.clone(),
            VirtualMachine {
                id: fake_id(
                    &topology.resource_group,
                    "Microsoft.Compute/virtualMachines",
                    name,
                ),
                name: name.clone(),
                provisioning_state: Some("Succeeded".to_string()),
            },
        );
    }

    /// Make the create call for `kind` fail
    pub fn fail_create_of(&self, kind: ResourceKind) {
        self.fail_create.lock().unwrap().insert(kind);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Create and update calls, in order
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c.op, Op::Create | Op::Update | Op::Delete))
            .collect()
    }

    pub fn count(&self, op: Op, kind: ResourceKind) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.op == op && c.kind == Some(kind))
            .count()
    }

    pub fn nic_bindings(&self) -> Option<NicBindings> {
        self.state.lock().unwrap().nic_bindings.clone()
    }

    pub fn created_vm(&self) -> Option<CreatedVm> {
        self.state.lock().unwrap().created_vm.clone()
    }

    pub fn security_group(&self, name: &str) -> Option<SecurityGroup> {
        self.state.lock().unwrap().security_groups.get(name).cloned()
    }

    pub fn network(&self, name: &str) -> Option<VirtualNetwork> {
        self.state.lock().unwrap().networks.get(name).cloned()
    }

    pub fn group_exists(&self, name: &str) -> bool {
        self.state.lock().unwrap().groups.contains_key(name)
    }

    fn record(&self, op: Op, kind: Option<ResourceKind>, name: &str, confirms: Vec<ResourceKind>) {
        self.calls.lock().unwrap().push(Call {
            op,
            kind,
            name: name.to_string(),
            confirms,
        });
    }

    fn check_failure(&self, kind: ResourceKind) -> Result<()> {
        if self.fail_create.lock().unwrap().contains(&kind) {
            return Err(CloudError::ApiError(format!(
                "simulated failure creating {}",
                kind
            )));
        }
        Ok(())
    }

    fn record_get<T>(&self, kind: ResourceKind, name: &str, found: Option<T>) -> Option<T> {
        let confirms = if found.is_some() { vec![kind] } else { vec![] };
        self.record(Op::Get, Some(kind), name, confirms);
        found
    }
}

fn build_network(group: &str, spec: &NetworkSpec, subnet: Option<&SubnetSpec>) -> VirtualNetwork {
    let id = fake_id(group, "Microsoft.Network/virtualNetworks", &spec.name);
    VirtualNetwork {
        id: id.clone(),
        name: spec.name.clone(),
        address_prefixes: vec![spec.address_prefix.clone()],
        subnets: subnet
            .map(|s| build_subnet(&id, s))
            .into_iter()
            .collect(),
    }
}

fn build_subnet(network_id: &str, spec: &SubnetSpec) -> Subnet {
    Subnet {
        id: format!("{}/subnets/{}", network_id, spec.name),
        name: spec.name.clone(),
        address_prefix: Some(spec.address_prefix.clone()),
    }
}

/// A new security group has no rules yet
fn build_security_group(group: &str, spec: &SecurityGroupSpec) -> SecurityGroup {
    SecurityGroup {
        id: fake_id(group, "Microsoft.Network/networkSecurityGroups", &spec.name),
        name: spec.name.clone(),
        rules: Vec::new(),
    }
}

fn build_public_ip(group: &str, name: &str) -> PublicIp {
    PublicIp {
        id: fake_id(group, "Microsoft.Network/publicIPAddresses", name),
        name: name.to_string(),
        ip_address: Some(FAKE_IP.to_string()),
    }
}

#[async_trait]
impl ProvisioningApi for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        self.record(Op::CheckAuth, None, "", vec![]);
        match self.auth {
            AuthMode::Authenticated => Ok(AuthStatus::ok("Fake Subscription (0000)")),
            AuthMode::NoSession => Ok(AuthStatus::failed("Please run 'az login' to setup account.")),
            AuthMode::NotInstalled => Err(CloudError::ClientNotInstalled {
                client: "az".to_string(),
                install_hint: "https://aka.ms/installazurecli".to_string(),
            }),
        }
    }

    async fn get_resource_group(&self, name: &str) -> Result<Option<ResourceGroup>> {
        let found = self.state.lock().unwrap().groups.get(name).cloned();
        Ok(self.record_get(ResourceKind::ResourceGroup, name, found))
    }

    async fn create_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        self.record(Op::Create, Some(ResourceKind::ResourceGroup), name, vec![]);
        self.check_failure(ResourceKind::ResourceGroup)?;
        let group = ResourceGroup {
            id: format!("/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/{}", name),
            name: name.to_string(),
            location: location.to_string(),
        };
        self.state
            .lock()
            .unwrap()
            .groups
            .insert(name.to_string(), group.clone());
        self.calls.lock().unwrap().last_mut().unwrap().confirms = vec![ResourceKind::ResourceGroup];
        Ok(group)
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        self.record(Op::Delete, Some(ResourceKind::ResourceGroup), name, vec![]);
        let mut state = self.state.lock().unwrap();
        if state.groups.remove(name).is_none() {
            return Err(CloudError::ApiError(format!(
                "Resource group '{}' could not be found.",
                name
            )));
        }
        *state = FakeState::default();
        Ok(())
    }

    async fn get_virtual_network(
        &self,
        _group: &str,
        name: &str,
    ) -> Result<Option<VirtualNetwork>> {
        let found = self.state.lock().unwrap().networks.get(name).cloned();
        let mut confirms = Vec::new();
        if let Some(network) = &found {
            confirms.push(ResourceKind::VirtualNetwork);
            if !network.subnets.is_empty() {
                confirms.push(ResourceKind::Subnet);
            }
        }
        self.record(Op::Get, Some(ResourceKind::VirtualNetwork), name, confirms);
        Ok(found)
    }

    async fn create_virtual_network(
        &self,
        group: &str,
        _location: &str,
        network: &NetworkSpec,
        subnet: &SubnetSpec,
    ) -> Result<VirtualNetwork> {
        self.record(
            Op::Create,
            Some(ResourceKind::VirtualNetwork),
            &network.name,
            vec![],
        );
        self.check_failure(ResourceKind::VirtualNetwork)?;
        let created = build_network(group, network, Some(subnet));
        self.state
            .lock()
            .unwrap()
            .networks
            .insert(created.name.clone(), created.clone());
        self.calls.lock().unwrap().last_mut().unwrap().confirms =
            vec![ResourceKind::VirtualNetwork, ResourceKind::Subnet];
        Ok(created)
    }

    async fn add_subnet(
        &self,
        _group: &str,
        network: &VirtualNetwork,
        subnet: &SubnetSpec,
    ) -> Result<Subnet> {
        self.record(Op::Update, Some(ResourceKind::Subnet), &subnet.name, vec![]);
        let created = build_subnet(&network.id, subnet);
        let mut state = self.state.lock().unwrap();
        let stored = state.networks.get_mut(&network.name).ok_or_else(|| {
            CloudError::ApiError(format!("network {} not found", network.name))
        })?;
        stored.subnets.push(created.clone());
        drop(state);
        self.calls.lock().unwrap().last_mut().unwrap().confirms = vec![ResourceKind::Subnet];
        Ok(created)
    }

    async fn get_security_group(&self, _group: &str, name: &str) -> Result<Option<SecurityGroup>> {
        let found = self.state.lock().unwrap().security_groups.get(name).cloned();
        let mut confirms = Vec::new();
        if let Some(nsg) = &found {
            confirms.push(ResourceKind::SecurityGroup);
            if !nsg.rules.is_empty() {
                confirms.push(ResourceKind::SecurityRule);
            }
        }
        self.record(Op::Get, Some(ResourceKind::SecurityGroup), name, confirms);
        Ok(found)
    }

    async fn create_security_group(
        &self,
        group: &str,
        _location: &str,
        spec: &SecurityGroupSpec,
    ) -> Result<SecurityGroup> {
        self.record(
            Op::Create,
            Some(ResourceKind::SecurityGroup),
            &spec.name,
            vec![],
        );
        self.check_failure(ResourceKind::SecurityGroup)?;
        let nsg = build_security_group(group, spec);
        self.state
            .lock()
            .unwrap()
            .security_groups
            .insert(nsg.name.clone(), nsg.clone());
        self.calls.lock().unwrap().last_mut().unwrap().confirms = vec![ResourceKind::SecurityGroup];
        Ok(nsg)
    }

    async fn create_security_rule(
        &self,
        _group: &str,
        security_group: &str,
        rule: &SecurityRule,
    ) -> Result<String> {
        self.record(Op::Create, Some(ResourceKind::SecurityRule), &rule.name, vec![]);
        self.check_failure(ResourceKind::SecurityRule)?;
        let mut state = self.state.lock().unwrap();
        let nsg = state.security_groups.get_mut(security_group).ok_or_else(|| {
            CloudError::ApiError(format!("security group {} not found", security_group))
        })?;
        nsg.rules.push(rule.name.clone());
        drop(state);
        self.calls.lock().unwrap().last_mut().unwrap().confirms = vec![ResourceKind::SecurityRule];
        Ok(rule.name.clone())
    }

    async fn get_public_ip(&self, _group: &str, name: &str) -> Result<Option<PublicIp>> {
        let found = self.state.lock().unwrap().public_ips.get(name).cloned();
        Ok(self.record_get(ResourceKind::PublicIp, name, found))
    }

    async fn create_public_ip(
        &self,
        group: &str,
        _location: &str,
        spec: &PublicIpSpec,
    ) -> Result<PublicIp> {
        self.record(Op::Create, Some(ResourceKind::PublicIp), &spec.name, vec![]);
        self.check_failure(ResourceKind::PublicIp)?;
        let ip = build_public_ip(group, &spec.name);
        self.state
            .lock()
            .unwrap()
            .public_ips
            .insert(ip.name.clone(), ip.clone());
        self.calls.lock().unwrap().last_mut().unwrap().confirms = vec![ResourceKind::PublicIp];
        Ok(ip)
    }

    async fn get_network_interface(
        &self,
        _group: &str,
        name: &str,
    ) -> Result<Option<NetworkInterface>> {
        let found = self.state.lock().unwrap().nics.get(name).cloned();
        Ok(self.record_get(ResourceKind::NetworkInterface, name, found))
    }

    async fn create_network_interface(
        &self,
        group: &str,
        _location: &str,
        spec: &NicSpec,
        bindings: &NicBindings,
    ) -> Result<NetworkInterface> {
        self.record(
            Op::Create,
            Some(ResourceKind::NetworkInterface),
            &spec.name,
            vec![],
        );
        self.check_failure(ResourceKind::NetworkInterface)?;
        let nic = NetworkInterface {
            id: fake_id(group, "Microsoft.Network/networkInterfaces", &spec.name),
            name: spec.name.clone(),
        };
        let mut state = self.state.lock().unwrap();
        state.nics.insert(nic.name.clone(), nic.clone());
        state.nic_bindings = Some(bindings.clone());
        drop(state);
        self.calls.lock().unwrap().last_mut().unwrap().confirms =
            vec![ResourceKind::NetworkInterface];
        Ok(nic)
    }

    async fn get_virtual_machine(
        &self,
        _group: &str,
        name: &str,
    ) -> Result<Option<VirtualMachine>> {
        let found = self.state.lock().unwrap().vms.get(name).cloned();
        Ok(self.record_get(ResourceKind::VirtualMachine, name, found))
    }

    async fn create_virtual_machine(
        &self,
        group: &str,
        _location: &str,
        spec: &VmSpec,
        launch: &VmLaunch<'_>,
    ) -> Result<VirtualMachine> {
        self.record(
            Op::Create,
            Some(ResourceKind::VirtualMachine),
            &spec.name,
            vec![],
        );
        self.check_failure(ResourceKind::VirtualMachine)?;
        let vm = VirtualMachine {
            id: fake_id(group, "Microsoft.Compute/virtualMachines", &spec.name),
            name: spec.name.clone(),
            provisioning_state: Some("Succeeded".to_string()),
        };
        let mut state = self.state.lock().unwrap();
        state.vms.insert(vm.name.clone(), vm.clone());
        state.created_vm = Some(CreatedVm {
            nic_id: launch.nic_id.to_string(),
            username: launch.credential.username.clone(),
            password: launch.credential.password().to_string(),
            custom_data: launch.custom_data.encoded().to_string(),
        });
        drop(state);
        self.calls.lock().unwrap().last_mut().unwrap().confirms =
            vec![ResourceKind::VirtualMachine];
        Ok(vm)
    }
}

/// Panics if any create or update ran before its dependencies were confirmed
pub fn assert_dependency_order(calls: &[Call]) {
    let mut confirmed: HashSet<ResourceKind> = HashSet::new();
    for call in calls {
        if matches!(call.op, Op::Create | Op::Update)
            && let Some(kind) = call.kind
        {
            for dep in kind.dependencies() {
                assert!(
                    confirmed.contains(dep),
                    "{} {} was changed before {} was confirmed",
                    kind,
                    call.name,
                    dep
                );
            }
        }
        confirmed.extend(call.confirms.iter().copied());
    }
}

/// Counts how often the password was requested
pub struct CountingCredentials {
    password: String,
    requests: Mutex<usize>,
}

impl CountingCredentials {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            requests: Mutex::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

impl CredentialSource for CountingCredentials {
    fn admin_password(&self, _username: &str) -> Result<String> {
        *self.requests.lock().unwrap() += 1;
        Ok(self.password.clone())
    }
}

/// Working directory holding a `vm_init.yml`
pub struct BootstrapDir {
    pub dir: TempDir,
}

impl BootstrapDir {
    pub fn with_file(content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vm_init.yml"), content).unwrap();
        Self { dir }
    }

    pub fn without_file() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn source(&self) -> ca1_cloud::BootstrapSource {
        ca1_cloud::BootstrapSource::in_dir(self.dir.path())
    }
}
