//! Azure provider implementation

use crate::az::{
    AzCli, CreateNicConfig, CreateVnetConfig, GroupInfo, NicInfo, NsgInfo, PublicIpInfo,
    SubnetInfo, VM_API_VERSION, VmInfo, VnetInfo,
};
use crate::error::{AzureError, INSTALL_HINT};
use async_trait::async_trait;
use ca1_cloud::topology::{
    NetworkSpec, NicSpec, PublicIpSpec, SecurityGroupSpec, SecurityRule, SubnetSpec, VmSpec,
};
use ca1_cloud::{
    AuthStatus, CloudError, NetworkInterface, NicBindings, ProvisioningApi, PublicIp,
    ResourceGroup, SecurityGroup, Subnet, VirtualMachine, VirtualNetwork, VmLaunch,
};
use std::io::Write;

const ARM_ENDPOINT: &str = "https://management.azure.com";

/// Azure provider backed by the `az` CLI
pub struct AzureProvider {
    az: AzCli,
}

impl AzureProvider {
    pub fn new() -> Self {
        Self { az: AzCli::new() }
    }

    pub fn with_cli(az: AzCli) -> Self {
        Self { az }
    }
}

impl Default for AzureProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProvisioningApi for AzureProvider {
    fn name(&self) -> &str {
        "azure"
    }

    async fn check_auth(&self) -> ca1_cloud::Result<AuthStatus> {
        if !self.az.is_installed().await {
            return Err(CloudError::ClientNotInstalled {
                client: format!("Azure CLI ({})", self.az.program()),
                install_hint: INSTALL_HINT.to_string(),
            });
        }

        match self.az.account_show().await {
            Ok(account) => {
                let user = account
                    .user
                    .map(|u| format!(" as {}", u.name))
                    .unwrap_or_default();
                Ok(AuthStatus::ok(format!(
                    "{} ({}){}",
                    account.name, account.id, user
                )))
            }
            Err(AzureError::CommandFailed { stderr, .. }) => Ok(AuthStatus::failed(
                if stderr.is_empty() {
                    "Please run 'az login' to setup account".to_string()
                } else {
                    stderr
                },
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_resource_group(&self, name: &str) -> ca1_cloud::Result<Option<ResourceGroup>> {
        Ok(self.az.group_show(name).await?.map(Into::into))
    }

    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> ca1_cloud::Result<ResourceGroup> {
        tracing::info!("Creating resource group {} in {}", name, location);
        Ok(self.az.group_create(name, location).await?.into())
    }

    async fn delete_resource_group(&self, name: &str) -> ca1_cloud::Result<()> {
        tracing::info!("Deleting resource group {}", name);
        self.az.group_delete(name).await?;
        Ok(())
    }

    async fn get_virtual_network(
        &self,
        group: &str,
        name: &str,
    ) -> ca1_cloud::Result<Option<VirtualNetwork>> {
        Ok(self.az.vnet_show(group, name).await?.map(Into::into))
    }

    async fn create_virtual_network(
        &self,
        group: &str,
        location: &str,
        network: &NetworkSpec,
        subnet: &SubnetSpec,
    ) -> ca1_cloud::Result<VirtualNetwork> {
        let config = CreateVnetConfig {
            group,
            name: &network.name,
            location,
            address_prefix: &network.address_prefix,
            subnet_name: &subnet.name,
            subnet_prefix: &subnet.address_prefix,
        };
        Ok(self.az.vnet_create(&config).await?.into())
    }

    async fn add_subnet(
        &self,
        group: &str,
        network: &VirtualNetwork,
        subnet: &SubnetSpec,
    ) -> ca1_cloud::Result<Subnet> {
        let created = self
            .az
            .subnet_create(group, &network.name, &subnet.name, &subnet.address_prefix)
            .await?;
        Ok(created.into())
    }

    async fn get_security_group(
        &self,
        group: &str,
        name: &str,
    ) -> ca1_cloud::Result<Option<SecurityGroup>> {
        Ok(self.az.nsg_show(group, name).await?.map(Into::into))
    }

    async fn create_security_group(
        &self,
        group: &str,
        location: &str,
        spec: &SecurityGroupSpec,
    ) -> ca1_cloud::Result<SecurityGroup> {
        Ok(self.az.nsg_create(group, &spec.name, location).await?.into())
    }

    async fn create_security_rule(
        &self,
        group: &str,
        security_group: &str,
        rule: &SecurityRule,
    ) -> ca1_cloud::Result<String> {
        tracing::debug!(
            "Adding rule {} to {} ({} {}/{})",
            rule.name,
            security_group,
            rule.priority,
            rule.protocol.as_str(),
            rule.destination_port
        );
        let created = self.az.nsg_rule_create(group, security_group, rule).await?;
        Ok(created.name)
    }

    async fn get_public_ip(&self, group: &str, name: &str) -> ca1_cloud::Result<Option<PublicIp>> {
        Ok(self.az.public_ip_show(group, name).await?.map(Into::into))
    }

    async fn create_public_ip(
        &self,
        group: &str,
        location: &str,
        spec: &PublicIpSpec,
    ) -> ca1_cloud::Result<PublicIp> {
        let ip = self
            .az
            .public_ip_create(group, &spec.name, location, spec.sku, spec.allocation)
            .await?;
        Ok(ip.into())
    }

    async fn get_network_interface(
        &self,
        group: &str,
        name: &str,
    ) -> ca1_cloud::Result<Option<NetworkInterface>> {
        Ok(self.az.nic_show(group, name).await?.map(Into::into))
    }

    async fn create_network_interface(
        &self,
        group: &str,
        location: &str,
        spec: &NicSpec,
        bindings: &NicBindings,
    ) -> ca1_cloud::Result<NetworkInterface> {
        let config = CreateNicConfig {
            group,
            name: &spec.name,
            location,
            subnet_id: &bindings.subnet_id,
            nsg_id: &bindings.security_group_id,
            public_ip_id: &bindings.public_ip_id,
        };
        Ok(self.az.nic_create(&config).await?.into())
    }

    async fn get_virtual_machine(
        &self,
        group: &str,
        name: &str,
    ) -> ca1_cloud::Result<Option<VirtualMachine>> {
        Ok(self.az.vm_show(group, name).await?.map(Into::into))
    }

    async fn create_virtual_machine(
        &self,
        group: &str,
        location: &str,
        spec: &VmSpec,
        launch: &VmLaunch<'_>,
    ) -> ca1_cloud::Result<VirtualMachine> {
        let vm_id = vm_resource_id(launch.nic_id, &spec.name)?;
        let url = format!("{}{}?api-version={}", ARM_ENDPOINT, vm_id, VM_API_VERSION);

        // The body carries the admin password; keep it out of argv.
        let body = vm_request_body(location, spec, launch).to_string();
        let file = tokio::task::spawn_blocking(move || write_private_file(&body))
            .await
            .map_err(|e| CloudError::Io(std::io::Error::other(e)))??;

        tracing::info!("Creating VM {} ({})", spec.name, spec.size);
        self.az.rest_put(&url, file.path()).await?;
        drop(file);

        self.az.vm_wait_created(group, &spec.name).await?;

        match self.az.vm_show(group, &spec.name).await? {
            Some(vm) => Ok(vm.into()),
            None => Err(AzureError::NotFound(format!("VM {}", spec.name)).into()),
        }
    }
}

/// Temp file readable only by the current user, removed on drop
fn write_private_file(contents: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Derive the VM's ARM id from the NIC it attaches to
fn vm_resource_id(nic_id: &str, vm_name: &str) -> ca1_cloud::Result<String> {
    let (group_scope, _) = nic_id.split_once("/providers/").ok_or_else(|| {
        CloudError::InvalidResponse(format!("unexpected network interface id: {}", nic_id))
    })?;
    Ok(format!(
        "{}/providers/Microsoft.Compute/virtualMachines/{}",
        group_scope, vm_name
    ))
}

/// ARM request body for a password-authenticated Linux VM
fn vm_request_body(location: &str, spec: &VmSpec, launch: &VmLaunch<'_>) -> serde_json::Value {
    serde_json::json!({
        "location": location,
        "properties": {
            "hardwareProfile": { "vmSize": spec.size },
            "storageProfile": {
                "imageReference": {
                    "publisher": spec.image.publisher,
                    "offer": spec.image.offer,
                    "sku": spec.image.sku,
                    "version": spec.image.version,
                },
                "osDisk": {
                    "createOption": "FromImage",
                    "managedDisk": { "storageAccountType": "Standard_LRS" },
                },
            },
            "osProfile": {
                "computerName": spec.name,
                "adminUsername": launch.credential.username,
                "adminPassword": launch.credential.password(),
                "customData": launch.custom_data.encoded(),
                "linuxConfiguration": { "disablePasswordAuthentication": false },
            },
            "networkProfile": {
                "networkInterfaces": [
                    { "id": launch.nic_id, "properties": { "primary": true } }
                ],
            },
        },
    })
}

impl From<GroupInfo> for ResourceGroup {
    fn from(info: GroupInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            location: info.location,
        }
    }
}

impl From<SubnetInfo> for Subnet {
    fn from(info: SubnetInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            address_prefix: info.address_prefix,
        }
    }
}

impl From<VnetInfo> for VirtualNetwork {
    fn from(info: VnetInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            address_prefixes: info
                .address_space
                .map(|space| space.address_prefixes)
                .unwrap_or_default(),
            subnets: info.subnets.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<NsgInfo> for SecurityGroup {
    fn from(info: NsgInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            rules: info.security_rules.into_iter().map(|r| r.name).collect(),
        }
    }
}

impl From<PublicIpInfo> for PublicIp {
    fn from(info: PublicIpInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            ip_address: info.ip_address,
        }
    }
}

impl From<NicInfo> for NetworkInterface {
    fn from(info: NicInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
        }
    }
}

impl From<VmInfo> for VirtualMachine {
    fn from(info: VmInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            provisioning_state: info.provisioning_state,
        }
    }
}
