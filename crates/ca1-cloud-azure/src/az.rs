//! az CLI wrapper
//!
//! Wraps the Azure CLI commands used to provision the CA1 environment. Every
//! command runs to completion before returning, so each call blocks until
//! Azure has finished the operation.

use crate::error::{AzureError, Result};
use ca1_cloud::topology::{IpAllocation, PublicIpSku, SecurityRule};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Environment variable overriding the `az` executable
pub const AZ_PATH_ENV: &str = "CA1_AZ_PATH";

/// Exit code `az ... show` uses when the resource does not exist
const EXIT_RESOURCE_NOT_FOUND: i32 = 3;

/// Compute resources deleted without waiting for a graceful shutdown
const FORCE_DELETION_TYPES: &str = "Microsoft.Compute/virtualMachines";

pub const VM_API_VERSION: &str = "2023-09-01";

/// az CLI wrapper
pub struct AzCli {
    program: String,
}

impl AzCli {
    /// Uses `$CA1_AZ_PATH` if set, otherwise `az` from `PATH`
    pub fn new() -> Self {
        let program = std::env::var(AZ_PATH_ENV).unwrap_or_else(|_| "az".to_string());
        Self { program }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check if az is installed
    pub async fn is_installed(&self) -> bool {
        Command::new(&self.program)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Current account; fails when no session is present
    pub async fn account_show(&self) -> Result<AccountInfo> {
        self.run_json(&["account", "show"]).await
    }

    /// Run an az command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.args(["--output", "json", "--only-show-errors"]);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, args.join(" "));

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AzureError::AzNotFound
            } else {
                AzureError::IoError(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureError::CommandFailed {
                command: command_label(args),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let output = self.run_command(args).await?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Run a `create` command whose result may be wrapped in an envelope
    async fn run_create<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let output = self.run_command(args).await?;
        let value: serde_json::Value = serde_json::from_str(&output)?;
        Ok(serde_json::from_value(unwrap_created(value)?)?)
    }

    /// Run a `show` command; a missing resource yields `None`
    async fn run_show<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Option<T>> {
        match self.run_command(args).await {
            Ok(output) => Ok(Some(serde_json::from_str(&output)?)),
            Err(err) if is_not_found(&err) => {
                tracing::debug!("{} reported not found", command_label(args));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    // ========== Resource Group Operations ==========

    pub async fn group_show(&self, name: &str) -> Result<Option<GroupInfo>> {
        self.run_show(&["group", "show", "--name", name]).await
    }

    pub async fn group_create(&self, name: &str, location: &str) -> Result<GroupInfo> {
        self.run_json(&["group", "create", "--name", name, "--location", location])
            .await
    }

    /// Delete the group and wait until Azure has removed it
    pub async fn group_delete(&self, name: &str) -> Result<()> {
        self.run_command(&[
            "group",
            "delete",
            "--name",
            name,
            "--yes",
            "--force-deletion-types",
            FORCE_DELETION_TYPES,
        ])
        .await?;
        Ok(())
    }

    // ========== Network Operations ==========

    pub async fn vnet_show(&self, group: &str, name: &str) -> Result<Option<VnetInfo>> {
        self.run_show(&[
            "network",
            "vnet",
            "show",
            "--resource-group",
            group,
            "--name",
            name,
        ])
        .await
    }

    pub async fn vnet_create(&self, config: &CreateVnetConfig<'_>) -> Result<VnetInfo> {
        self.run_create(&[
            "network",
            "vnet",
            "create",
            "--resource-group",
            config.group,
            "--name",
            config.name,
            "--location",
            config.location,
            "--address-prefixes",
            config.address_prefix,
            "--subnet-name",
            config.subnet_name,
            "--subnet-prefixes",
            config.subnet_prefix,
        ])
        .await
    }

    /// Add a subnet to an existing network
    pub async fn subnet_create(
        &self,
        group: &str,
        vnet: &str,
        name: &str,
        address_prefix: &str,
    ) -> Result<SubnetInfo> {
        self.run_create(&[
            "network",
            "vnet",
            "subnet",
            "create",
            "--resource-group",
            group,
            "--vnet-name",
            vnet,
            "--name",
            name,
            "--address-prefixes",
            address_prefix,
        ])
        .await
    }

    pub async fn nsg_show(&self, group: &str, name: &str) -> Result<Option<NsgInfo>> {
        self.run_show(&[
            "network",
            "nsg",
            "show",
            "--resource-group",
            group,
            "--name",
            name,
        ])
        .await
    }

    pub async fn nsg_create(&self, group: &str, name: &str, location: &str) -> Result<NsgInfo> {
        self.run_create(&[
            "network",
            "nsg",
            "create",
            "--resource-group",
            group,
            "--name",
            name,
            "--location",
            location,
        ])
        .await
    }

    pub async fn nsg_rule_create(
        &self,
        group: &str,
        nsg: &str,
        rule: &SecurityRule,
    ) -> Result<RuleInfo> {
        let priority = rule.priority.to_string();
        let port = rule.destination_port.to_string();

        self.run_json(&[
            "network",
            "nsg",
            "rule",
            "create",
            "--resource-group",
            group,
            "--nsg-name",
            nsg,
            "--name",
            rule.name.as_str(),
            "--priority",
            priority.as_str(),
            "--direction",
            rule.direction.as_str(),
            "--access",
            rule.access.as_str(),
            "--protocol",
            rule.protocol.as_str(),
            "--source-address-prefixes",
            "*",
            "--source-port-ranges",
            "*",
            "--destination-address-prefixes",
            "*",
            "--destination-port-ranges",
            port.as_str(),
        ])
        .await
    }

    pub async fn public_ip_show(&self, group: &str, name: &str) -> Result<Option<PublicIpInfo>> {
        self.run_show(&[
            "network",
            "public-ip",
            "show",
            "--resource-group",
            group,
            "--name",
            name,
        ])
        .await
    }

    pub async fn public_ip_create(
        &self,
        group: &str,
        name: &str,
        location: &str,
        sku: PublicIpSku,
        allocation: IpAllocation,
    ) -> Result<PublicIpInfo> {
        self.run_create(&[
            "network",
            "public-ip",
            "create",
            "--resource-group",
            group,
            "--name",
            name,
            "--location",
            location,
            "--sku",
            sku.as_str(),
            "--allocation-method",
            allocation.as_str(),
        ])
        .await
    }

    pub async fn nic_show(&self, group: &str, name: &str) -> Result<Option<NicInfo>> {
        self.run_show(&[
            "network",
            "nic",
            "show",
            "--resource-group",
            group,
            "--name",
            name,
        ])
        .await
    }

    pub async fn nic_create(&self, config: &CreateNicConfig<'_>) -> Result<NicInfo> {
        self.run_create(&[
            "network",
            "nic",
            "create",
            "--resource-group",
            config.group,
            "--name",
            config.name,
            "--location",
            config.location,
            "--subnet",
            config.subnet_id,
            "--network-security-group",
            config.nsg_id,
            "--public-ip-address",
            config.public_ip_id,
        ])
        .await
    }

    // ========== Virtual Machine Operations ==========

    pub async fn vm_show(&self, group: &str, name: &str) -> Result<Option<VmInfo>> {
        self.run_show(&["vm", "show", "--resource-group", group, "--name", name])
            .await
    }

    /// PUT an ARM resource whose JSON body is in `body_file`
    pub async fn rest_put(&self, url: &str, body_file: &Path) -> Result<()> {
        let body = format!("@{}", body_file.display());
        self.run_command(&[
            "rest",
            "--method",
            "put",
            "--url",
            url,
            "--headers",
            "Content-Type=application/json",
            "--body",
            body.as_str(),
        ])
        .await?;
        Ok(())
    }

    /// Block until the VM has finished provisioning
    pub async fn vm_wait_created(&self, group: &str, name: &str) -> Result<()> {
        self.run_command(&[
            "vm",
            "wait",
            "--created",
            "--resource-group",
            group,
            "--name",
            name,
        ])
        .await?;
        Ok(())
    }
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new()
    }
}

/// `network vnet create` style label for logs and errors
fn command_label(args: &[&str]) -> String {
    args.iter()
        .take_while(|a| !a.starts_with("--"))
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_not_found(err: &AzureError) -> bool {
    match err {
        AzureError::CommandFailed { code, stderr, .. } => {
            *code == Some(EXIT_RESOURCE_NOT_FOUND)
                || stderr.contains("ResourceNotFound")
                || stderr.contains("ResourceGroupNotFound")
                || stderr.contains("could not be found")
                || stderr.contains("was not found")
        }
        _ => false,
    }
}

/// Some `create` commands wrap the resource, e.g. `{"newVNet": {...}}`
fn unwrap_created(value: serde_json::Value) -> Result<serde_json::Value> {
    if value.get("id").is_some() {
        return Ok(value);
    }

    if let serde_json::Value::Object(map) = &value
        && map.len() == 1
        && let Some(inner) = map.values().next()
        && inner.get("id").is_some()
    {
        return Ok(inner.clone());
    }

    Err(AzureError::InvalidOutput(format!(
        "created resource has no id: {}",
        value
    )))
}

/// Account information from `az account show`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
    pub tenant_id: Option<String>,
    pub user: Option<AccountUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUser {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnetInfo {
    pub id: String,
    pub name: String,
    pub address_space: Option<AddressSpace>,
    #[serde(default)]
    pub subnets: Vec<SubnetInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetInfo {
    pub id: String,
    pub name: String,
    pub address_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NsgInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub security_rules: Vec<RuleInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub id: Option<String>,
    pub name: String,
    pub priority: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpInfo {
    pub id: String,
    pub name: String,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmInfo {
    pub id: String,
    pub name: String,
    pub provisioning_state: Option<String>,
}

/// Configuration for creating a virtual network with its first subnet
#[derive(Debug, Clone)]
pub struct CreateVnetConfig<'a> {
    pub group: &'a str,
    pub name: &'a str,
    pub location: &'a str,
    pub address_prefix: &'a str,
    pub subnet_name: &'a str,
    pub subnet_prefix: &'a str,
}

/// Configuration for creating a network interface
#[derive(Debug, Clone)]
pub struct CreateNicConfig<'a> {
    pub group: &'a str,
    pub name: &'a str,
    pub location: &'a str,
    pub subnet_id: &'a str,
    pub nsg_id: &'a str,
    pub public_ip_id: &'a str,
}
