//! VM admin credential sources
//!
//! The reconciler never prompts by itself; it asks a [`CredentialSource`]
//! for the password right before the VM is created.

use crate::error::{CloudError, Result};

/// Local administrator login for the VM
#[derive(Clone)]
pub struct AdminCredential {
    pub username: String,
    password: String,
}

impl AdminCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies the admin password for a given username
pub trait CredentialSource: Send + Sync {
    fn admin_password(&self, username: &str) -> Result<String>;

    /// Pair the password with `username`
    fn admin_credential(&self, username: &str) -> Result<AdminCredential> {
        let password = self.admin_password(username)?;
        if password.is_empty() {
            return Err(CloudError::Credential(
                "admin password must not be empty".to_string(),
            ));
        }
        Ok(AdminCredential::new(username, password))
    }
}

/// A password known up front
pub struct FixedCredentialSource {
    password: String,
}

impl FixedCredentialSource {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl CredentialSource for FixedCredentialSource {
    fn admin_password(&self, _username: &str) -> Result<String> {
        Ok(self.password.clone())
    }
}

/// Reads the password from an environment variable
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredentialSource {
    fn admin_password(&self, _username: &str) -> Result<String> {
        std::env::var(&self.var)
            .map_err(|_| CloudError::Credential(format!("{} is not set", self.var)))
    }
}
