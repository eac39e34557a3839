//! Preflight checks run before any side effect

use crate::error::{CloudError, Result};
use crate::provider::{AuthStatus, ProvisioningApi};

/// Hint shown when the provider reports no session
pub const LOGIN_HINT: &str = "run `az login` and select the subscription to use";

/// Fail fast unless the client is installed and a session is present
///
/// No retries: both failures are operator configuration problems.
pub async fn preflight(provider: &dyn ProvisioningApi) -> Result<AuthStatus> {
    tracing::debug!("Running preflight checks for {}", provider.name());

    let status = provider.check_auth().await?;
    if !status.authenticated {
        return Err(CloudError::NotAuthenticated {
            reason: status
                .error
                .clone()
                .unwrap_or_else(|| "no active session".to_string()),
            login_hint: LOGIN_HINT.to_string(),
        });
    }

    tracing::info!(
        "Authenticated with {} as {}",
        provider.name(),
        status.account_info.as_deref().unwrap_or("unknown account")
    );
    Ok(status)
}
