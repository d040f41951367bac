//! `azkit login` – interactive device-code sign-in.

use anyhow::Result;
use azkit_core::auth::{self, TokenCredential, ARM_SCOPE};
use azkit_core::config;

pub async fn run_login() -> Result<()> {
    let tenant = config::require_env(config::TENANT_ID_VAR, "the tenant to sign in against")?;
    let client_id = auth::client_id_from_env()?;

    let credential = TokenCredential::device_code(tenant, client_id);
    let token = credential.token(ARM_SCOPE).await?;

    // Prove acquisition without ever printing the token itself.
    println!(
        "Signed in: acquired a management token ({} characters).",
        token.len()
    );
    Ok(())
}
