//! `azkit get-secret` – fetch one secret and print its value.

use anyhow::Result;
use azkit_core::auth::TokenCredential;
use azkit_core::config;
use azkit_core::http;
use azkit_core::vault::VaultClient;
use std::sync::Arc;

pub async fn run_get_secret(name: &str, vault_url: Option<&str>) -> Result<()> {
    // Endpoint problems (missing, placeholder, malformed) fail here, before
    // any credential or network work.
    let vault_url = config::resolve_vault_url(vault_url)?;
    let credential = Arc::new(TokenCredential::from_env()?);
    let client = http::shared_client()?.clone();
    let vault = VaultClient::new(&vault_url, client, credential);

    let bundle = vault.get_secret(name).await?;
    tracing::debug!(secret = name, id = %bundle.id, "secret retrieved");

    // Just the value, so the output can be piped.
    println!("{}", bundle.value);
    Ok(())
}
