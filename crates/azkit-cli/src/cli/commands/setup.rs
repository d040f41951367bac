//! `azkit setup` – provision the resources the other commands use.

use anyhow::Result;
use azkit_core::auth::TokenCredential;
use azkit_core::config;
use azkit_core::http;
use azkit_core::mgmt::MgmtClient;
use azkit_core::setup::{provision, SetupOptions};
use std::sync::Arc;

const SAMPLE_SECRET_VALUE: &str = "hello from azkit";

pub struct SetupArgs {
    pub principal: String,
    pub location: String,
    pub resource_group: Option<String>,
    pub vault_name: Option<String>,
    pub secret_name: String,
}

pub async fn run_setup(args: SetupArgs) -> Result<()> {
    let subscription = config::require_env(
        config::SUBSCRIPTION_ID_VAR,
        "the subscription to provision into",
    )?;
    let tenant = config::require_env(config::TENANT_ID_VAR, "the tenant that owns the vault")?;
    let credential = Arc::new(TokenCredential::from_env()?);
    let client = http::shared_client()?.clone();
    let mgmt = MgmtClient::new(subscription.as_str(), client.clone(), credential.clone());

    let opts = SetupOptions {
        principal_id: args.principal,
        location: args.location,
        resource_group: args.resource_group,
        vault_name: args.vault_name,
        secret_name: args.secret_name,
        secret_value: SAMPLE_SECRET_VALUE.to_string(),
    };

    let report = provision(&mgmt, client, credential, &tenant, &opts).await?;

    println!("Resource group: {}", report.summary.resource_group);
    println!(
        "Key vault:      {} ({})",
        report.summary.vault_name, report.summary.vault_url
    );
    if report.secret_seeded {
        println!("Sample secret:  {}", report.summary.secret_name);
    } else {
        println!(
            "Sample secret:  {} (not stored yet; the role assignment may still be \
             propagating, store it once access works)",
            report.summary.secret_name
        );
    }
    println!("Summary saved:  {}", report.summary_path.display());
    Ok(())
}
