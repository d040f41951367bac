//! `azkit groups` – list resource groups in the subscription.

use anyhow::Result;
use azkit_core::auth::TokenCredential;
use azkit_core::config;
use azkit_core::http;
use azkit_core::mgmt::MgmtClient;
use std::sync::Arc;

pub async fn run_groups() -> Result<()> {
    let subscription = config::require_env(
        config::SUBSCRIPTION_ID_VAR,
        "the subscription to list resource groups from",
    )?;
    let credential = Arc::new(TokenCredential::from_env()?);
    let client = http::shared_client()?.clone();
    let mgmt = MgmtClient::new(subscription.as_str(), client, credential);

    let groups = mgmt.list_resource_groups().await?;
    if groups.is_empty() {
        println!("No resource groups in subscription {subscription}.");
    } else {
        println!("{:<32} {:<16} {}", "NAME", "LOCATION", "ID");
        for group in groups {
            println!("{:<32} {:<16} {}", group.name, group.location, group.id);
        }
    }
    Ok(())
}
