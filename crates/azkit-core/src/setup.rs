//! Provisioning for the other commands: resource group, RBAC-enabled vault,
//! role assignment, and a first sample secret.

use crate::auth::TokenCredential;
use crate::config::{self, SetupSummary};
use crate::mgmt::{MgmtClient, SECRETS_OFFICER_ROLE_ID};
use crate::retry::{run_with_retry, BackoffPolicy};
use crate::vault::VaultClient;
use anyhow::{Context, Result};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// Object id of the principal that gets the secrets role.
    pub principal_id: String,
    pub location: String,
    /// Generated with a random suffix when omitted.
    pub resource_group: Option<String>,
    /// Generated with a random suffix when omitted. Vault names are 3-24
    /// characters, alphanumeric and dashes, globally unique.
    pub vault_name: Option<String>,
    pub secret_name: String,
    pub secret_value: String,
}

#[derive(Debug)]
pub struct SetupReport {
    pub summary: SetupSummary,
    pub summary_path: PathBuf,
    /// False when the sample-secret write never went through. The vault and
    /// role assignment still exist; the secret can be stored manually once
    /// the grant is visible.
    pub secret_seeded: bool,
}

/// Run the full provisioning sequence.
///
/// Only the final secret write is retried: it is the one call gated on the
/// fresh role assignment, whose effect reaches the vault's authorization
/// checks asynchronously. The earlier management-plane calls are authorized
/// by the caller's pre-existing subscription permissions.
pub async fn provision(
    mgmt: &MgmtClient,
    http: reqwest::Client,
    credential: Arc<TokenCredential>,
    tenant_id: &str,
    opts: &SetupOptions,
) -> Result<SetupReport> {
    let suffix = random_suffix();
    let group_name = opts
        .resource_group
        .clone()
        .unwrap_or_else(|| format!("azkit-rg-{suffix}"));
    let vault_name = opts
        .vault_name
        .clone()
        .unwrap_or_else(|| format!("azkit-kv-{suffix}"));

    let group = mgmt
        .create_resource_group(&group_name, &opts.location)
        .await
        .with_context(|| format!("creating resource group {group_name}"))?;
    tracing::info!(group = %group.name, location = %group.location, "resource group ready");

    let vault = mgmt
        .create_vault(&group_name, &vault_name, &opts.location, tenant_id)
        .await
        .with_context(|| format!("creating key vault {vault_name}"))?;
    tracing::info!(vault = %vault_name, uri = %vault.vault_uri, "key vault ready");

    mgmt.assign_role(&vault.id, SECRETS_OFFICER_ROLE_ID, &opts.principal_id)
        .await
        .with_context(|| format!("assigning the secrets role to {}", opts.principal_id))?;
    tracing::info!(principal = %opts.principal_id, "role assignment submitted");

    let vault_url =
        Url::parse(&vault.vault_uri).context("service returned an invalid vault URI")?;
    let vault_client = VaultClient::new(&vault_url, http, credential);

    let policy = BackoffPolicy::default();
    let secret_seeded = match run_with_retry(&policy, || {
        vault_client.set_secret(&opts.secret_name, &opts.secret_value)
    })
    .await
    {
        Ok(bundle) => {
            tracing::info!(secret = %opts.secret_name, id = %bundle.id, "sample secret stored");
            true
        }
        Err(exhausted) => {
            tracing::warn!(
                attempts = exhausted.attempts,
                error = %exhausted.last_error,
                "could not store the sample secret; the role assignment may still be \
                 propagating. The vault and role assignment are in place, so store \
                 the secret manually once access works"
            );
            false
        }
    };

    let summary = SetupSummary {
        resource_group: group_name,
        vault_name,
        vault_url: vault.vault_uri.clone(),
        secret_name: opts.secret_name.clone(),
        location: opts.location.clone(),
    };
    let summary_path = config::write_summary(&summary).context("writing the setup summary")?;

    Ok(SetupReport {
        summary,
        summary_path,
        secret_seeded,
    })
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}
