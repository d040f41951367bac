//! Thin management (ARM) client scoped to one subscription.

use crate::auth::{TokenCredential, ARM_SCOPE};
use crate::error::{ClientError, ClientResult};
use rand::Rng;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const ARM_BASE: &str = "https://management.azure.com";
const GROUPS_API_VERSION: &str = "2021-04-01";
const VAULTS_API_VERSION: &str = "2022-07-01";
const ROLE_ASSIGNMENTS_API_VERSION: &str = "2022-04-01";

/// Built-in role that allows reading and writing vault secrets
/// (Key Vault Secrets Officer).
pub const SECRETS_OFFICER_ROLE_ID: &str = "b86a8fe4-44ce-4948-aee5-eccb2c155cd7";

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
struct GroupPage {
    #[serde(default)]
    value: Vec<ResourceGroup>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VaultResource {
    id: String,
    properties: VaultProperties,
}

#[derive(Debug, Deserialize)]
struct VaultProperties {
    #[serde(rename = "vaultUri")]
    vault_uri: String,
}

/// Identifiers of a created vault needed by later provisioning steps.
#[derive(Debug, Clone)]
pub struct CreatedVault {
    pub id: String,
    pub vault_uri: String,
}

pub struct MgmtClient {
    base: String,
    subscription_id: String,
    client: reqwest::Client,
    credential: Arc<TokenCredential>,
}

impl MgmtClient {
    /// Client against the public management endpoint.
    pub fn new(
        subscription_id: impl Into<String>,
        client: reqwest::Client,
        credential: Arc<TokenCredential>,
    ) -> Self {
        Self::with_base(ARM_BASE, subscription_id, client, credential)
    }

    /// Client against a specific management endpoint (sovereign clouds,
    /// emulators, tests).
    pub fn with_base(
        base: impl Into<String>,
        subscription_id: impl Into<String>,
        client: reqwest::Client,
        credential: Arc<TokenCredential>,
    ) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            subscription_id: subscription_id.into(),
            client,
            credential,
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> ClientResult<reqwest::Response> {
        let token = self.credential.token(ARM_SCOPE).await?;
        let mut request = self.client.request(method, url).bearer_auth(&token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url.to_string(),
                source,
            })
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status, &body));
        }
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url.to_string(),
                source,
            })
    }

    /// List every resource group in the subscription, following pagination.
    pub async fn list_resource_groups(&self) -> ClientResult<Vec<ResourceGroup>> {
        let mut url = format!(
            "{}/subscriptions/{}/resourcegroups?api-version={}",
            self.base, self.subscription_id, GROUPS_API_VERSION
        );
        let mut groups = Vec::new();

        loop {
            let response = self.send(Method::GET, &url, None).await?;
            let page: GroupPage = self.expect_json(&url, response).await?;
            groups.extend(page.value);
            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(groups)
    }

    /// Create a resource group. The call is a PUT and safe to repeat.
    pub async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> ClientResult<ResourceGroup> {
        let url = format!(
            "{}/subscriptions/{}/resourcegroups/{}?api-version={}",
            self.base, self.subscription_id, name, GROUPS_API_VERSION
        );
        let response = self
            .send(Method::PUT, &url, Some(json!({ "location": location })))
            .await?;
        self.expect_json(&url, response).await
    }

    /// Create a Key Vault with RBAC authorization enabled, so access is
    /// governed by role assignments rather than access policies.
    pub async fn create_vault(
        &self,
        group: &str,
        name: &str,
        location: &str,
        tenant_id: &str,
    ) -> ClientResult<CreatedVault> {
        let url = format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.KeyVault/vaults/{}?api-version={}",
            self.base, self.subscription_id, group, name, VAULTS_API_VERSION
        );
        let body = json!({
            "location": location,
            "properties": {
                "tenantId": tenant_id,
                "sku": { "family": "A", "name": "standard" },
                "enableRbacAuthorization": true,
            }
        });
        let response = self.send(Method::PUT, &url, Some(body)).await?;
        let vault: VaultResource = self.expect_json(&url, response).await?;
        Ok(CreatedVault {
            id: vault.id,
            vault_uri: vault.properties.vault_uri,
        })
    }

    /// Grant `role_id` on `scope` to `principal_id`. An existing assignment
    /// (HTTP 409) counts as success so reruns stay idempotent.
    pub async fn assign_role(
        &self,
        scope: &str,
        role_id: &str,
        principal_id: &str,
    ) -> ClientResult<()> {
        let url = format!(
            "{}{}/providers/Microsoft.Authorization/roleAssignments/{}?api-version={}",
            self.base,
            scope,
            random_guid(),
            ROLE_ASSIGNMENTS_API_VERSION
        );
        let role_definition_id = format!(
            "/subscriptions/{}/providers/Microsoft.Authorization/roleDefinitions/{}",
            self.subscription_id, role_id
        );
        let body = json!({
            "properties": {
                "roleDefinitionId": role_definition_id,
                "principalId": principal_id,
            }
        });

        let response = self.send(Method::PUT, &url, Some(body)).await?;
        let status = response.status();
        if status.is_success() || status.as_u16() == 409 {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status, &body))
    }
}

/// Role assignment names must be GUIDs; any unique value is accepted.
fn random_guid() -> String {
    let bits: u128 = rand::rng().random();
    let hex = format!("{bits:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
