//! Thin Key Vault secrets client.

use crate::auth::{TokenCredential, VAULT_SCOPE};
use crate::error::{ClientError, ClientResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use url::Url;

const SECRETS_API_VERSION: &str = "7.4";

/// Secret payload as returned by the service: the value plus the versioned
/// secret identifier URL.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretBundle {
    pub value: String,
    pub id: String,
}

pub struct VaultClient {
    base: String,
    client: reqwest::Client,
    credential: Arc<TokenCredential>,
}

impl VaultClient {
    pub fn new(vault_url: &Url, client: reqwest::Client, credential: Arc<TokenCredential>) -> Self {
        Self {
            base: vault_url.as_str().trim_end_matches('/').to_string(),
            client,
            credential,
        }
    }

    fn secret_url(&self, name: &str) -> String {
        format!(
            "{}/secrets/{}?api-version={}",
            self.base, name, SECRETS_API_VERSION
        )
    }

    /// Fetch the latest version of a secret.
    pub async fn get_secret(&self, name: &str) -> ClientResult<SecretBundle> {
        let url = self.secret_url(name);
        let token = self.credential.token(VAULT_SCOPE).await?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status, &body));
        }
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url,
                source,
            })
    }

    /// Store a secret value. Safe to repeat: the service creates a new
    /// version for an existing name.
    pub async fn set_secret(&self, name: &str, value: &str) -> ClientResult<SecretBundle> {
        let url = self.secret_url(name);
        let token = self.credential.token(VAULT_SCOPE).await?;
        let response = self
            .client
            .put(&url)
            .bearer_auth(&token)
            .json(&json!({ "value": value }))
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status, &body));
        }
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: url,
                source,
            })
    }
}
