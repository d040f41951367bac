//! Token acquisition for the management and Key Vault surfaces.
//!
//! Three modes, in precedence order when built from the environment: a
//! static bearer token (emulators, CI), the OAuth2 client-credentials grant,
//! and the interactive device-code flow. Tokens are cached per scope until
//! shortly before they expire.

mod device_code;

use crate::config;
use crate::http;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Scope for Key Vault data-plane calls.
pub const VAULT_SCOPE: &str = "https://vault.azure.net/.default";
/// Scope for management-plane (ARM) calls.
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";

const TOKEN_ENDPOINT_TEMPLATE: &str =
    "https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token";

/// Seconds shaved off an advertised token lifetime so a cached token is
/// never handed out moments before it lapses.
const EXPIRY_SLACK_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{var} is not set; {hint}")]
    MissingEnv { var: &'static str, hint: &'static str },
    #[error("token endpoint rejected the request: {status} {body}")]
    Rejected { status: u16, body: String },
    #[error("failed to reach the token endpoint: {0}")]
    Request(String),
    #[error("failed to parse the token response: {0}")]
    Parse(String),
    #[error("device sign-in expired before it was completed")]
    DeviceFlowExpired,
    #[error("device sign-in was declined: {0}")]
    DeviceFlowDeclined(String),
}

/// A bearer token plus the lifetime it can be cached for.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Duration,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        let expires_in = self
            .expires_in
            .unwrap_or(3600)
            .saturating_sub(EXPIRY_SLACK_SECS)
            .max(EXPIRY_SLACK_SECS);
        AccessToken {
            token: self.access_token,
            expires_in: Duration::from_secs(expires_in),
        }
    }
}

// No Debug derive: a client secret must never end up in log output.
enum CredentialMode {
    Bearer {
        token: String,
    },
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    DeviceCode {
        tenant_id: String,
        client_id: String,
    },
}

struct CachedToken {
    token: String,
    valid_until: Instant,
}

/// Credential that exchanges its configured identity for bearer tokens.
pub struct TokenCredential {
    mode: CredentialMode,
    cache: Mutex<HashMap<String, CachedToken>>,
}

impl TokenCredential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::with_mode(CredentialMode::Bearer {
            token: token.into(),
        })
    }

    pub fn client_secret(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::with_mode(CredentialMode::ClientSecret {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    pub fn device_code(tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self::with_mode(CredentialMode::DeviceCode {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
        })
    }

    fn with_mode(mode: CredentialMode) -> Self {
        Self {
            mode,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Build a credential from the environment: a static bearer token wins,
    /// then the client-credentials grant, then the interactive device flow.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(token) = env::var(config::BEARER_TOKEN_VAR) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(Self::bearer(token));
            }
        }

        let tenant_id = config::require_env(
            config::TENANT_ID_VAR,
            "the tenant to request tokens from",
        )?;
        let client_id = client_id_from_env()?;

        match env::var(config::CLIENT_SECRET_VAR) {
            Ok(secret) if !secret.trim().is_empty() => Ok(Self::client_secret(
                tenant_id,
                client_id,
                secret.trim().to_string(),
            )),
            _ => Ok(Self::device_code(tenant_id, client_id)),
        }
    }

    /// Return a bearer token for `scope`, reusing a cached one while valid.
    pub async fn token(&self, scope: &str) -> Result<String, AuthError> {
        if let Some(token) = self.cached(scope) {
            return Ok(token);
        }
        let acquired = match &self.mode {
            CredentialMode::Bearer { token } => return Ok(token.clone()),
            CredentialMode::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => request_client_secret_token(tenant_id, client_id, client_secret, scope).await?,
            CredentialMode::DeviceCode {
                tenant_id,
                client_id,
            } => device_code::acquire(tenant_id, client_id, scope).await?,
        };
        self.store(scope, &acquired);
        Ok(acquired.token)
    }

    fn cached(&self, scope: &str) -> Option<String> {
        let cache = self.cache.lock().ok()?;
        let entry = cache.get(scope)?;
        if Instant::now() < entry.valid_until {
            Some(entry.token.clone())
        } else {
            None
        }
    }

    fn store(&self, scope: &str, token: &AccessToken) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                scope.to_string(),
                CachedToken {
                    token: token.token.clone(),
                    valid_until: Instant::now() + token.expires_in,
                },
            );
        }
    }
}

/// Application (client) id, required for every OAuth flow.
pub fn client_id_from_env() -> Result<String, AuthError> {
    match env::var(config::CLIENT_ID_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(AuthError::MissingEnv {
            var: config::CLIENT_ID_VAR,
            hint: "the application (client) id registered for azkit",
        }),
    }
}

/// OAuth2 client-credentials grant against the tenant's token endpoint.
async fn request_client_secret_token(
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
    scope: &str,
) -> Result<AccessToken, AuthError> {
    let client = http::shared_client().map_err(|err| AuthError::Request(err.to_string()))?;
    let url = TOKEN_ENDPOINT_TEMPLATE.replace("{tenant}", tenant_id);
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("scope", scope),
        ("grant_type", "client_credentials"),
    ];

    let response = client
        .post(url)
        .form(&params)
        .send()
        .await
        .map_err(|err| AuthError::Request(err.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected { status, body });
    }

    let payload: TokenResponse = response
        .json()
        .await
        .map_err(|err| AuthError::Parse(err.to_string()))?;
    Ok(payload.into_access_token())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_applies_expiry_slack() {
        let token = TokenResponse {
            access_token: "tok".into(),
            expires_in: Some(3600),
        }
        .into_access_token();
        assert_eq!(token.expires_in, Duration::from_secs(3540));
    }

    #[test]
    fn token_response_defaults_a_missing_expiry() {
        let token = TokenResponse {
            access_token: "tok".into(),
            expires_in: None,
        }
        .into_access_token();
        assert_eq!(token.expires_in, Duration::from_secs(3540));
    }

    #[test]
    fn token_response_clamps_a_tiny_expiry() {
        let token = TokenResponse {
            access_token: "tok".into(),
            expires_in: Some(30),
        }
        .into_access_token();
        assert_eq!(token.expires_in, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn bearer_credential_returns_the_token_verbatim() {
        let credential = TokenCredential::bearer("abc");
        assert_eq!(credential.token(VAULT_SCOPE).await.unwrap(), "abc");
        assert_eq!(credential.token(ARM_SCOPE).await.unwrap(), "abc");
    }

    #[test]
    fn stored_tokens_are_served_until_expiry() {
        let credential = TokenCredential::bearer("unused");
        credential.store(
            "scope-a",
            &AccessToken {
                token: "cached".into(),
                expires_in: Duration::from_secs(300),
            },
        );
        assert_eq!(credential.cached("scope-a").unwrap(), "cached");
        assert!(credential.cached("scope-b").is_none());
    }
}
