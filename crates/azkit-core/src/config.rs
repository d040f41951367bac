use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Vault endpoint, e.g. `https://my-vault.vault.azure.net`.
pub const VAULT_URL_VAR: &str = "AZURE_KEYVAULT_URL";
/// Tenant that issues tokens and owns created vaults.
pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
/// Subscription the management client operates on.
pub const SUBSCRIPTION_ID_VAR: &str = "AZURE_SUBSCRIPTION_ID";
/// Application (client) id for the OAuth flows.
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
/// Client secret; presence selects the client-credentials grant.
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
/// Static bearer token override; highest precedence, useful with emulators.
pub const BEARER_TOKEN_VAR: &str = "AZKIT_BEARER_TOKEN";
/// HTTP timeout override in seconds (0 or unset = default).
pub const HTTP_TIMEOUT_VAR: &str = "AZKIT_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Problems with the ambient configuration. These fail a command before any
/// remote call is attempted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{var} is not set; {hint}")]
    Missing { var: &'static str, hint: &'static str },
    #[error("{var} still contains a template placeholder ({value}); replace it with the real value")]
    Placeholder { var: &'static str, value: String },
    #[error("{var} is not a valid URL ({value}): {source}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        source: url::ParseError,
    },
}

/// Read and validate the vault endpoint from the environment.
pub fn vault_url_from_env() -> Result<Url, ConfigError> {
    let raw = std::env::var(VAULT_URL_VAR).map_err(|_| ConfigError::Missing {
        var: VAULT_URL_VAR,
        hint: "set it to your vault endpoint, e.g. https://my-vault.vault.azure.net",
    })?;
    parse_endpoint(VAULT_URL_VAR, &raw)
}

/// Validate an endpoint value. Template placeholders (angle brackets left
/// over from copy-pasted docs) are rejected explicitly so the failure names
/// the real problem instead of surfacing as a DNS error later.
pub fn parse_endpoint(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing {
            var,
            hint: "the value is empty",
        });
    }
    if trimmed.contains('<') || trimmed.contains('>') {
        return Err(ConfigError::Placeholder {
            var,
            value: trimmed.to_string(),
        });
    }
    Url::parse(trimmed).map_err(|source| ConfigError::InvalidUrl {
        var,
        value: trimmed.to_string(),
        source,
    })
}

/// Fetch a required, non-empty environment variable.
pub fn require_env(var: &'static str, hint: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing { var, hint }),
    }
}

/// HTTP client timeout, overridable via [`HTTP_TIMEOUT_VAR`].
pub fn http_timeout() -> Duration {
    std::env::var(HTTP_TIMEOUT_VAR)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
}

/// What `azkit setup` provisioned, written to disk for operator reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupSummary {
    pub resource_group: String,
    pub vault_name: String,
    pub vault_url: String,
    pub secret_name: String,
    pub location: String,
}

pub fn summary_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("azkit")?;
    Ok(xdg_dirs.place_config_file("setup.toml")?)
}

/// Persist the summary under the XDG config dir.
pub fn write_summary(summary: &SetupSummary) -> Result<PathBuf> {
    let path = summary_path()?;
    let data = toml::to_string_pretty(summary)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, data)?;
    Ok(path)
}

/// Load a previously written summary, if any.
pub fn load_summary() -> Result<Option<SetupSummary>> {
    let path = summary_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path)?;
    let summary = toml::from_str(&data)
        .with_context(|| format!("invalid setup summary {}", path.display()))?;
    Ok(Some(summary))
}

/// Resolve the vault endpoint: explicit flag, then environment, then the
/// setup summary file.
pub fn resolve_vault_url(explicit: Option<&str>) -> Result<Url> {
    if let Some(raw) = explicit {
        return Ok(parse_endpoint("--vault-url", raw)?);
    }
    if let Ok(raw) = std::env::var(VAULT_URL_VAR) {
        return Ok(parse_endpoint(VAULT_URL_VAR, &raw)?);
    }
    if let Some(summary) = load_summary()? {
        return Ok(parse_endpoint("setup summary vault_url", &summary.vault_url)?);
    }
    Err(ConfigError::Missing {
        var: VAULT_URL_VAR,
        hint: "set it, pass --vault-url, or run `azkit setup` first",
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_parses_when_well_formed() {
        let url = parse_endpoint(VAULT_URL_VAR, "https://unit.vault.azure.net").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("unit.vault.azure.net"));
    }

    #[test]
    fn endpoint_rejects_template_placeholder() {
        let err =
            parse_endpoint(VAULT_URL_VAR, "https://<your-vault-name>.vault.azure.net").unwrap_err();
        assert!(matches!(err, ConfigError::Placeholder { .. }));
    }

    #[test]
    fn endpoint_rejects_empty_value() {
        let err = parse_endpoint(VAULT_URL_VAR, "   ").unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn endpoint_rejects_malformed_url() {
        let err = parse_endpoint(VAULT_URL_VAR, "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn summary_toml_round_trips() {
        let summary = SetupSummary {
            resource_group: "azkit-rg-abc123".into(),
            vault_name: "azkit-kv-abc123".into(),
            vault_url: "https://azkit-kv-abc123.vault.azure.net/".into(),
            secret_name: "sample-secret".into(),
            location: "westeurope".into(),
        };
        let data = toml::to_string_pretty(&summary).unwrap();
        let parsed: SetupSummary = toml::from_str(&data).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn summary_survives_a_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let summary = SetupSummary {
            resource_group: "rg".into(),
            vault_name: "kv".into(),
            vault_url: "https://kv.vault.azure.net/".into(),
            secret_name: "s".into(),
            location: "westeurope".into(),
        };
        let path = write_summary(&summary).unwrap();
        assert!(path.starts_with(dir.path()));
        let loaded = load_summary().unwrap().expect("summary on disk");
        assert_eq!(loaded, summary);
    }
}
