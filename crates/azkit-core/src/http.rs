//! Shared HTTP client.

use crate::config;
use anyhow::{Context, Result};
use reqwest::Client;
use std::sync::OnceLock;

static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

/// Process-wide reqwest client. Built once; the timeout override is read
/// from the environment at first use.
pub fn shared_client() -> Result<&'static Client> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client);
    }
    let client = Client::builder()
        .timeout(config::http_timeout())
        .build()
        .context("failed to build the HTTP client")?;
    Ok(HTTP_CLIENT.get_or_init(|| client))
}
