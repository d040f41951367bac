//! Typed failures raised by the REST clients.

use crate::auth::AuthError;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Failures from a remote call, kept typed so the outcome classifier can
/// tell credential problems, service rejections, and wire failures apart.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("HTTP {status}: {message}")]
    Service { status: u16, message: String },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Build a `Service` error from a non-success response, extracting the
    /// message from the JSON error envelope when the service sent one.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        ClientError::Service {
            status: status.as_u16(),
            message: service_message(body),
        }
    }
}

/// Pull `error.message` (or `error.code`) out of the JSON error envelope the
/// management and vault APIs return, falling back to the raw body.
fn service_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message").or_else(|| e.get("code")))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response body)".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_message_prefers_the_envelope_message() {
        let body = r#"{"error":{"code":"Forbidden","message":"caller lacks secrets/get"}}"#;
        assert_eq!(service_message(body), "caller lacks secrets/get");
    }

    #[test]
    fn service_message_falls_back_to_the_code() {
        let body = r#"{"error":{"code":"Forbidden"}}"#;
        assert_eq!(service_message(body), "Forbidden");
    }

    #[test]
    fn service_message_passes_non_json_through() {
        assert_eq!(service_message("  upstream said no  "), "upstream said no");
    }

    #[test]
    fn service_message_handles_empty_bodies() {
        assert_eq!(service_message(""), "(empty response body)");
    }
}
