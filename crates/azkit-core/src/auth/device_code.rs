//! OAuth2 device-code flow for interactive sign-in.
//!
//! The user gets a verification URI and a short code on stdout, completes
//! the sign-in in a browser (on any machine), and this end polls the token
//! endpoint until the grant lands, expires, or is declined.

use super::{AccessToken, AuthError, TokenResponse, TOKEN_ENDPOINT_TEMPLATE};
use crate::http;
use serde::Deserialize;
use std::time::Duration;

const DEVICE_ENDPOINT_TEMPLATE: &str =
    "https://login.microsoftonline.com/{tenant}/oauth2/v2.0/devicecode";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

#[derive(Debug, Deserialize)]
struct DeviceCodeGrant {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default)]
    interval: Option<u64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum PollState {
    Pending,
    SlowDown,
    Expired,
    Declined(String),
    Unknown,
}

pub(super) async fn acquire(
    tenant_id: &str,
    client_id: &str,
    scope: &str,
) -> Result<AccessToken, AuthError> {
    let client = http::shared_client().map_err(|err| AuthError::Request(err.to_string()))?;

    let device_url = DEVICE_ENDPOINT_TEMPLATE.replace("{tenant}", tenant_id);
    let response = client
        .post(device_url)
        .form(&[("client_id", client_id), ("scope", scope)])
        .send()
        .await
        .map_err(|err| AuthError::Request(err.to_string()))?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected { status, body });
    }
    let grant: DeviceCodeGrant = response
        .json()
        .await
        .map_err(|err| AuthError::Parse(err.to_string()))?;

    // The tenant usually sends a ready-made instruction line; fall back to
    // assembling one from the URI and code.
    match &grant.message {
        Some(message) => println!("{message}"),
        None => println!(
            "To sign in, open {} and enter the code {}",
            grant.verification_uri, grant.user_code
        ),
    }

    let token_url = TOKEN_ENDPOINT_TEMPLATE.replace("{tenant}", tenant_id);
    let mut interval = Duration::from_secs(grant.interval.unwrap_or(5).max(1));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(grant.expires_in);

    loop {
        if tokio::time::Instant::now() >= deadline {
            return Err(AuthError::DeviceFlowExpired);
        }
        tokio::time::sleep(interval).await;

        let response = client
            .post(&token_url)
            .form(&[
                ("grant_type", DEVICE_GRANT_TYPE),
                ("client_id", client_id),
                ("device_code", grant.device_code.as_str()),
            ])
            .send()
            .await
            .map_err(|err| AuthError::Request(err.to_string()))?;

        if response.status().is_success() {
            let payload: TokenResponse = response
                .json()
                .await
                .map_err(|err| AuthError::Parse(err.to_string()))?;
            return Ok(payload.into_access_token());
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match poll_state(&body) {
            PollState::Pending => continue,
            PollState::SlowDown => {
                // The endpoint asked for more spacing between polls.
                interval += Duration::from_secs(5);
            }
            PollState::Expired => return Err(AuthError::DeviceFlowExpired),
            PollState::Declined(reason) => return Err(AuthError::DeviceFlowDeclined(reason)),
            PollState::Unknown => return Err(AuthError::Rejected { status, body }),
        }
    }
}

/// Interpret the error payload the token endpoint returns while the user has
/// not finished signing in.
fn poll_state(body: &str) -> PollState {
    let Ok(err) = serde_json::from_str::<PollErrorBody>(body) else {
        return PollState::Unknown;
    };
    match err.error.as_str() {
        "authorization_pending" => PollState::Pending,
        "slow_down" => PollState::SlowDown,
        "expired_token" => PollState::Expired,
        "authorization_declined" | "bad_verification_code" => {
            PollState::Declined(err.error_description.unwrap_or(err.error))
        }
        _ => PollState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_keeps_polling() {
        let body = r#"{"error":"authorization_pending","error_description":"user has not signed in yet"}"#;
        assert_eq!(poll_state(body), PollState::Pending);
    }

    #[test]
    fn slow_down_widens_the_interval() {
        assert_eq!(poll_state(r#"{"error":"slow_down"}"#), PollState::SlowDown);
    }

    #[test]
    fn expired_token_stops_the_flow() {
        assert_eq!(poll_state(r#"{"error":"expired_token"}"#), PollState::Expired);
    }

    #[test]
    fn declined_carries_the_description() {
        let body = r#"{"error":"authorization_declined","error_description":"user said no"}"#;
        assert_eq!(
            poll_state(body),
            PollState::Declined("user said no".to_string())
        );
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(poll_state("<html>nope</html>"), PollState::Unknown);
        assert_eq!(poll_state(r#"{"error":"invalid_client"}"#), PollState::Unknown);
    }
}
