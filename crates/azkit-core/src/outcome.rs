//! Failure classification and process exit mapping.
//!
//! Every azkit command funnels its error through [`classify`] at the process
//! boundary: the cause chain is matched against an ordered rule ladder and
//! reduced to one [`Outcome`] plus a single diagnostic line. Ladder order is
//! load-bearing: an authentication failure that happens to carry an HTTP
//! status must not be reported as a plain service failure.

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::error::ClientError;

/// Closed set of process results. Exactly one is chosen per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    UnexpectedError,
    AuthenticationFailed,
    ServiceRequestFailed,
    InvalidConfiguration,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub const fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::UnexpectedError => 1,
            Outcome::AuthenticationFailed => 2,
            Outcome::ServiceRequestFailed => 3,
            Outcome::InvalidConfiguration => 4,
        }
    }
}

/// A failure reduced to an outcome plus one display line.
#[derive(Debug)]
pub struct Verdict {
    pub outcome: Outcome,
    pub message: String,
}

type Rule = fn(&anyhow::Error) -> Option<Verdict>;

/// Ordered rule ladder; the first matching rule wins.
const LADDER: &[Rule] = &[
    authentication_failure,
    service_failure,
    invalid_configuration,
];

/// Reduce an error to a [`Verdict`], falling through to `UnexpectedError`.
pub fn classify(err: &anyhow::Error) -> Verdict {
    LADDER
        .iter()
        .find_map(|rule| rule(err))
        .unwrap_or_else(|| Verdict {
            outcome: Outcome::UnexpectedError,
            message: format!("unexpected error: {err:#}"),
        })
}

fn authentication_failure(err: &anyhow::Error) -> Option<Verdict> {
    err.chain().find_map(|cause| {
        let reason = if let Some(auth) = cause.downcast_ref::<AuthError>() {
            auth.to_string()
        } else if let Some(ClientError::Auth(auth)) = cause.downcast_ref::<ClientError>() {
            auth.to_string()
        } else {
            return None;
        };
        Some(Verdict {
            outcome: Outcome::AuthenticationFailed,
            message: format!("authentication failed: {reason}"),
        })
    })
}

fn service_failure(err: &anyhow::Error) -> Option<Verdict> {
    err.chain()
        .find_map(|cause| match cause.downcast_ref::<ClientError>() {
            Some(ClientError::Service { status, message }) => {
                Some(service_verdict(*status, message))
            }
            _ => None,
        })
}

fn service_verdict(status: u16, message: &str) -> Verdict {
    let message = match status {
        401 => "the service returned HTTP 401: the token was missing, expired, or lacks the required permissions".to_string(),
        403 => "the service returned HTTP 403: access denied for the signed-in principal".to_string(),
        404 => "the service returned HTTP 404: the requested resource does not exist".to_string(),
        code => format!("service request failed with HTTP {code}: {message}"),
    };
    Verdict {
        outcome: Outcome::ServiceRequestFailed,
        message,
    }
}

fn invalid_configuration(err: &anyhow::Error) -> Option<Verdict> {
    err.chain().find_map(|cause| {
        let detail = if let Some(config) = cause.downcast_ref::<ConfigError>() {
            config.to_string()
        } else if let Some(parse) = cause.downcast_ref::<url::ParseError>() {
            format!("endpoint is not a valid URL: {parse}")
        } else {
            return None;
        };
        Some(Verdict {
            outcome: Outcome::InvalidConfiguration,
            message: format!("invalid configuration: {detail}"),
        })
    })
}
