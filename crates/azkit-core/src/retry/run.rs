//! The retry loop itself.

use super::BackoffPolicy;
use std::fmt;
use std::future::Future;

/// Returned when the attempt budget runs out. Carries the last failure so
/// the caller can decide whether exhaustion is fatal; the provisioning flow
/// treats it as a warning, not a process failure.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gave up after {} attempts: {}",
            self.attempts, self.last_error
        )
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for Exhausted<E> {}

/// Run `op` until it succeeds or the policy's attempt budget is spent.
///
/// Success returns immediately, with no trailing delay. Failures sleep the
/// policy's current delay and try again; each failed attempt leaves one
/// debug line in the log and is otherwise swallowed. At least one attempt is
/// always made. The sleep is a tokio timer, so an enclosing timeout or an
/// operator interrupt can cancel mid-backoff.
pub async fn run_with_retry<F, Fut, T, E>(policy: &BackoffPolicy, mut op: F) -> Result<T, Exhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => match policy.delay_for(attempt) {
                None => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: err,
                    })
                }
                Some(delay) => {
                    tracing::debug!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}
