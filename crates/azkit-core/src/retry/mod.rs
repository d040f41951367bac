//! Bounded retry with linear backoff.
//!
//! Built for one situation: writing to a permission-gated resource right
//! after granting the permission, where the grant takes effect
//! asynchronously (RBAC propagation delay). Every failure inside the loop is
//! treated as potentially transient, and the retried operation must be
//! idempotent; both are caller obligations.

mod policy;
mod run;

pub use policy::BackoffPolicy;
pub use run::{run_with_retry, Exhausted};
