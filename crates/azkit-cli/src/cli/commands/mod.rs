mod get_secret;
mod groups;
mod login;
mod setup;

pub use get_secret::run_get_secret;
pub use groups::run_groups;
pub use login::run_login;
pub use setup::{run_setup, SetupArgs};
