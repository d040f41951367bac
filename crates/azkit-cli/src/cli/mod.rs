//! CLI for the azkit toolkit.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run_get_secret, run_groups, run_login, run_setup, SetupArgs};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "azkit")]
#[command(about = "Console tooling for Azure resource and Key Vault access", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the resource groups in the configured subscription.
    Groups,

    /// Sign in interactively with the device-code flow.
    Login,

    /// Fetch a secret from the configured Key Vault and print its value.
    GetSecret {
        /// Secret name.
        name: String,

        /// Vault endpoint; overrides AZURE_KEYVAULT_URL and the setup summary.
        #[arg(long)]
        vault_url: Option<String>,
    },

    /// Provision a resource group, an RBAC-enabled Key Vault, a secrets role
    /// assignment, and a sample secret.
    Setup {
        /// Object id of the principal to grant secret access to.
        #[arg(long)]
        principal: String,

        /// Region for the created resources.
        #[arg(long, default_value = "westeurope")]
        location: String,

        /// Resource group name (generated when omitted).
        #[arg(long)]
        resource_group: Option<String>,

        /// Vault name (generated when omitted; 3-24 chars, globally unique).
        #[arg(long)]
        vault_name: Option<String>,

        /// Name of the sample secret to store.
        #[arg(long, default_value = "sample-secret")]
        secret_name: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Groups => run_groups().await,
            CliCommand::Login => run_login().await,
            CliCommand::GetSecret { name, vault_url } => {
                run_get_secret(&name, vault_url.as_deref()).await
            }
            CliCommand::Setup {
                principal,
                location,
                resource_group,
                vault_name,
                secret_name,
            } => {
                run_setup(SetupArgs {
                    principal,
                    location,
                    resource_group,
                    vault_name,
                    secret_name,
                })
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests;
