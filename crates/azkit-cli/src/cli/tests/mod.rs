//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_groups() {
    match parse(&["azkit", "groups"]) {
        CliCommand::Groups => {}
        _ => panic!("expected Groups"),
    }
}

#[test]
fn cli_parse_login() {
    match parse(&["azkit", "login"]) {
        CliCommand::Login => {}
        _ => panic!("expected Login"),
    }
}

#[test]
fn cli_parse_get_secret() {
    match parse(&["azkit", "get-secret", "db-password"]) {
        CliCommand::GetSecret { name, vault_url } => {
            assert_eq!(name, "db-password");
            assert!(vault_url.is_none());
        }
        _ => panic!("expected GetSecret"),
    }
}

#[test]
fn cli_parse_get_secret_with_vault_url() {
    match parse(&[
        "azkit",
        "get-secret",
        "db-password",
        "--vault-url",
        "https://unit.vault.azure.net",
    ]) {
        CliCommand::GetSecret { name, vault_url } => {
            assert_eq!(name, "db-password");
            assert_eq!(vault_url.as_deref(), Some("https://unit.vault.azure.net"));
        }
        _ => panic!("expected GetSecret with --vault-url"),
    }
}

#[test]
fn cli_parse_setup_defaults() {
    match parse(&["azkit", "setup", "--principal", "principal-1"]) {
        CliCommand::Setup {
            principal,
            location,
            resource_group,
            vault_name,
            secret_name,
        } => {
            assert_eq!(principal, "principal-1");
            assert_eq!(location, "westeurope");
            assert!(resource_group.is_none());
            assert!(vault_name.is_none());
            assert_eq!(secret_name, "sample-secret");
        }
        _ => panic!("expected Setup"),
    }
}

#[test]
fn cli_parse_setup_overrides() {
    match parse(&[
        "azkit",
        "setup",
        "--principal",
        "principal-1",
        "--location",
        "northeurope",
        "--resource-group",
        "my-rg",
        "--vault-name",
        "my-kv",
        "--secret-name",
        "db-password",
    ]) {
        CliCommand::Setup {
            principal,
            location,
            resource_group,
            vault_name,
            secret_name,
        } => {
            assert_eq!(principal, "principal-1");
            assert_eq!(location, "northeurope");
            assert_eq!(resource_group.as_deref(), Some("my-rg"));
            assert_eq!(vault_name.as_deref(), Some("my-kv"));
            assert_eq!(secret_name, "db-password");
        }
        _ => panic!("expected Setup with overrides"),
    }
}

#[test]
fn cli_parse_setup_requires_principal() {
    assert!(Cli::try_parse_from(["azkit", "setup"]).is_err());
}

#[test]
fn cli_parse_get_secret_requires_name() {
    assert!(Cli::try_parse_from(["azkit", "get-secret"]).is_err());
}
