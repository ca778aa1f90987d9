//! # kc-legacy
//!
//! Inspects a legacy user directory through the federation provider.

#![forbid(unsafe_code)]

mod cli;
mod output;

use anyhow::Context;
use clap::Parser;
use kc_federation::{CredentialValidator, FederationConfig, Page, UserStorageProvider};
use kc_federation_sql::{LegacyStoreConfigBuilder, LegacyUserStorageProvider, PROVIDER_TYPE};
use kc_model::{CredentialInput, StorageId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = LegacyStoreConfigBuilder::from_env()?
        .connection_url(cli.database_url)
        .build()
        .context("Invalid legacy store configuration")?;
    let component = FederationConfig::builder()
        .id(cli.provider_id)
        .provider_type(PROVIDER_TYPE)
        .name("kc-legacy")
        .connection_timeout(store.connection_timeout)
        .read_timeout(store.read_timeout)
        .build()?;
    let provider = LegacyUserStorageProvider::new(component, store)?;
    let format = cli.output;

    match cli.command {
        Command::Check => {
            provider.validate_config().await?;
            provider
                .test_connection()
                .await
                .context("Legacy store is not reachable")?;
            output::success("Legacy store reachable");
        }
        Command::Count => output::value("users", &provider.count_users().await?, format)?,
        Command::List(page) => {
            let users = provider.get_users(Page::new(page.first, page.max)).await?;
            output::users(&users, format)?;
        }
        Command::Search { pattern, page } => {
            let users = provider
                .search_users(&pattern, Page::new(page.first, page.max))
                .await?;
            output::users(&users, format)?;
        }
        Command::User { username } => {
            let user = provider.get_user_by_username(&username).await?;
            output::user(user.as_ref(), format)?;
        }
        Command::Email { email } => {
            let user = provider.get_user_by_email(&email).await?;
            output::user(user.as_ref(), format)?;
        }
        Command::Lookup { reference } => {
            let user = provider.get_user_by_id(&reference).await?;
            output::user(user.as_ref(), format)?;
        }
        Command::Verify { user } => {
            let reference = if StorageId::is_federated(&user) {
                user
            } else {
                provider.codec().encode(&user).to_string()
            };
            let password = rpassword::prompt_password("Password: ")
                .context("Failed to read password")?;

            let valid = provider
                .is_valid(&reference, &CredentialInput::password(password))
                .await?;
            output::value("valid", &valid, format)?;
        }
    }

    provider.close().await?;
    Ok(())
}
