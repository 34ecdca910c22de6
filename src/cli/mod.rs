//! Command-line interface.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::state::SharedState;

/// Storefront accounts and cart service
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API until Ctrl+C (default)
    Serve,

    /// Write a default config.toml in the current directory
    Init,

    /// Grant the admin role to an account
    Promote {
        /// Email or username of the account
        identifier: String,
    },
}

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml");
    } else {
        println!("config.toml already exists, leaving it alone");
    }
    Ok(())
}

pub async fn cmd_promote(config: Config, identifier: &str) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    let state = SharedState::with_store(config, store)?;

    let account = state
        .auth_service
        .promote(identifier)
        .await
        .with_context(|| format!("Could not promote '{identifier}'"))?;

    info!(account_id = %account.id, "Promoted to admin");
    println!("{} ({}) is now an admin", account.username, account.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["storefront"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn promote_takes_identifier() {
        let cli = Cli::try_parse_from(["storefront", "promote", "janedoe"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Promote {
                identifier: "janedoe".to_string()
            })
        );
    }

    #[test]
    fn promote_requires_identifier() {
        assert!(Cli::try_parse_from(["storefront", "promote"]).is_err());
    }
}
