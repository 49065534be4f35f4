//! Monitor Panel CLI - Database migrations and administrator management.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations (including the session table)
//! mp-cli migrate
//!
//! # Show / create / remove the administrator
//! mp-cli admin show
//! ADMIN_PASSWORD=... mp-cli admin create -p 5551234567
//! mp-cli admin remove --yes
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin` - Manage the single administrator

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Monitor Panel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the administrator
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show the administrator, if registered
    Show,
    /// Create the administrator (password read from `ADMIN_PASSWORD`)
    Create {
        /// Login phone number
        #[arg(short, long)]
        phone: String,

        /// Contact email address
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Delete the administrator and re-open registration
    Remove {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Show => commands::admin::show().await?,
            AdminAction::Create { phone, email } => {
                commands::admin::create(&phone, email.as_deref()).await?;
            }
            AdminAction::Remove { yes } => commands::admin::remove(yes).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_admin_create() {
        let cli = Cli::try_parse_from(["mp-cli", "admin", "create", "-p", "5551234567"])
            .unwrap_or_else(|e| panic!("{e}"));

        match cli.command {
            Commands::Admin {
                action: AdminAction::Create { phone, email },
            } => {
                assert_eq!(phone, "5551234567");
                assert!(email.is_none());
            }
            _ => panic!("expected admin create"),
        }
    }

    #[test]
    fn test_remove_defaults_to_unconfirmed() {
        let cli = Cli::try_parse_from(["mp-cli", "admin", "remove"])
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(
            cli.command,
            Commands::Admin {
                action: AdminAction::Remove { yes: false }
            }
        ));
    }
}
