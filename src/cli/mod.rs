//! CLI module for Quotagate
//!
//! Provides commands:
//! - `serve`: Start the gateway server
//! - `create-admin`: Bootstrap an admin operator
//! - `create-user`: Register a caller account

use clap::{Parser, Subcommand};

pub mod admin;

/// Quotagate gateway CLI
#[derive(Parser, Debug)]
#[command(name = "quotagate")]
#[command(about = "Quota-gated, cache-aware Gemini request gateway")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Create an admin operator
    CreateAdmin {
        /// Login email
        #[arg(long)]
        email: String,
        /// Login password
        #[arg(long)]
        password: String,
    },
    /// Create a caller account
    CreateUser {
        /// Display name
        #[arg(long)]
        name: String,
        /// Registration number (caller identifier)
        #[arg(long = "reg-no")]
        reg_no: String,
        /// Quota limit (defaults to quota.default_limit)
        #[arg(long)]
        limit: Option<i64>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::CreateAdmin { email, password }) => {
            admin::create_admin(&email, &password).await
        }
        Some(Commands::CreateUser {
            name,
            reg_no,
            limit,
        }) => admin::create_user(&name, &reg_no, limit).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
