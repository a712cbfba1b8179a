//! ScoreKeep CLI - operator commands against the hosted backend.
//!
//! # Usage
//!
//! ```bash
//! # Create an account with a role
//! scorekeep-cli users create -e owner@example.com -n "Owner Of Corner Books" \
//!     -a "12 High Street" -p 'Str0ng!Pass' -r store_owner
//!
//! # Create a store, optionally owned by an existing account
//! scorekeep-cli stores create -n "Corner Books" -e hello@cornerbooks.test \
//!     -a "12 High Street" --owner 8d0e3c47-0b3d-4a8e-9d55-6c0f4f1f9b11
//!
//! # Print platform totals
//! scorekeep-cli stats
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Project URL
//! - `SUPABASE_ANON_KEY` - Public API key
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service-role key (required by every command)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "scorekeep-cli")]
#[command(author, version, about = "ScoreKeep operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage stores
    Stores {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Print total users, stores and ratings
    Stats,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a pre-confirmed account with a role
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name (20-60 characters)
        #[arg(short, long)]
        name: String,

        /// Postal address
        #[arg(short, long)]
        address: String,

        /// Initial password (8-16 characters, 1 uppercase, 1 special)
        #[arg(short, long)]
        password: String,

        /// Role (`user`, `store_owner`, `admin`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create a store
    Create {
        /// Store name
        #[arg(short, long)]
        name: String,

        /// Contact email
        #[arg(short, long)]
        email: String,

        /// Postal address
        #[arg(short, long)]
        address: String,

        /// Id of the owning account
        #[arg(long)]
        owner: Option<String>,
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
    let client = commands::connect()?;

    match cli.command {
        Commands::Users { action } => match action {
            UserAction::Create {
                email,
                name,
                address,
                password,
                role,
            } => {
                let input = commands::users::UserInput {
                    email,
                    name,
                    address,
                    password: password.into(),
                    role,
                };
                commands::users::create(&client, input).await?;
            }
        },
        Commands::Stores { action } => match action {
            StoreAction::Create {
                name,
                email,
                address,
                owner,
            } => {
                let input = commands::stores::StoreInput {
                    name,
                    email,
                    address,
                    owner,
                };
                commands::stores::create(&client, input).await?;
            }
        },
        Commands::Stats => commands::stats::print(&client).await?,
    }
    Ok(())
}
