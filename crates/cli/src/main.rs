//! Taxpoint CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! tp-cli migrate
//!
//! # Create (or promote) an admin account
//! tp-cli admin create -e owner@taxpoint.test -n "Owner" -p 'long-password'
//!
//! # Replace the navigation menu from a JSON file
//! tp-cli menu seed data/menu.seed.json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tp-cli")]
#[command(author, version, about = "Taxpoint CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage the navigation menu
    Menu {
        #[command(subcommand)]
        action: MenuAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin account, or promote an existing one
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 8 characters)
        #[arg(short, long, env = "TAXPOINT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum MenuAction {
    /// Replace the menu with the items in a JSON file
    Seed {
        /// Path to a JSON array of menu items
        file: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => commands::admin::create(&email, &name, &password).await?,
        },
        Commands::Menu { action } => match action {
            MenuAction::Seed { file } => {
                commands::menu::seed(&file).await?;
            }
        },
    }
    Ok(())
}
