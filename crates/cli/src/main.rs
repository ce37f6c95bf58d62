//! Mani Pedi CLI - catalog seeding and checks.
//!
//! # Usage
//!
//! ```bash
//! # Seed every table from the bundled catalog snapshot
//! manipedi-cli seed
//!
//! # Seed one table from a fixture file
//! manipedi-cli seed --file catalog.json --table gallery
//!
//! # Report row counts as the storefront sees them
//! manipedi-cli check
//! ```
//!
//! # Environment
//!
//! - `SUPABASE_URL` - project URL
//! - `SUPABASE_SERVICE_KEY` - write key, `seed` only
//! - `SUPABASE_ANON_KEY` - public key, `check` only

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use manipedi_core::CatalogTable;

mod commands;

#[derive(Parser)]
#[command(name = "manipedi-cli")]
#[command(author, version, about = "Mani Pedi CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upsert catalog rows into the hosted tables
    Seed {
        /// JSON fixture with one array per table (defaults to the bundled snapshot)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Only seed this table (`services`, `products`, `team`, `testimonials`, `gallery`)
        #[arg(short, long)]
        table: Option<CatalogTable>,
    },
    /// Report row counts of every catalog table
    Check,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "manipedi_cli=info,manipedi_storefront=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { file, table } => commands::seed::run(file.as_deref(), table).await?,
        Commands::Check => commands::check::run().await?,
    }
    Ok(())
}
