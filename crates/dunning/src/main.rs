// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dunning - scheduled payment reminders over WhatsApp.
//!
//! This is the binary entry point for the dunning dispatcher.

mod admin;
mod serve;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dunning_config::DunningConfig;
use dunning_core::{DunningError, MessageStatus, TenantId};
use dunning_credit::CreditGate;
use dunning_storage::SqliteStore;
use serde::Serialize;
use tracing::error;

/// Dunning - scheduled payment reminders over WhatsApp.
#[derive(Parser, Debug)]
#[command(name = "dunning", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run reminders on the configured schedule until interrupted.
    Serve,
    /// Run every tenant once now and print the run summary as JSON.
    RunOnce,
    /// List message attempts for a tenant, newest first.
    Messages {
        tenant: String,
        /// Only attempts in this status (pending, sent, delivered, read, failed).
        #[arg(long)]
        status: Option<MessageStatus>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show a tenant's credit balance and recent ledger entries.
    Credits { tenant: String },
    /// Add purchased credits to a tenant.
    TopUp {
        tenant: String,
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        amount: i64,
        /// Purchase reference recorded on the ledger entry.
        #[arg(long)]
        reference: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => dunning_config::load_and_validate_path(path),
        None => dunning_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            dunning_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.logging);

    let Some(command) = cli.command else {
        println!("dunning: use --help for available commands");
        return;
    };

    if let Err(e) = run(command, config).await {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: DunningConfig) -> Result<(), DunningError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::RunOnce => print_json(&serve::run_once(config).await?),
        Commands::Messages {
            tenant,
            status,
            limit,
        } => {
            let store = SqliteStore::open(&config.storage).await?;
            let attempts =
                admin::list_messages(&store, &TenantId::from(tenant.as_str()), status, limit)
                    .await?;
            print_json(&attempts)
        }
        Commands::Credits { tenant } => {
            let store = SqliteStore::open(&config.storage).await?;
            let statement =
                admin::credit_statement(&store, &store, &TenantId::from(tenant.as_str())).await?;
            print_json(&statement)
        }
        Commands::TopUp {
            tenant,
            amount,
            reference,
        } => {
            let store = Arc::new(SqliteStore::open(&config.storage).await?);
            let gate = CreditGate::new(store);
            let receipt =
                admin::top_up(&gate, &TenantId::from(tenant.as_str()), amount, reference).await?;
            print_json(&receipt)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DunningError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| DunningError::Internal(format!("cannot render output: {e}")))?;
    println!("{json}");
    Ok(())
}
