// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod client;
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Commission Ledger CLI
#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(version = "1.2.0")]
#[command(about = "Operator tools for the affiliate commission ledger", long_about = None)]
pub struct Cli {
    /// Ledger API base URL
    #[arg(
        long,
        global = true,
        env = "LEDGER_SERVER_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a new affiliate
    Register(commands::RegisterArgs),

    /// Show dashboard stats for an affiliate
    Stats(commands::AffiliateArgs),

    /// Record a commission for a referred customer
    Record(commands::RecordArgs),

    /// Re-evaluate the unlock threshold
    Evaluate(commands::AffiliateArgs),

    /// Withdraw released commission
    Withdraw(commands::WithdrawArgs),

    /// List the most recent commissions
    Recent(commands::RecentArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let client = client::LedgerClient::new(&cli.server)?;
    match cli.command {
        Commands::Register(args) => commands::register(&client, args).await,
        Commands::Stats(args) => commands::stats(&client, args).await,
        Commands::Record(args) => commands::record(&client, args).await,
        Commands::Evaluate(args) => commands::evaluate(&client, args).await,
        Commands::Withdraw(args) => commands::withdraw(&client, args).await,
        Commands::Recent(args) => commands::recent(&client, args).await,
    }
}
