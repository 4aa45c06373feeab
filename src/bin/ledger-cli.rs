// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use commission_ledger::cli::{execute, Cli};
use commission_ledger::config::prepare_environment;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; .env may set RUST_LOG
    prepare_environment("warn");
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute the command
    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}
