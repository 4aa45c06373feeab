// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use commission_ledger::{
    api::{start_server, AppState},
    config::{prepare_environment, LedgerConfig},
    ledger::{CommissionLedger, JsonFileStore, LedgerStore, MemoryStore},
    monitoring::LedgerMetrics,
    payments::PaymentMethodRegistry,
};
use std::{env, sync::Arc};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so it can set RUST_LOG
    prepare_environment("info");
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Commission Ledger...\n");
    println!("📦 BUILD VERSION: {}", commission_ledger::version::VERSION);
    println!("📅 Build Date: {}", commission_ledger::version::BUILD_DATE);
    println!();

    // File values first, environment overrides on top
    let mut config = match env::var("LEDGER_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            LedgerConfig::from_file(&path)?
        }
        Err(_) => LedgerConfig::default(),
    };
    config.apply_env()?;

    let store: Arc<dyn LedgerStore> = match &config.data_dir {
        Some(dir) => {
            println!("💾 Using JSON file store at {}", dir.display());
            Arc::new(JsonFileStore::open(dir)?)
        }
        None => {
            warn!("LEDGER_DATA_DIR not set, ledger state will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let payment_methods = Arc::new(PaymentMethodRegistry::new());
    let metrics = Arc::new(LedgerMetrics::new()?);
    let listen_addr = config.listen_addr.clone();

    println!(
        "⚙️  Defaults: threshold {} paying customers, commission rate {}%",
        config.default_threshold_target, config.default_commission_rate
    );

    let ledger = CommissionLedger::open(config, store, payment_methods.clone(), metrics).await?;
    println!("✅ Ledger ready");

    let state = AppState {
        ledger: Arc::new(ledger),
        payment_methods,
    };

    println!("🌐 API listening on {}", listen_addr);
    start_server(state, &listen_addr).await?;

    println!("👋 Commission Ledger stopped");
    Ok(())
}
