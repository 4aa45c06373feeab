// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Ledger service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Paying customers an affiliate needs before commissions unlock
    pub default_threshold_target: u32,
    /// Commission percentage for affiliates registered without one
    pub default_commission_rate: Decimal,
    /// Rows returned by the recent-commissions listing when no limit is given
    pub recent_activity_limit: usize,
    /// JSON file store location; memory only when unset
    pub data_dir: Option<PathBuf>,
    pub listen_addr: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_threshold_target: 10,
            default_commission_rate: Decimal::from(10),
            recent_activity_limit: 10,
            data_dir: None,
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from a TOML file. Settings may sit at the top
    /// level or under a `[ledger]` table.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_value: toml::Value = toml::from_str(content)?;

        let table = match toml_value.get("ledger") {
            Some(ledger) => ledger.clone(),
            None => toml_value,
        };
        let config: LedgerConfig = table.try_into()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Environment variables take precedence over file values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("LEDGER_THRESHOLD_TARGET") {
            self.default_threshold_target = val
                .parse()
                .with_context(|| format!("Invalid LEDGER_THRESHOLD_TARGET: {}", val))?;
        }

        if let Ok(val) = std::env::var("LEDGER_COMMISSION_RATE") {
            self.default_commission_rate = Decimal::from_str(&val)
                .with_context(|| format!("Invalid LEDGER_COMMISSION_RATE: {}", val))?;
        }

        if let Ok(val) = std::env::var("LEDGER_RECENT_LIMIT") {
            self.recent_activity_limit = val
                .parse()
                .with_context(|| format!("Invalid LEDGER_RECENT_LIMIT: {}", val))?;
        }

        if let Ok(val) = std::env::var("LEDGER_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("LEDGER_LISTEN_ADDR") {
            self.listen_addr = val;
        }

        Ok(())
    }
}
