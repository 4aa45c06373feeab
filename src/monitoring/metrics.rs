// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// src/monitoring/metrics.rs - Ledger counters and Prometheus export

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct LedgerMetrics {
    registry: Registry,
    pub commissions_recorded: IntCounter,
    pub threshold_releases: IntCounter,
    pub events_released: IntCounter,
    pub withdrawals: IntCounter,
    pub withdrawal_failures: IntCounterVec,
    pub commissions_voided: IntCounter,
}

impl LedgerMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("commission_ledger".to_string()), None)?;

        let commissions_recorded = IntCounter::new(
            "commissions_recorded_total",
            "Commission events appended",
        )?;
        let threshold_releases = IntCounter::new(
            "threshold_releases_total",
            "Batch releases triggered by an affiliate reaching its threshold",
        )?;
        let events_released = IntCounter::new(
            "events_released_total",
            "Commission events moved from pending to released",
        )?;
        let withdrawals = IntCounter::new("withdrawals_total", "Fulfilled withdrawals")?;
        let withdrawal_failures = IntCounterVec::new(
            Opts::new("withdrawal_failures_total", "Rejected withdrawal requests"),
            &["reason"],
        )?;
        let commissions_voided = IntCounter::new(
            "commissions_voided_total",
            "Commissions cancelled by a compensating event",
        )?;

        registry.register(Box::new(commissions_recorded.clone()))?;
        registry.register(Box::new(threshold_releases.clone()))?;
        registry.register(Box::new(events_released.clone()))?;
        registry.register(Box::new(withdrawals.clone()))?;
        registry.register(Box::new(withdrawal_failures.clone()))?;
        registry.register(Box::new(commissions_voided.clone()))?;

        Ok(Self {
            registry,
            commissions_recorded,
            threshold_releases,
            events_released,
            withdrawals,
            withdrawal_failures,
            commissions_voided,
        })
    }

    pub fn record_release(&self, released: usize) {
        if released > 0 {
            self.threshold_releases.inc();
            self.events_released.inc_by(released as u64);
        }
    }

    pub fn record_withdrawal_failure(&self, error_code: &str) {
        self.withdrawal_failures
            .with_label_values(&[error_code])
            .inc();
    }

    /// Prometheus text exposition format
    pub fn export(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
