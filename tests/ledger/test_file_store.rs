// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use commission_ledger::{
    config::LedgerConfig,
    ledger::{CommissionLedger, CommissionStatus, JsonFileStore, LedgerError},
    monitoring::LedgerMetrics,
    payments::PaymentMethodRegistry,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use super::common::usd;

async fn open_at(dir: &Path) -> CommissionLedger {
    try_open_at(dir).await.expect("Failed to open ledger")
}

async fn try_open_at(dir: &Path) -> Result<CommissionLedger, LedgerError> {
    CommissionLedger::open(
        LedgerConfig::default(),
        Arc::new(JsonFileStore::open(dir).expect("Failed to open store")),
        Arc::new(PaymentMethodRegistry::new()),
        Arc::new(LedgerMetrics::new().expect("metrics")),
    )
    .await
}

#[tokio::test]
async fn test_ledger_state_survives_restart() {
    let dir = TempDir::new().unwrap();

    let (stats, receipt) = {
        let ledger = open_at(dir.path()).await;
        ledger.register_affiliate("aff-1", None, Some(2)).await.unwrap();
        ledger.record_commission("aff-1", "c1", usd(20)).await.unwrap();
        ledger.record_commission("aff-1", "c2", usd(30)).await.unwrap();
        let receipt = ledger.request_withdrawal("aff-1", usd(20)).await.unwrap();
        (ledger.get_stats("aff-1").await.unwrap(), receipt)
    };

    let reopened = open_at(dir.path()).await;
    assert!(reopened.contains("aff-1").await);
    assert_eq!(reopened.get_stats("aff-1").await.unwrap(), stats);
    assert_eq!(reopened.withdrawals("aff-1").await.unwrap(), vec![receipt]);

    // sequence numbers keep increasing after reload
    let late = reopened.record_commission("aff-1", "c3", usd(5)).await.unwrap();
    assert_eq!(late.status, CommissionStatus::Released);
    let events = reopened.commissions("aff-1").await.unwrap();
    let max_before = events
        .iter()
        .filter(|e| e.id != late.id)
        .map(|e| e.sequence)
        .max()
        .unwrap();
    assert!(late.sequence > max_before);
}

#[tokio::test]
async fn test_rejected_operation_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let ledger = open_at(dir.path()).await;
    ledger.register_affiliate("aff-1", None, Some(1)).await.unwrap();
    ledger.record_commission("aff-1", "c1", usd(10)).await.unwrap();
    let before = ledger.get_stats("aff-1").await.unwrap();

    assert!(ledger.request_withdrawal("aff-1", usd(500)).await.is_err());

    let reopened = open_at(dir.path()).await;
    assert_eq!(reopened.get_stats("aff-1").await.unwrap(), before);
    assert!(reopened.withdrawals("aff-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_account_file_blocks_open() {
    let dir = TempDir::new().unwrap();
    {
        let ledger = open_at(dir.path()).await;
        ledger.register_affiliate("aff-1", None, Some(1)).await.unwrap();
        ledger.record_commission("aff-1", "c1", usd(500)).await.unwrap();
    }

    let account_file = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .unwrap();
    let bytes = std::fs::read(&account_file).unwrap();
    std::fs::write(&account_file, &bytes[..bytes.len() - 5]).unwrap();

    // starting without the affiliate would let a re-registration erase it
    assert!(matches!(
        try_open_at(dir.path()).await,
        Err(LedgerError::Storage(_))
    ));
    assert_eq!(std::fs::read(&account_file).unwrap().len(), bytes.len() - 5);
}
