// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod ledger;
pub mod monitoring;
pub mod payments;
pub mod version;

// Re-export main types
pub use config::LedgerConfig;
pub use ledger::{
    AffiliateStats, CommissionEvent, CommissionLedger, CommissionStatus, LedgerError,
    LedgerStore, WithdrawalReceipt,
};
pub use payments::{PaymentMethod, PaymentMethodDirectory, PaymentMethodRegistry};
