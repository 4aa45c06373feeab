// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod account;
pub mod errors;
pub mod manager;
pub mod store;
pub mod types;

pub use account::AffiliateAccount;
pub use errors::LedgerError;
pub use manager::CommissionLedger;
pub use store::{JsonFileStore, LedgerStore, MemoryStore};
pub use types::{
    AffiliateId, AffiliateStats, AffiliateSummary, BalanceSnapshot, CommissionEvent,
    CommissionStatus, Customer, CustomerId, EventId, RecentCommission, WithdrawalReceipt,
};
