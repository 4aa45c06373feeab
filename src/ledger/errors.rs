// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for commission ledger operations
//!
//! Every ledger operation either applies fully or returns one of these
//! without touching state. None of them are retried inside the ledger.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::EventId;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Monetary value was zero or negative
    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Decimal),

    /// Withdrawal exceeds the released balance
    #[error("Insufficient balance: requested {requested}, released {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    /// The affiliate has never reached its unlock threshold
    #[error("Affiliate {affiliate_id} not eligible: {paid_customers}/{threshold_target} paying customers")]
    AffiliateNotEligible {
        affiliate_id: String,
        paid_customers: u32,
        threshold_target: u32,
    },

    #[error("Affiliate not found: {0}")]
    AffiliateNotFound(String),

    #[error("Affiliate already registered: {0}")]
    AffiliateExists(String),

    #[error("Invalid commission rate: {0} (must be in (0, 100])")]
    InvalidRate(Decimal),

    #[error("Invalid threshold target: {0} (must be at least 1)")]
    InvalidThreshold(u32),

    #[error("Commission event not found: {0}")]
    CommissionNotFound(EventId),

    #[error("Commission {0} has already been paid out")]
    CommissionAlreadyPaid(EventId),

    #[error("Commission {0} has already been voided")]
    CommissionAlreadyVoided(EventId),

    /// Persistence layer refused the commit; state was left unchanged
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl LedgerError {
    /// Message shown on the affiliate dashboard
    pub fn user_message(&self) -> String {
        match self {
            LedgerError::InvalidAmount(_) => "Amount must be greater than zero".to_string(),
            LedgerError::InsufficientBalance { available, .. } => {
                format!("Insufficient balance: only {} is available to withdraw", available)
            }
            LedgerError::AffiliateNotEligible {
                paid_customers,
                threshold_target,
                ..
            } => format!(
                "Withdrawals unlock after {} paying customers ({} so far)",
                threshold_target, paid_customers
            ),
            LedgerError::AffiliateNotFound(_) => "Affiliate account not found".to_string(),
            LedgerError::Storage(_) => {
                "The ledger is temporarily unavailable, please try again".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::AffiliateNotEligible { .. } => "AFFILIATE_NOT_ELIGIBLE",
            LedgerError::AffiliateNotFound(_) => "AFFILIATE_NOT_FOUND",
            LedgerError::AffiliateExists(_) => "AFFILIATE_EXISTS",
            LedgerError::InvalidRate(_) => "INVALID_RATE",
            LedgerError::InvalidThreshold(_) => "INVALID_THRESHOLD",
            LedgerError::CommissionNotFound(_) => "COMMISSION_NOT_FOUND",
            LedgerError::CommissionAlreadyPaid(_) => "COMMISSION_ALREADY_PAID",
            LedgerError::CommissionAlreadyVoided(_) => "COMMISSION_ALREADY_VOIDED",
            LedgerError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Only a failed commit may succeed on an identical retry; every other
    /// error needs a state change first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}
