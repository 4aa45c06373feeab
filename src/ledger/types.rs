// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::payments::PaymentMethod;

pub type AffiliateId = String;
pub type CustomerId = String;
pub type EventId = Uuid;

/// Lifecycle of a commission event. Variants are declared in lifecycle order
/// so the derived `Ord` doubles as the "only forward" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Released,
    Paid,
}

impl CommissionStatus {
    pub fn can_advance_to(self, next: CommissionStatus) -> bool {
        next > self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionStatus::Pending => "pending",
            CommissionStatus::Released => "released",
            CommissionStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionEvent {
    pub id: EventId,
    pub affiliate_id: AffiliateId,
    pub customer_id: CustomerId,
    pub amount: Decimal,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    /// Insertion order within the affiliate, breaks `created_at` ties.
    pub sequence: u64,
    /// Set on compensating events: the commission this event cancels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverses: Option<EventId>,
}

impl CommissionEvent {
    pub fn is_compensation(&self) -> bool {
        self.reverses.is_some()
    }
}

/// A referred customer (lead) as captured by the referral form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

/// Derived balances. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSnapshot {
    pub pending: Decimal,
    pub released: Decimal,
    pub paid: Decimal,
    pub total_earned: Decimal,
}

/// Dashboard stats object. Field set is consumed verbatim by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateStats {
    pub paid_customers_count: u32,
    pub threshold_target: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub pending_commission: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_earned: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission_rate: Decimal,
    pub can_withdraw: bool,
}

/// Row of the "recent commissions" table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCommission {
    pub id: EventId,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub id: Uuid,
    pub affiliate_id: AffiliateId,
    pub requested_amount: Decimal,
    /// Sum of the events marked paid; can exceed `requested_amount`
    /// because events are never split.
    pub paid_amount: Decimal,
    pub event_ids: Vec<EventId>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateSummary {
    pub affiliate_id: AffiliateId,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission_rate: Decimal,
    pub threshold_target: u32,
    pub paid_customers_count: u32,
    pub threshold_reached_at: Option<DateTime<Utc>>,
}
