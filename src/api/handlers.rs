// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{CommissionEvent, CommissionStatus, EventId, WithdrawalReceipt};
use crate::payments::PaymentMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub affiliates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAffiliateRequest {
    pub affiliate_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_target: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralRequest {
    pub customer_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayingCustomerRequest {
    pub customer_id: String,
}

/// Either a commission `amount` or the customer's `payment_amount`, from
/// which the commission is derived at the affiliate's rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCommissionRequest {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequestBody {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub released: Vec<EventId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionResponse {
    pub id: EventId,
    pub customer_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverses: Option<EventId>,
}

impl From<CommissionEvent> for CommissionResponse {
    fn from(event: CommissionEvent) -> Self {
        Self {
            id: event.id,
            customer_id: event.customer_id,
            amount: event.amount,
            status: event.status,
            created_at: event.created_at,
            reverses: event.reverses,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub id: Uuid,
    #[serde(with = "rust_decimal::serde::float")]
    pub requested_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_amount: Decimal,
    pub event_ids: Vec<EventId>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

impl From<WithdrawalReceipt> for WithdrawalResponse {
    fn from(receipt: WithdrawalReceipt) -> Self {
        Self {
            id: receipt.id,
            requested_amount: receipt.requested_amount,
            paid_amount: receipt.paid_amount,
            event_ids: receipt.event_ids,
            payment_method: receipt.payment_method,
            created_at: receipt.created_at,
        }
    }
}
