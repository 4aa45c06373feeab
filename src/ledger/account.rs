// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-affiliate commission aggregate
//!
//! `AffiliateAccount` owns one affiliate's events, paying customers and
//! withdrawal history. It is plain synchronous data: `CommissionLedger` takes
//! a copy, applies one operation to it, commits the copy and publishes it,
//! so an operation that fails half way never becomes visible.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

use super::errors::LedgerError;
use super::types::{
    AffiliateId, AffiliateStats, AffiliateSummary, BalanceSnapshot, CommissionEvent,
    CommissionStatus, Customer, CustomerId, EventId, RecentCommission, WithdrawalReceipt,
};
use crate::payments::PaymentMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateAccount {
    affiliate_id: AffiliateId,
    commission_rate: Decimal,
    threshold_target: u32,
    /// First time the paying-customer count reached the target. Sticky.
    threshold_reached_at: Option<DateTime<Utc>>,
    paying_customers: BTreeSet<CustomerId>,
    customers: BTreeMap<CustomerId, Customer>,
    events: Vec<CommissionEvent>,
    withdrawals: Vec<WithdrawalReceipt>,
    next_sequence: u64,
    created_at: DateTime<Utc>,
}

impl AffiliateAccount {
    pub fn new(
        affiliate_id: impl Into<AffiliateId>,
        commission_rate: Decimal,
        threshold_target: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if commission_rate <= Decimal::ZERO || commission_rate > Decimal::ONE_HUNDRED {
            return Err(LedgerError::InvalidRate(commission_rate));
        }
        if threshold_target == 0 {
            return Err(LedgerError::InvalidThreshold(threshold_target));
        }

        Ok(Self {
            affiliate_id: affiliate_id.into(),
            commission_rate,
            threshold_target,
            threshold_reached_at: None,
            paying_customers: BTreeSet::new(),
            customers: BTreeMap::new(),
            events: Vec::new(),
            withdrawals: Vec::new(),
            next_sequence: 0,
            created_at: now,
        })
    }

    pub fn affiliate_id(&self) -> &str {
        &self.affiliate_id
    }

    pub fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    pub fn threshold_target(&self) -> u32 {
        self.threshold_target
    }

    pub fn threshold_reached_at(&self) -> Option<DateTime<Utc>> {
        self.threshold_reached_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn paid_customers_count(&self) -> u32 {
        self.paying_customers.len() as u32
    }

    pub fn events(&self) -> &[CommissionEvent] {
        &self.events
    }

    pub fn withdrawals(&self) -> &[WithdrawalReceipt] {
        &self.withdrawals
    }

    pub fn customer(&self, customer_id: &str) -> Option<&Customer> {
        self.customers.get(customer_id)
    }

    pub fn event(&self, event_id: EventId) -> Option<&CommissionEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }

    fn threshold_met(&self) -> bool {
        self.paid_customers_count() >= self.threshold_target
    }

    /// Originals that have been cancelled by a compensating event
    fn voided_ids(&self) -> HashSet<EventId> {
        self.events.iter().filter_map(|e| e.reverses).collect()
    }

    /// Events that count towards balances: not a compensation, not voided
    fn live_events(&self) -> impl Iterator<Item = &CommissionEvent> {
        let voided = self.voided_ids();
        self.events
            .iter()
            .filter(move |e| !e.is_compensation() && !voided.contains(&e.id))
    }

    pub fn register_referral(&mut self, customer: Customer) {
        self.customers.insert(customer.id.clone(), customer);
    }

    /// Returns true when the customer was not already counted
    pub fn mark_customer_paying(&mut self, customer_id: &str) -> bool {
        self.paying_customers.insert(customer_id.to_string())
    }

    /// Appends a pending commission. The customer becomes a paying customer.
    pub fn append_commission(
        &mut self,
        customer_id: &str,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<CommissionEvent, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let event = CommissionEvent {
            id: Uuid::new_v4(),
            affiliate_id: self.affiliate_id.clone(),
            customer_id: customer_id.to_string(),
            amount,
            status: CommissionStatus::Pending,
            created_at: now,
            sequence: self.take_sequence(),
            reverses: None,
        };
        self.events.push(event.clone());
        self.mark_customer_paying(customer_id);

        Ok(event)
    }

    /// Commission owed on a customer payment at this affiliate's rate,
    /// rounded to cents.
    pub fn commission_for_payment(&self, payment_amount: Decimal) -> Decimal {
        (payment_amount * self.commission_rate / Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Releases every pending event at once when the threshold is met.
    /// Returns the released ids; empty when nothing changed.
    pub fn evaluate_threshold(&mut self, now: DateTime<Utc>) -> Vec<EventId> {
        if !self.threshold_met() {
            return Vec::new();
        }
        if self.threshold_reached_at.is_none() {
            self.threshold_reached_at = Some(now);
        }

        let voided = self.voided_ids();
        let mut released = Vec::new();
        for event in self.events.iter_mut() {
            if event.status == CommissionStatus::Pending
                && !event.is_compensation()
                && !voided.contains(&event.id)
            {
                event.status = CommissionStatus::Released;
                released.push(event.id);
            }
        }
        released
    }

    /// Pays out the oldest released commissions until `amount` is covered.
    pub fn withdraw(
        &mut self,
        amount: Decimal,
        payment_method: Option<PaymentMethod>,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if self.threshold_reached_at.is_none() {
            return Err(LedgerError::AffiliateNotEligible {
                affiliate_id: self.affiliate_id.clone(),
                paid_customers: self.paid_customers_count(),
                threshold_target: self.threshold_target,
            });
        }

        let available = self.balances().released;
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let mut released: Vec<(DateTime<Utc>, u64, EventId, Decimal)> = self
            .live_events()
            .filter(|e| e.status == CommissionStatus::Released)
            .map(|e| (e.created_at, e.sequence, e.id, e.amount))
            .collect();
        released.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut selected = Vec::new();
        let mut covered = Decimal::ZERO;
        for (_, _, id, event_amount) in released {
            if covered >= amount {
                break;
            }
            covered += event_amount;
            selected.push(id);
        }

        for event in self.events.iter_mut() {
            if selected.contains(&event.id) {
                debug_assert!(event.status.can_advance_to(CommissionStatus::Paid));
                event.status = CommissionStatus::Paid;
            }
        }

        let receipt = WithdrawalReceipt {
            id: Uuid::new_v4(),
            affiliate_id: self.affiliate_id.clone(),
            requested_amount: amount,
            paid_amount: covered,
            event_ids: selected,
            payment_method,
            created_at: now,
        };
        self.withdrawals.push(receipt.clone());

        Ok(receipt)
    }

    /// Cancels an unpaid commission by appending a compensating event.
    pub fn void_commission(
        &mut self,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> Result<CommissionEvent, LedgerError> {
        let original = self
            .event(event_id)
            .ok_or(LedgerError::CommissionNotFound(event_id))?
            .clone();

        if original.is_compensation() || self.voided_ids().contains(&event_id) {
            return Err(LedgerError::CommissionAlreadyVoided(event_id));
        }
        if original.status == CommissionStatus::Paid {
            return Err(LedgerError::CommissionAlreadyPaid(event_id));
        }

        let compensation = CommissionEvent {
            id: Uuid::new_v4(),
            affiliate_id: self.affiliate_id.clone(),
            customer_id: original.customer_id.clone(),
            amount: -original.amount,
            status: CommissionStatus::Paid,
            created_at: now,
            sequence: self.take_sequence(),
            reverses: Some(event_id),
        };
        self.events.push(compensation.clone());

        Ok(compensation)
    }

    pub fn balances(&self) -> BalanceSnapshot {
        let mut snapshot = BalanceSnapshot::default();
        for event in self.live_events() {
            match event.status {
                CommissionStatus::Pending => snapshot.pending += event.amount,
                CommissionStatus::Released => snapshot.released += event.amount,
                CommissionStatus::Paid => snapshot.paid += event.amount,
            }
            snapshot.total_earned += event.amount;
        }
        snapshot
    }

    pub fn stats(&self) -> AffiliateStats {
        let balances = self.balances();
        let paid_customers_count = self.paid_customers_count();

        AffiliateStats {
            paid_customers_count,
            threshold_target: self.threshold_target,
            pending_commission: balances.pending,
            commission_balance: balances.released,
            total_earned: balances.total_earned,
            commission_rate: self.commission_rate,
            can_withdraw: balances.released > Decimal::ZERO
                && paid_customers_count >= self.threshold_target,
        }
    }

    /// Newest first, compensations included so refunds show up in the feed
    pub fn recent_commissions(&self, limit: usize) -> Vec<RecentCommission> {
        let mut events: Vec<&CommissionEvent> = self.events.iter().collect();
        events.sort_by(|a, b| (b.created_at, b.sequence).cmp(&(a.created_at, a.sequence)));

        events
            .into_iter()
            .take(limit)
            .map(|e| {
                let customer = self.customers.get(&e.customer_id);
                RecentCommission {
                    id: e.id,
                    customer_name: customer.map(|c| c.name.clone()),
                    customer_email: customer.map(|c| c.email.clone()),
                    amount: e.amount,
                    status: e.status,
                    created_at: e.created_at,
                }
            })
            .collect()
    }

    pub fn summary(&self) -> AffiliateSummary {
        AffiliateSummary {
            affiliate_id: self.affiliate_id.clone(),
            commission_rate: self.commission_rate,
            threshold_target: self.threshold_target,
            paid_customers_count: self.paid_customers_count(),
            threshold_reached_at: self.threshold_reached_at,
        }
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}
