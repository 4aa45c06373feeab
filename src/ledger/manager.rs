// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CommissionLedger: authoritative owner of every affiliate account
//!
//! Mutations for one affiliate are serialized by that affiliate's lock;
//! different affiliates never contend. Each mutation runs against a copy of
//! the account, is committed to the store, and only then replaces the live
//! account, so readers see either the state before or after an operation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::account::AffiliateAccount;
use super::errors::LedgerError;
use super::store::LedgerStore;
use super::types::{
    AffiliateId, AffiliateStats, AffiliateSummary, CommissionEvent, Customer, EventId,
    RecentCommission, WithdrawalReceipt,
};
use crate::config::LedgerConfig;
use crate::monitoring::LedgerMetrics;
use crate::payments::PaymentMethodDirectory;

type AccountSlot = Arc<RwLock<AffiliateAccount>>;

pub struct CommissionLedger {
    config: LedgerConfig,
    accounts: RwLock<HashMap<AffiliateId, AccountSlot>>,
    registration: Mutex<()>,
    store: Arc<dyn LedgerStore>,
    payment_methods: Arc<dyn PaymentMethodDirectory>,
    metrics: Arc<LedgerMetrics>,
}

impl CommissionLedger {
    /// Rebuilds in-memory state from everything the store has committed
    pub async fn open(
        config: LedgerConfig,
        store: Arc<dyn LedgerStore>,
        payment_methods: Arc<dyn PaymentMethodDirectory>,
        metrics: Arc<LedgerMetrics>,
    ) -> Result<Self, LedgerError> {
        let mut accounts = HashMap::new();
        for account in store.load_all().await? {
            accounts.insert(
                account.affiliate_id().to_string(),
                Arc::new(RwLock::new(account)),
            );
        }
        info!("Commission ledger opened with {} affiliates", accounts.len());

        Ok(Self {
            config,
            accounts: RwLock::new(accounts),
            registration: Mutex::new(()),
            store,
            payment_methods,
            metrics,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<LedgerMetrics> {
        &self.metrics
    }

    async fn slot(&self, affiliate_id: &str) -> Result<AccountSlot, LedgerError> {
        self.accounts
            .read()
            .await
            .get(affiliate_id)
            .cloned()
            .ok_or_else(|| LedgerError::AffiliateNotFound(affiliate_id.to_string()))
    }

    /// Runs `op` on a copy of the account and publishes it only once the
    /// store has accepted it.
    async fn apply<T, F>(&self, affiliate_id: &str, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut AffiliateAccount) -> Result<T, LedgerError>,
    {
        let slot = self.slot(affiliate_id).await?;
        let mut live = slot.write().await;

        let mut draft = live.clone();
        let output = op(&mut draft)?;

        if let Err(e) = self.store.commit(&draft).await {
            warn!("Commit failed for affiliate {}: {}", affiliate_id, e);
            return Err(e);
        }
        *live = draft;

        Ok(output)
    }

    async fn read<T, F>(&self, affiliate_id: &str, view: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&AffiliateAccount) -> T,
    {
        let slot = self.slot(affiliate_id).await?;
        let account = slot.read().await;
        Ok(view(&account))
    }

    /// Registers a new affiliate; unset rate/threshold fall back to config
    pub async fn register_affiliate(
        &self,
        affiliate_id: &str,
        commission_rate: Option<Decimal>,
        threshold_target: Option<u32>,
    ) -> Result<AffiliateSummary, LedgerError> {
        // only registrations insert into the map, so holding this lock
        // keeps the duplicate check valid across the commit
        let _registering = self.registration.lock().await;
        if self.contains(affiliate_id).await {
            return Err(LedgerError::AffiliateExists(affiliate_id.to_string()));
        }

        let account = AffiliateAccount::new(
            affiliate_id,
            commission_rate.unwrap_or(self.config.default_commission_rate),
            threshold_target.unwrap_or(self.config.default_threshold_target),
            Utc::now(),
        )?;
        self.store.commit(&account).await?;

        let summary = account.summary();
        self.accounts
            .write()
            .await
            .insert(affiliate_id.to_string(), Arc::new(RwLock::new(account)));
        info!(
            "Registered affiliate {} (rate {}%, threshold {})",
            affiliate_id, summary.commission_rate, summary.threshold_target
        );

        Ok(summary)
    }

    pub async fn contains(&self, affiliate_id: &str) -> bool {
        self.accounts.read().await.contains_key(affiliate_id)
    }

    pub async fn affiliate_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn list_affiliates(&self) -> Vec<AffiliateSummary> {
        let slots: Vec<AccountSlot> = self.accounts.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(slots.len());
        for slot in slots {
            summaries.push(slot.read().await.summary());
        }
        summaries.sort_by(|a, b| a.affiliate_id.cmp(&b.affiliate_id));
        summaries
    }

    /// Stores a referred customer's contact details (lead)
    pub async fn register_referral(
        &self,
        affiliate_id: &str,
        customer: Customer,
    ) -> Result<(), LedgerError> {
        self.apply(affiliate_id, |account| {
            account.register_referral(customer);
            Ok(())
        })
        .await
    }

    /// Counts a paying customer and re-evaluates the threshold in the same
    /// step. Returns the ids released by that evaluation.
    pub async fn mark_customer_paying(
        &self,
        affiliate_id: &str,
        customer_id: &str,
    ) -> Result<Vec<EventId>, LedgerError> {
        let released = self
            .apply(affiliate_id, |account| {
                account.mark_customer_paying(customer_id);
                Ok(account.evaluate_threshold(Utc::now()))
            })
            .await?;

        self.log_release(affiliate_id, &released);
        Ok(released)
    }

    /// Appends a pending commission for a customer's qualifying payment.
    /// If the affiliate is at or above its threshold the new event is
    /// released before the operation returns.
    pub async fn record_commission(
        &self,
        affiliate_id: &str,
        customer_id: &str,
        amount: Decimal,
    ) -> Result<CommissionEvent, LedgerError> {
        let (event, released) = self
            .apply(affiliate_id, |account| {
                append_and_release(account, customer_id, amount, Utc::now())
            })
            .await?;

        self.log_recorded(affiliate_id, customer_id, &event);
        self.log_release(affiliate_id, &released);

        Ok(event)
    }

    /// Records a commission computed from the affiliate's rate. A payment
    /// too small to earn a cent still counts the customer as paying but
    /// appends no event, so the result is `None`.
    pub async fn record_customer_payment(
        &self,
        affiliate_id: &str,
        customer_id: &str,
        payment_amount: Decimal,
    ) -> Result<Option<CommissionEvent>, LedgerError> {
        if payment_amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(payment_amount));
        }

        let (event, released) = self
            .apply(affiliate_id, |account| {
                let now = Utc::now();
                let amount = account.commission_for_payment(payment_amount);
                debug!(
                    "Payment of {} from customer {} earns {} for affiliate {}",
                    payment_amount, customer_id, amount, affiliate_id
                );

                if amount.is_zero() {
                    account.mark_customer_paying(customer_id);
                    return Ok((None, account.evaluate_threshold(now)));
                }
                let (event, released) = append_and_release(account, customer_id, amount, now)?;
                Ok((Some(event), released))
            })
            .await?;

        match &event {
            Some(event) => self.log_recorded(affiliate_id, customer_id, event),
            None => info!(
                "Payment of {} from customer {} earns no commission for affiliate {}",
                payment_amount, customer_id, affiliate_id
            ),
        }
        self.log_release(affiliate_id, &released);

        Ok(event)
    }

    /// Releases all pending commissions once the threshold is met. Calling
    /// it again without new commissions is a no-op.
    pub async fn evaluate_threshold(&self, affiliate_id: &str) -> Result<Vec<EventId>, LedgerError> {
        let slot = self.slot(affiliate_id).await?;

        // skip the commit when there is nothing to release
        {
            let account = slot.read().await;
            let mut probe = account.clone();
            if probe.evaluate_threshold(Utc::now()).is_empty()
                && probe.threshold_reached_at() == account.threshold_reached_at()
            {
                return Ok(Vec::new());
            }
        }

        let released = self
            .apply(affiliate_id, |account| Ok(account.evaluate_threshold(Utc::now())))
            .await?;
        self.log_release(affiliate_id, &released);

        Ok(released)
    }

    /// Pays out the oldest released commissions covering `amount`
    pub async fn request_withdrawal(
        &self,
        affiliate_id: &str,
        amount: Decimal,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        // existence check first so an unknown affiliate never hits the directory
        self.slot(affiliate_id).await?;
        let payment_method = self.payment_methods.lookup(affiliate_id).await;

        let result = self
            .apply(affiliate_id, |account| {
                account.withdraw(amount, payment_method, Utc::now())
            })
            .await;

        match &result {
            Ok(receipt) => {
                self.metrics.withdrawals.inc();
                info!(
                    "Withdrawal {} for affiliate {}: requested {}, paid {} across {} commissions via {}",
                    receipt.id,
                    affiliate_id,
                    receipt.requested_amount,
                    receipt.paid_amount,
                    receipt.event_ids.len(),
                    receipt
                        .payment_method
                        .as_ref()
                        .map(|m| m.describe())
                        .unwrap_or_else(|| "no payment method on file".to_string())
                );
            }
            Err(e) => {
                self.metrics.record_withdrawal_failure(e.error_code());
                warn!("Withdrawal rejected for affiliate {}: {}", affiliate_id, e);
            }
        }

        result
    }

    /// Cancels an unpaid commission with a compensating event
    pub async fn void_commission(
        &self,
        affiliate_id: &str,
        event_id: EventId,
    ) -> Result<CommissionEvent, LedgerError> {
        let compensation = self
            .apply(affiliate_id, |account| {
                account.void_commission(event_id, Utc::now())
            })
            .await?;

        self.metrics.commissions_voided.inc();
        info!(
            "Voided commission {} for affiliate {} (compensation {})",
            event_id, affiliate_id, compensation.id
        );
        Ok(compensation)
    }

    pub async fn get_stats(&self, affiliate_id: &str) -> Result<AffiliateStats, LedgerError> {
        self.read(affiliate_id, |account| account.stats()).await
    }

    /// Newest first; `None` uses the configured limit
    pub async fn recent_commissions(
        &self,
        affiliate_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<RecentCommission>, LedgerError> {
        let limit = limit.unwrap_or(self.config.recent_activity_limit);
        self.read(affiliate_id, |account| account.recent_commissions(limit))
            .await
    }

    pub async fn withdrawals(
        &self,
        affiliate_id: &str,
    ) -> Result<Vec<WithdrawalReceipt>, LedgerError> {
        self.read(affiliate_id, |account| account.withdrawals().to_vec())
            .await
    }

    pub async fn commissions(
        &self,
        affiliate_id: &str,
    ) -> Result<Vec<CommissionEvent>, LedgerError> {
        self.read(affiliate_id, |account| account.events().to_vec())
            .await
    }

    fn log_recorded(&self, affiliate_id: &str, customer_id: &str, event: &CommissionEvent) {
        self.metrics.commissions_recorded.inc();
        info!(
            "Recorded commission {} of {} for affiliate {} (customer {})",
            event.id, event.amount, affiliate_id, customer_id
        );
    }

    fn log_release(&self, affiliate_id: &str, released: &[EventId]) {
        if released.is_empty() {
            return;
        }
        self.metrics.record_release(released.len());
        info!(
            "Affiliate {} reached threshold: released {} commissions",
            affiliate_id,
            released.len()
        );
    }
}

/// Appends the commission and evaluates the threshold; returns the event as
/// it stands after the evaluation.
fn append_and_release(
    account: &mut AffiliateAccount,
    customer_id: &str,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(CommissionEvent, Vec<EventId>), LedgerError> {
    let event = account.append_commission(customer_id, amount, now)?;
    let released = account.evaluate_threshold(now);
    let event = account.event(event.id).cloned().unwrap_or(event);
    Ok((event, released))
}
