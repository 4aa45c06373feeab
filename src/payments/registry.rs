// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use super::methods::{PaymentMethod, PaymentMethodError};

/// Read side used by the ledger when fulfilling withdrawals
#[async_trait]
pub trait PaymentMethodDirectory: Send + Sync {
    async fn lookup(&self, affiliate_id: &str) -> Option<PaymentMethod>;
}

/// In-memory payout method records, one per affiliate
#[derive(Default)]
pub struct PaymentMethodRegistry {
    methods: RwLock<HashMap<String, PaymentMethod>>,
}

impl PaymentMethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and stores the method, replacing any previous one
    pub async fn upsert(
        &self,
        affiliate_id: &str,
        method: PaymentMethod,
    ) -> Result<Option<PaymentMethod>, PaymentMethodError> {
        method.validate()?;
        info!(
            "Payment method for affiliate {} set to {}",
            affiliate_id,
            method.describe()
        );
        Ok(self
            .methods
            .write()
            .await
            .insert(affiliate_id.to_string(), method))
    }

    pub async fn remove(&self, affiliate_id: &str) -> Option<PaymentMethod> {
        self.methods.write().await.remove(affiliate_id)
    }
}

#[async_trait]
impl PaymentMethodDirectory for PaymentMethodRegistry {
    async fn lookup(&self, affiliate_id: &str) -> Option<PaymentMethod> {
        self.methods.read().await.get(affiliate_id).cloned()
    }
}
