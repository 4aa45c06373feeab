// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistence for affiliate accounts
//!
//! The ledger commits a whole `AffiliateAccount` after every successful
//! mutation. A commit either lands completely or returns an error, in which
//! case the ledger discards the mutation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::account::AffiliateAccount;
use super::errors::LedgerError;
use super::types::AffiliateId;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<AffiliateAccount>, LedgerError>;

    async fn commit(&self, account: &AffiliateAccount) -> Result<(), LedgerError>;
}

/// Keeps committed accounts in memory; state is lost on restart
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<AffiliateId, AffiliateAccount>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn get(&self, affiliate_id: &str) -> Option<AffiliateAccount> {
        self.accounts.read().await.get(affiliate_id).cloned()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<AffiliateAccount>, LedgerError> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }

    async fn commit(&self, account: &AffiliateAccount) -> Result<(), LedgerError> {
        self.accounts
            .write()
            .await
            .insert(account.affiliate_id().to_string(), account.clone());
        Ok(())
    }
}

/// One JSON document per affiliate under `dir`. Files are named by the hex
/// encoding of the affiliate id so arbitrary ids are filesystem safe.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, affiliate_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", hex::encode(affiliate_id.as_bytes())))
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<AffiliateAccount>, LedgerError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<AffiliateAccount>, LedgerError> {
            let mut accounts = Vec::new();
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let bytes = std::fs::read(&path)?;
                // a skipped account would be re-registered and overwritten
                let account = serde_json::from_slice::<AffiliateAccount>(&bytes).map_err(|e| {
                    warn!("Unreadable account file {}: {}", path.display(), e);
                    LedgerError::Storage(format!(
                        "unreadable account file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                accounts.push(account);
            }
            debug!("Loaded {} affiliate accounts from {}", accounts.len(), dir.display());
            Ok(accounts)
        })
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?
    }

    async fn commit(&self, account: &AffiliateAccount) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec_pretty(account)?;
        let dir = self.dir.clone();
        let path = self.path_for(account.affiliate_id());

        tokio::task::spawn_blocking(move || -> Result<(), LedgerError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| LedgerError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?
    }
}
