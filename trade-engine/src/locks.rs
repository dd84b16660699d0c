//! Per-account mutual exclusion for settlement operations.
//!
//! A purchase or refund touches both the buyer's and the seller's ledger
//! record; without a guard, two concurrent settlements over the same
//! accounts could interleave their read-modify-write sequences. Locks are
//! always acquired in ascending account-id order so two settlements sharing
//! both accounts cannot deadlock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lock manager keyed by account ID
pub struct AccountLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

/// Guard holding the locks for the accounts of one settlement
pub struct SettlementGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

impl AccountLocks {
    /// Create a new lock manager
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock a single account
    pub async fn lock_account(&self, id: Uuid) -> SettlementGuard {
        let guard = self.lock_for(id).lock_owned().await;
        SettlementGuard {
            _first: guard,
            _second: None,
        }
    }

    /// Lock two accounts in ascending-id order
    pub async fn lock_pair(&self, a: Uuid, b: Uuid) -> SettlementGuard {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let first = self.lock_for(lo).lock_owned().await;
        let second = if lo != hi {
            Some(self.lock_for(hi).lock_owned().await)
        } else {
            None
        };

        SettlementGuard {
            _first: first,
            _second: second,
        }
    }
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::new()
    }
}
