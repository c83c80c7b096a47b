//! Shadow ledger: a local mirror of per-category cumulative amounts the
//! remote ledger does not expose in the shape the presentation layer
//! needs. Mutated only from confirmed operations, persisted synchronously
//! with every mutation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, U256};
use ledgerflow_primitives::intent::OperationKind;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::SessionStore;

/// Buckets the shadow ledger tracks per asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBucket {
    Deposited,
    Borrowed,
    Swapped,
    Pooled,
}

/// Key of one shadow ledger category: an asset within a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub bucket: CategoryBucket,
    pub asset: Address,
}

impl CategoryKey {
    /// Category mapping for a confirmed operation, together with the
    /// direction of its delta.
    #[must_use]
    pub fn for_operation(kind: OperationKind, asset: Address) -> (Self, Direction) {
        let (bucket, direction) = match kind {
            OperationKind::Deposit => (CategoryBucket::Deposited, Direction::Credit),
            OperationKind::Withdraw => (CategoryBucket::Deposited, Direction::Debit),
            OperationKind::CreateLoan => (CategoryBucket::Borrowed, Direction::Credit),
            OperationKind::RepayLoan => (CategoryBucket::Borrowed, Direction::Debit),
            OperationKind::Swap => (CategoryBucket::Swapped, Direction::Credit),
            OperationKind::CreatePool => (CategoryBucket::Pooled, Direction::Credit),
        };
        (Self { bucket, asset }, direction)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bucket = match self.bucket {
            CategoryBucket::Deposited => "deposited",
            CategoryBucket::Borrowed => "borrowed",
            CategoryBucket::Swapped => "swapped",
            CategoryBucket::Pooled => "pooled",
        };
        write!(f, "{bucket}:{}", self.asset)
    }
}

/// Direction of a confirmed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

/// Per-category cumulative amounts, loaded from and flushed to the
/// session store. The saga driver is the only writer; it calls
/// `credit`/`debit` exactly once per confirmed operation.
#[derive(Debug)]
pub struct ShadowLedger {
    store: Arc<SessionStore>,
    entries: Mutex<HashMap<CategoryKey, U256>>,
}

impl ShadowLedger {
    pub fn new(store: Arc<SessionStore>) -> Self {
        let entries = store.shadow_entries();
        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    pub fn credit(&self, category: CategoryKey, amount: U256) -> Result<()> {
        let mut entries = self.entries.lock().expect("shadow ledger lock poisoned");
        let current = entries.entry(category).or_insert(U256::ZERO);
        *current = current.saturating_add(amount);
        let updated = *current;
        drop(entries);
        tracing::info!(%category, %amount, %updated, "shadow ledger credit");
        self.store.write_shadow_entry(category, updated)
    }

    /// Debits `amount` from `category`, clamping at zero. A clamp means
    /// the shadow ledger has drifted from the true remote state; it is
    /// logged as a degraded-consistency warning, not surfaced as an error.
    pub fn debit(&self, category: CategoryKey, amount: U256) -> Result<()> {
        let mut entries = self.entries.lock().expect("shadow ledger lock poisoned");
        let current = entries.entry(category).or_insert(U256::ZERO);
        if *current < amount {
            tracing::warn!(
                %category,
                available = %current,
                requested = %amount,
                "shadow ledger debit clamped at zero, local mirror has drifted"
            );
            *current = U256::ZERO;
        } else {
            *current -= amount;
        }
        let updated = *current;
        drop(entries);
        tracing::info!(%category, %amount, %updated, "shadow ledger debit");
        self.store.write_shadow_entry(category, updated)
    }

    #[must_use]
    pub fn total_of(&self, category: CategoryKey) -> U256 {
        let entries = self.entries.lock().expect("shadow ledger lock poisoned");
        entries.get(&category).copied().unwrap_or(U256::ZERO)
    }

    /// Sum over all categories. Always recomputed, never stored, so it
    /// cannot drift from the per-category entries.
    #[must_use]
    pub fn aggregate(&self) -> U256 {
        let entries = self.entries.lock().expect("shadow ledger lock poisoned");
        entries
            .values()
            .fold(U256::ZERO, |acc, v| acc.saturating_add(*v))
    }

    #[must_use]
    pub fn totals(&self) -> HashMap<CategoryKey, U256> {
        self.entries
            .lock()
            .expect("shadow ledger lock poisoned")
            .clone()
    }
}
