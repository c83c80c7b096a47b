//! Intent store: a single slot per intent key bridging the asynchronous
//! gap between "authorization requested" and "authorization confirmed".
//!
//! `park` overwrites any existing slot for the same key; that is the
//! defined behavior for "user changed their mind while an authorization
//! was in flight". Each park hands out a [`SagaTicket`]; the resuming
//! saga takes its intent back only if the slot still carries its ticket,
//! so a superseded saga observes `None` while the superseding saga's
//! intent survives the stale resume. `take` is destructive: a second take
//! with the same ticket returns `None`, which makes double-resumption
//! from a repeated confirmation event a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use ledgerflow_primitives::intent::{IntentKey, OperationIntent};

/// Token identifying one park. Monotonic per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SagaTicket(u64);

#[derive(Debug)]
struct Slot {
    intent: OperationIntent,
    ticket: SagaTicket,
}

#[derive(Debug, Default)]
pub struct IntentStore {
    slots: Mutex<HashMap<IntentKey, Slot>>,
    next_ticket: AtomicU64,
}

impl IntentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks `intent` under its key, overwriting (and thereby abandoning)
    /// any previously parked intent for the same key.
    pub fn park(&self, intent: OperationIntent) -> SagaTicket {
        let ticket = SagaTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        let key = intent.key();
        let mut slots = self.slots.lock().expect("intent store lock poisoned");
        if let Some(previous) = slots.insert(key, Slot { intent, ticket }) {
            tracing::info!(
                actor = %key.actor,
                kind = previous.intent.kind.as_str(),
                "parked intent superseded by a newer one"
            );
        }
        ticket
    }

    /// Atomically removes and returns the intent parked under `key`, but
    /// only if the slot still belongs to `ticket`. Returns `None` when the
    /// slot is empty (already consumed) or carries a newer park.
    pub fn take(&self, key: IntentKey, ticket: SagaTicket) -> Option<OperationIntent> {
        let mut slots = self.slots.lock().expect("intent store lock poisoned");
        let owned = slots.get(&key).is_some_and(|slot| slot.ticket == ticket);
        if owned {
            slots.remove(&key).map(|slot| slot.intent)
        } else {
            None
        }
    }

    /// Removes whatever is parked under `key`, regardless of ticket.
    pub fn clear(&self, key: IntentKey) {
        let mut slots = self.slots.lock().expect("intent store lock poisoned");
        slots.remove(&key);
    }

    /// Whether a slot currently exists for `key`.
    #[must_use]
    pub fn is_parked(&self, key: IntentKey) -> bool {
        let slots = self.slots.lock().expect("intent store lock poisoned");
        slots.contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use ledgerflow_primitives::intent::OperationKind;

    fn intent(amount: u64) -> OperationIntent {
        OperationIntent::new(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            U256::from(amount),
            OperationKind::Deposit,
            None,
        )
        .unwrap()
    }

    #[test]
    fn take_is_destructive() {
        let store = IntentStore::new();
        let parked = intent(100);
        let key = parked.key();
        let ticket = store.park(parked.clone());
        assert_eq!(store.take(key, ticket), Some(parked));
        assert_eq!(store.take(key, ticket), None);
    }

    #[test]
    fn newer_park_wins_and_stale_take_misses() {
        let store = IntentStore::new();
        let old = intent(100);
        let new = intent(250);
        let key = old.key();
        let old_ticket = store.park(old);
        let new_ticket = store.park(new.clone());
        // The superseded saga's take must miss without disturbing the
        // newer slot.
        assert_eq!(store.take(key, old_ticket), None);
        assert_eq!(store.take(key, new_ticket), Some(new));
    }

    #[test]
    fn clear_discards_any_ticket() {
        let store = IntentStore::new();
        let parked = intent(100);
        let key = parked.key();
        let ticket = store.park(parked);
        store.clear(key);
        assert!(!store.is_parked(key));
        assert_eq!(store.take(key, ticket), None);
    }
}
