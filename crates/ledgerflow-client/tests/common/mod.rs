//! Shared test helpers: a programmable in-memory remote ledger and
//! config/fixture builders.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, FixedBytes, B256, U256};
use async_trait::async_trait;
use ledgerflow_client::config::ClientConfig;
use ledgerflow_primitives::intent::{OperationIntent, OperationKind};
use ledgerflow_primitives::ledger::{
    Confirmation, OperationCall, RemoteLedger, TxHandle, TxReceipt, TxStatus,
};
use ledgerflow_primitives::quote::QuoteQuery;
use ledgerflow_primitives::resource::{PairKey, ResourceId};
use ledgerflow_primitives::{PrimitivesError, Result};
use tokio::sync::Notify;

pub const ACTOR: Address = Address::repeat_byte(0xA1);
pub const ASSET: Address = Address::repeat_byte(0xB2);
pub const COUNTER_ASSET: Address = Address::repeat_byte(0xC3);
pub const SPENDER: Address = Address::repeat_byte(0xD4);

/// In-memory stand-in for the remote ledger. Every submission is
/// recorded; confirmation outcomes and signing behavior are programmable
/// per test.
#[derive(Default)]
pub struct MockLedger {
    allowances: Mutex<HashMap<(Address, Address, Address), U256>>,
    resources: Mutex<HashMap<PairKey, ResourceId>>,
    pub auth_submissions: Mutex<Vec<(Address, Address, Address, U256)>>,
    pub op_submissions: Mutex<Vec<OperationCall>>,
    pub quote_queries: Mutex<Vec<QuoteQuery>>,
    failed_handles: Mutex<HashSet<TxHandle>>,
    fail_next_authorization: AtomicBool,
    fail_next_operation: AtomicBool,
    decline_signing: AtomicBool,
    confirmation_hold: Mutex<Option<Arc<Notify>>>,
    quote_hold: Mutex<Option<Arc<Notify>>>,
    next_handle: AtomicU64,
    allowance_reads: AtomicU64,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_allowance(&self, asset: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances
            .lock()
            .unwrap()
            .insert((asset, owner, spender), amount);
    }

    pub fn set_resource(&self, pair: PairKey, id: ResourceId) {
        self.resources.lock().unwrap().insert(pair, id);
    }

    pub fn remove_resource(&self, pair: PairKey) {
        self.resources.lock().unwrap().remove(&pair);
    }

    pub fn fail_next_authorization(&self) {
        self.fail_next_authorization.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_operation(&self) {
        self.fail_next_operation.store(true, Ordering::SeqCst);
    }

    pub fn decline_signing(&self) {
        self.decline_signing.store(true, Ordering::SeqCst);
    }

    /// Holds every confirmation until `release_confirmations` is called,
    /// so tests can interleave triggers inside the authorization gap.
    pub fn hold_confirmations(&self) {
        let mut hold = self.confirmation_hold.lock().unwrap();
        *hold = Some(Arc::new(Notify::new()));
    }

    pub fn release_confirmations(&self) {
        let notify = self.confirmation_hold.lock().unwrap().take();
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }

    /// Holds every quote query until `release_quotes` is called, so tests
    /// can supersede an in-flight query.
    pub fn hold_quotes(&self) {
        let mut hold = self.quote_hold.lock().unwrap();
        *hold = Some(Arc::new(Notify::new()));
    }

    pub fn release_quotes(&self) {
        let notify = self.quote_hold.lock().unwrap().take();
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }

    pub fn allowance_read_count(&self) -> u64 {
        self.allowance_reads.load(Ordering::SeqCst)
    }

    pub fn auth_submission_count(&self) -> usize {
        self.auth_submissions.lock().unwrap().len()
    }

    pub fn op_submission_count(&self) -> usize {
        self.op_submissions.lock().unwrap().len()
    }

    pub fn quote_query_count(&self) -> usize {
        self.quote_queries.lock().unwrap().len()
    }

    fn fresh_handle(&self) -> TxHandle {
        let n = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        TxHandle(FixedBytes::from(bytes))
    }

    async fn wait_if_held(hold: &Mutex<Option<Arc<Notify>>>) {
        loop {
            let notify = { hold.lock().unwrap().clone() };
            match notify {
                None => return,
                Some(notify) => notify.notified().await,
            }
        }
    }
}

impl std::fmt::Debug for MockLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLedger").finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteLedger for MockLedger {
    async fn read_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        self.allowance_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn submit_authorization(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHandle> {
        if self.decline_signing.swap(false, Ordering::SeqCst) {
            return Err(PrimitivesError::SigningRejected(
                "user rejected the signature request".into(),
            ));
        }
        self.auth_submissions
            .lock()
            .unwrap()
            .push((asset, owner, spender, amount));
        let handle = self.fresh_handle();
        if self.fail_next_authorization.swap(false, Ordering::SeqCst) {
            self.failed_handles.lock().unwrap().insert(handle);
        } else {
            // The grant becomes visible once the authorization confirms;
            // the mock applies it eagerly since the driver never re-reads
            // the allowance inside the same saga.
            self.allowances
                .lock()
                .unwrap()
                .insert((asset, owner, spender), amount);
        }
        Ok(handle)
    }

    async fn submit_operation(&self, call: OperationCall) -> Result<TxHandle> {
        if self.decline_signing.swap(false, Ordering::SeqCst) {
            return Err(PrimitivesError::SigningRejected(
                "user rejected the signature request".into(),
            ));
        }
        self.op_submissions.lock().unwrap().push(call);
        let handle = self.fresh_handle();
        if self.fail_next_operation.swap(false, Ordering::SeqCst) {
            self.failed_handles.lock().unwrap().insert(handle);
        }
        Ok(handle)
    }

    async fn await_confirmation(&self, handle: TxHandle) -> Result<Confirmation> {
        Self::wait_if_held(&self.confirmation_hold).await;
        let status = if self.failed_handles.lock().unwrap().contains(&handle) {
            TxStatus::Failed
        } else {
            TxStatus::Confirmed
        };
        Ok(Confirmation {
            status,
            receipt: TxReceipt {
                tx_hash: handle.0,
                block_number: 1,
            },
        })
    }

    async fn read_resource_identity(&self, pair: PairKey) -> Result<Option<ResourceId>> {
        Ok(self.resources.lock().unwrap().get(&pair).copied())
    }

    async fn read_quote(&self, query: QuoteQuery) -> Result<U256> {
        self.quote_queries.lock().unwrap().push(query);
        Self::wait_if_held(&self.quote_hold).await;
        // Fixed 2:1 rate keeps expectations easy to read.
        Ok(query.amount * U256::from(2))
    }
}

pub fn test_config(storage_dir: &std::path::Path) -> ClientConfig {
    let raw = serde_json::json!({
        "rpc_url": "http://localhost:8545",
        "log_level": "debug",
        "spender_address": SPENDER,
        "storage_dir": storage_dir,
        "quote_quiet_period_ms": 2000,
        "confirmation_timeout_seconds": 30,
    });
    serde_json::from_value(raw).unwrap()
}

pub fn deposit_intent(amount: u64) -> OperationIntent {
    OperationIntent::new(ACTOR, ASSET, U256::from(amount), OperationKind::Deposit, None).unwrap()
}

pub fn withdraw_intent(amount: u64) -> OperationIntent {
    OperationIntent::new(
        ACTOR,
        ASSET,
        U256::from(amount),
        OperationKind::Withdraw,
        None,
    )
    .unwrap()
}

pub fn swap_intent(amount: u64) -> OperationIntent {
    OperationIntent::new(
        ACTOR,
        ASSET,
        U256::from(amount),
        OperationKind::Swap,
        Some(COUNTER_ASSET),
    )
    .unwrap()
}

pub fn pool_id(byte: u8) -> ResourceId {
    B256::repeat_byte(byte)
}

pub fn pair() -> PairKey {
    PairKey::new(ASSET, COUNTER_ASSET).unwrap()
}
