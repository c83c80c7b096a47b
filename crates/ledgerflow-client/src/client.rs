//! Composed client: wires the gate, intent store, saga driver, resource
//! resolver, shadow ledger, and quote pipeline together behind the
//! surface the presentation layer consumes.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::U256;
use ledgerflow_primitives::intent::{IntentKey, OperationIntent};
use ledgerflow_primitives::ledger::{RemoteLedger, TxReceipt};
use ledgerflow_primitives::quote::{QuoteQuery, QuoteResult};
use ledgerflow_primitives::resource::{PairKey, ResourceId, ResourceIdentity};
use ledgerflow_primitives::saga::SagaState;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::gate::AllowanceGate;
use crate::intent_store::IntentStore;
use crate::quote::QuotePipeline;
use crate::resolver::ResourceResolver;
use crate::saga::SagaDriver;
use crate::shadow::{CategoryKey, ShadowLedger};
use crate::storage::SessionStore;

#[derive(Debug)]
pub struct LedgerFlowClient {
    driver: SagaDriver,
    resolver: Arc<ResourceResolver>,
    shadow: Arc<ShadowLedger>,
    pipeline: QuotePipeline,
}

impl LedgerFlowClient {
    /// Builds the client from its config and a remote ledger boundary.
    /// Must be called from within a tokio runtime; the quote pipeline
    /// spawns its background task here.
    pub fn new(
        config: &ClientConfig,
        ledger: Arc<dyn RemoteLedger>,
        legacy_fallbacks: HashMap<PairKey, ResourceId>,
    ) -> Result<Self> {
        let store = Arc::new(SessionStore::open(&config.storage_dir)?);
        let shadow = Arc::new(ShadowLedger::new(Arc::clone(&store)));
        let resolver = Arc::new(ResourceResolver::new(
            Arc::clone(&ledger),
            store,
            legacy_fallbacks,
        ));
        let gate = AllowanceGate::new(Arc::clone(&ledger), config.spender_address);
        let intents = Arc::new(IntentStore::new());
        let driver = SagaDriver::new(
            Arc::clone(&ledger),
            gate,
            intents,
            Arc::clone(&shadow),
            Arc::clone(&resolver),
            config.confirmation_timeout(),
        );
        let pipeline = QuotePipeline::spawn(ledger, config.quote_quiet_period());

        Ok(Self {
            driver,
            resolver,
            shadow,
            pipeline,
        })
    }

    /// Runs one approval-gated operation saga to completion.
    pub async fn trigger(&self, intent: OperationIntent) -> Result<TxReceipt> {
        self.driver.trigger(intent).await
    }

    #[must_use]
    pub fn current_state(&self, key: IntentKey) -> SagaState {
        self.driver.current_state(key)
    }

    /// Feeds an input value to the debounced quote pipeline.
    pub fn observe(&self, query: QuoteQuery) -> u64 {
        self.pipeline.observe(query)
    }

    #[must_use]
    pub fn latest_quote(&self) -> Option<QuoteResult> {
        self.pipeline.latest_quote()
    }

    pub async fn resolve(&self, pair: PairKey) -> Result<ResourceIdentity> {
        self.resolver.resolve(pair).await
    }

    /// Write-back hook for an externally observed confirmed pool
    /// creation.
    pub fn on_pool_created(&self, pair: PairKey, id: ResourceId) -> Result<()> {
        self.resolver.on_creation_confirmed(pair, id)
    }

    #[must_use]
    pub fn shadow_totals(&self) -> HashMap<CategoryKey, U256> {
        self.shadow.totals()
    }

    #[must_use]
    pub fn shadow_aggregate(&self) -> U256 {
        self.shadow.aggregate()
    }
}
