//! Resource resolver: maps an unordered asset pair to its ledger-assigned
//! resource identity through a strict priority chain. Reads are
//! side-effect-free; the cache is written only from confirmed-creation
//! callbacks, never speculatively.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use ledgerflow_primitives::ledger::RemoteLedger;
use ledgerflow_primitives::resource::{PairKey, ResolutionSource, ResourceId, ResourceIdentity};

use crate::error::{ClientError, Result};
use crate::storage::SessionStore;

pub struct ResourceResolver {
    ledger: Arc<dyn RemoteLedger>,
    store: Arc<SessionStore>,
    cache: Mutex<HashMap<PairKey, ResourceId>>,
    /// Fixed last-resort identities for specific legacy pairs, registered
    /// at construction. New pairs never get a fallback.
    legacy_fallbacks: HashMap<PairKey, ResourceId>,
}

impl std::fmt::Debug for ResourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceResolver")
            .field("legacy_fallbacks", &self.legacy_fallbacks)
            .field("ledger", &"<RemoteLedger>")
            .finish()
    }
}

impl ResourceResolver {
    pub fn new(
        ledger: Arc<dyn RemoteLedger>,
        store: Arc<SessionStore>,
        legacy_fallbacks: HashMap<PairKey, ResourceId>,
    ) -> Self {
        let cache = store.resolver_cache();
        Self {
            ledger,
            store,
            cache: Mutex::new(cache),
            legacy_fallbacks,
        }
    }

    /// Resolves `pair` by trying, in strict priority order: the
    /// authoritative remote lookup, the local cache, then a pre-registered
    /// legacy fallback. The first hit wins; a stale cache entry can never
    /// shadow an authoritative result.
    pub async fn resolve(&self, pair: PairKey) -> Result<ResourceIdentity> {
        if let Some(id) = self.ledger.read_resource_identity(pair).await? {
            return Ok(self.identity(pair, id, ResolutionSource::Authoritative));
        }

        let cached = {
            let cache = self.cache.lock().expect("resolver cache lock poisoned");
            cache.get(&pair).copied()
        };
        if let Some(id) = cached {
            tracing::info!(?pair, %id, "resolved resource from local cache");
            return Ok(self.identity(pair, id, ResolutionSource::Cache));
        }

        if let Some(id) = self.legacy_fallbacks.get(&pair).copied() {
            tracing::warn!(?pair, %id, "resolved resource from legacy fallback constant");
            return Ok(self.identity(pair, id, ResolutionSource::FallbackConstant));
        }

        Err(ClientError::ResolutionExhausted)
    }

    /// Write-back hook for a confirmed resource creation. Replaces any
    /// stale cache entry for the pair and persists the session record.
    pub fn on_creation_confirmed(&self, pair: PairKey, id: ResourceId) -> Result<()> {
        {
            let mut cache = self.cache.lock().expect("resolver cache lock poisoned");
            cache.insert(pair, id);
        }
        tracing::info!(?pair, %id, "cached confirmed resource identity");
        self.store.write_resolver_entry(pair, id)
    }

    fn identity(&self, pair: PairKey, id: ResourceId, source: ResolutionSource) -> ResourceIdentity {
        ResourceIdentity {
            pair,
            id,
            source,
            resolved_at: Utc::now(),
        }
    }
}
