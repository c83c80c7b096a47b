//! Saga driver: sequences allowance check, authorization, dependent
//! operation, and the shadow ledger commit across the asynchronous gaps
//! between submission and confirmation.
//!
//! One saga is active per intent key at a time. A new trigger while an
//! authorization is awaited supersedes the old saga through the intent
//! store; the stale saga's eventual confirmation then finds its ticket
//! gone and terminates with `Superseded` without committing anything.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ledgerflow_primitives::intent::{IntentKey, OperationIntent, OperationKind};
use ledgerflow_primitives::ledger::{
    Confirmation, OperationCall, RemoteLedger, TxHandle, TxReceipt, TxStatus,
};
use ledgerflow_primitives::resource::{PairKey, ResourceId};
use ledgerflow_primitives::saga::SagaState;
use ledgerflow_primitives::PrimitivesError;

use crate::error::{ClientError, Result};
use crate::gate::{AllowanceCheck, AllowanceGate};
use crate::intent_store::IntentStore;
use crate::resolver::ResourceResolver;
use crate::shadow::{CategoryKey, Direction, ShadowLedger};

/// Which saga phase a remote call belongs to. Failures are tagged with
/// the phase so each maps to a distinct user-facing reason.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Authorization,
    Operation,
}

#[derive(Debug)]
struct TrackedState {
    epoch: u64,
    state: SagaState,
}

pub struct SagaDriver {
    ledger: Arc<dyn RemoteLedger>,
    gate: AllowanceGate,
    intents: Arc<IntentStore>,
    shadow: Arc<ShadowLedger>,
    resolver: Arc<ResourceResolver>,
    states: Mutex<HashMap<IntentKey, TrackedState>>,
    next_epoch: AtomicU64,
    confirmation_timeout: Duration,
}

impl std::fmt::Debug for SagaDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaDriver")
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("ledger", &"<RemoteLedger>")
            .finish()
    }
}

impl SagaDriver {
    pub fn new(
        ledger: Arc<dyn RemoteLedger>,
        gate: AllowanceGate,
        intents: Arc<IntentStore>,
        shadow: Arc<ShadowLedger>,
        resolver: Arc<ResourceResolver>,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            gate,
            intents,
            shadow,
            resolver,
            states: Mutex::new(HashMap::new()),
            next_epoch: AtomicU64::new(1),
            confirmation_timeout,
        }
    }

    /// Current state for `key`. `Idle` when no saga has ever run.
    #[must_use]
    pub fn current_state(&self, key: IntentKey) -> SagaState {
        let states = self.states.lock().expect("saga state lock poisoned");
        states.get(&key).map_or(SagaState::Idle, |t| t.state)
    }

    /// Runs one saga to completion. Returns the operation receipt on
    /// success; every failure transitions through `Failed` back to `Idle`
    /// and surfaces as a tagged error, never as a stuck `Awaiting*` state.
    pub async fn trigger(&self, intent: OperationIntent) -> Result<TxReceipt> {
        let key = intent.key();
        let epoch = self.begin(key)?;

        match self.run(key, epoch, intent).await {
            Ok(receipt) => {
                self.set_state(key, epoch, SagaState::OperationConfirmed);
                tracing::info!(actor = %key.actor, kind = key.kind.as_str(), tx = %receipt.tx_hash, "saga confirmed");
                self.set_state(key, epoch, SagaState::Idle);
                Ok(receipt)
            }
            Err(e) => {
                self.set_state(key, epoch, SagaState::Failed);
                tracing::warn!(actor = %key.actor, kind = key.kind.as_str(), error = %e, "saga failed");
                self.set_state(key, epoch, SagaState::Idle);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        key: IntentKey,
        epoch: u64,
        intent: OperationIntent,
    ) -> Result<TxReceipt> {
        // Swaps are refused outright when no pool resolves; nothing is
        // authorized or submitted against a nonexistent resource.
        let resource = match intent.kind {
            OperationKind::Swap => {
                let pair = pair_of(&intent)?;
                Some(self.resolver.resolve(pair).await?.id)
            }
            _ => None,
        };

        let operation_intent = if intent.kind.requires_allowance() {
            match self
                .gate
                .check_and_request(intent.allowance_asset(), intent.actor, intent.amount)
                .await
                .map_err(|e| tag_phase(e, Phase::Authorization))?
            {
                AllowanceCheck::Sufficient => intent,
                AllowanceCheck::AuthorizationPending(handle) => {
                    self.await_authorization(key, epoch, intent, handle).await?
                }
            }
        } else {
            intent
        };

        self.submit_operation(key, epoch, operation_intent, resource)
            .await
    }

    /// Parks the intent, suspends on the authorization confirmation, and
    /// takes the intent back. A superseding park or a repeated resume
    /// makes the take miss, terminating this saga with `Superseded`.
    async fn await_authorization(
        &self,
        key: IntentKey,
        epoch: u64,
        intent: OperationIntent,
        handle: TxHandle,
    ) -> Result<OperationIntent> {
        let ticket = self.intents.park(intent);
        self.set_state(key, epoch, SagaState::AwaitingAuthorization);

        let confirmation = match self.await_confirmation(handle, Phase::Authorization).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                // Drop our own slot so a dead saga leaves nothing parked.
                let _ = self.intents.take(key, ticket);
                return Err(e);
            }
        };

        if confirmation.status == TxStatus::Failed {
            let _ = self.intents.take(key, ticket);
            return Err(ClientError::AuthorizationFailed(format!(
                "authorization reverted in block {}",
                confirmation.receipt.block_number
            )));
        }

        self.set_state(key, epoch, SagaState::AuthorizationConfirmed);
        self.intents
            .take(key, ticket)
            .ok_or(ClientError::Superseded)
    }

    async fn submit_operation(
        &self,
        key: IntentKey,
        epoch: u64,
        intent: OperationIntent,
        resource: Option<ResourceId>,
    ) -> Result<TxReceipt> {
        let call = OperationCall {
            kind: intent.kind,
            actor: intent.actor,
            asset: intent.asset,
            amount: intent.amount,
            auxiliary_asset: intent.auxiliary_asset,
            resource,
        };

        let handle = self
            .ledger
            .submit_operation(call)
            .await
            .map_err(|e| tag_phase(e.into(), Phase::Operation))?;
        self.set_state(key, epoch, SagaState::AwaitingOperation);

        let confirmation = self.await_confirmation(handle, Phase::Operation).await?;
        if confirmation.status == TxStatus::Failed {
            // The allowance granted earlier is deliberately left intact so
            // a retry skips re-authorization.
            return Err(ClientError::OperationFailed(format!(
                "operation reverted in block {}",
                confirmation.receipt.block_number
            )));
        }

        self.commit(&intent).await?;
        Ok(confirmation.receipt)
    }

    /// Commits a confirmed operation: exactly one shadow ledger delta,
    /// plus the resolver write-back when the operation created a pool.
    async fn commit(&self, intent: &OperationIntent) -> Result<()> {
        let (category, direction) = CategoryKey::for_operation(intent.kind, intent.asset);
        match direction {
            Direction::Credit => self.shadow.credit(category, intent.amount)?,
            Direction::Debit => self.shadow.debit(category, intent.amount)?,
        }

        if intent.kind == OperationKind::CreatePool {
            let pair = pair_of(intent)?;
            match self.ledger.read_resource_identity(pair).await {
                Ok(Some(id)) => self.resolver.on_creation_confirmed(pair, id)?,
                Ok(None) => {
                    tracing::warn!(?pair, "confirmed pool creation but no identity readable yet")
                }
                Err(e) => {
                    tracing::warn!(?pair, error = %e, "failed to read identity of created pool")
                }
            }
        }
        Ok(())
    }

    async fn await_confirmation(&self, handle: TxHandle, phase: Phase) -> Result<Confirmation> {
        match tokio::time::timeout(
            self.confirmation_timeout,
            self.ledger.await_confirmation(handle),
        )
        .await
        {
            Ok(Ok(confirmation)) => Ok(confirmation),
            Ok(Err(e)) => Err(tag_phase(e.into(), phase)),
            Err(_) => Err(match phase {
                Phase::Authorization => {
                    ClientError::AuthorizationFailed("confirmation wait timed out".into())
                }
                Phase::Operation => {
                    ClientError::OperationFailed("confirmation wait timed out".into())
                }
            }),
        }
    }

    /// Claims the state slot for a new saga. A saga suspended on an
    /// authorization may be superseded; any other active saga rejects the
    /// trigger.
    fn begin(&self, key: IntentKey) -> Result<u64> {
        let mut states = self.states.lock().expect("saga state lock poisoned");
        if let Some(tracked) = states.get(&key) {
            match tracked.state {
                SagaState::Idle => {}
                SagaState::AwaitingAuthorization => {
                    // The takeover must invalidate whatever the old saga
                    // parked, even when this saga never parks anything of
                    // its own (its allowance check may already come back
                    // sufficient). Otherwise the old ticket stays live and
                    // both sagas commit.
                    self.intents.clear(key);
                }
                _ => return Err(ClientError::SagaActive),
            }
        }
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        states.insert(
            key,
            TrackedState {
                epoch,
                state: SagaState::CheckingAllowance,
            },
        );
        Ok(epoch)
    }

    /// Epoch-guarded transition: a superseded saga can no longer write to
    /// the state slot its successor owns.
    fn set_state(&self, key: IntentKey, epoch: u64, state: SagaState) {
        let mut states = self.states.lock().expect("saga state lock poisoned");
        if let Some(tracked) = states.get_mut(&key) {
            if tracked.epoch == epoch {
                tracing::debug!(actor = %key.actor, kind = key.kind.as_str(), ?state, "saga transition");
                tracked.state = state;
            }
        }
    }
}

fn pair_of(intent: &OperationIntent) -> Result<PairKey> {
    let auxiliary = intent.auxiliary_asset.ok_or_else(|| {
        ClientError::PrimitivesError(PrimitivesError::InvalidIntent(
            "pair operation without auxiliary asset".into(),
        ))
    })?;
    Ok(PairKey::new(intent.asset, auxiliary)?)
}

/// Maps boundary errors to the taxonomy: a locally declined signature is
/// `UserDeclined` in any phase; everything else is tagged by phase.
fn tag_phase(e: ClientError, phase: Phase) -> ClientError {
    match e {
        ClientError::PrimitivesError(PrimitivesError::SigningRejected(msg)) => {
            ClientError::UserDeclined(msg)
        }
        ClientError::PrimitivesError(PrimitivesError::RpcError(msg)) => match phase {
            Phase::Authorization => ClientError::AuthorizationFailed(msg),
            Phase::Operation => ClientError::OperationFailed(msg),
        },
        other => other,
    }
}
