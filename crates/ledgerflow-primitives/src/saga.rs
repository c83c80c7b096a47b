//! Saga state machine vocabulary. Exactly one state exists per intent key;
//! `Idle` is both the initial state and the resting state after a terminal
//! outcome has been reported.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaState {
    Idle,
    CheckingAllowance,
    AwaitingAuthorization,
    AuthorizationConfirmed,
    AwaitingOperation,
    OperationConfirmed,
    Failed,
}

impl SagaState {
    /// States in which the saga is suspended on a remote confirmation.
    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        matches!(
            self,
            SagaState::AwaitingAuthorization | SagaState::AwaitingOperation
        )
    }

    /// States in which a new trigger for the same key may not start a
    /// fresh saga.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, SagaState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_awaiting_states_are_suspended() {
        assert!(SagaState::AwaitingAuthorization.is_awaiting());
        assert!(SagaState::AwaitingOperation.is_awaiting());
        assert!(!SagaState::CheckingAllowance.is_awaiting());
        assert!(!SagaState::Idle.is_awaiting());
    }

    #[test]
    fn idle_is_the_only_inactive_state() {
        assert!(!SagaState::Idle.is_active());
        assert!(SagaState::CheckingAllowance.is_active());
        assert!(SagaState::Failed.is_active());
    }
}
