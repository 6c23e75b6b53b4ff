//! Deterministic traversal of the validator registry.

use std::ops::ControlFlow;

use kita_genesis_core::Validator;
use kita_genesis_store::{LedgerState, Order, StakingStore};

use crate::error::{ExportError, Result, Stage};

/// Walks validators from the highest operator address to the lowest.
///
/// The key set is fixed when the walk starts and each record is loaded just
/// before the callback sees it, so callbacks may write to the state. A
/// validator removed by an earlier callback is skipped. The cursor lease is
/// released on every exit path.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorSetIterator {
    order: Order,
}

impl Default for ValidatorSetIterator {
    fn default() -> Self {
        Self {
            order: Order::Descending,
        }
    }
}

impl ValidatorSetIterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit every validator, passing its position in the walk.
    ///
    /// Stops early when the callback returns `ControlFlow::Break` and
    /// propagates the first callback error. Returns the number visited.
    pub fn for_each<S, F>(&self, state: &mut S, stage: Stage, mut f: F) -> Result<usize>
    where
        S: LedgerState,
        F: FnMut(&mut S, usize, Validator) -> Result<ControlFlow<()>>,
    {
        let cursor = state
            .validator_cursor(self.order)
            .map_err(ExportError::iteration(stage))?;

        let mut visited = 0;
        for address in cursor {
            let Some(validator) = state
                .validator(&address)
                .map_err(ExportError::iteration(stage))?
            else {
                continue;
            };
            let flow = f(state, visited, validator)?;
            visited += 1;
            if flow.is_break() {
                break;
            }
        }
        Ok(visited)
    }

    /// Load every validator in walk order.
    pub fn collect<S: StakingStore>(&self, state: &S, stage: Stage) -> Result<Vec<Validator>> {
        let cursor = state
            .validator_cursor(self.order)
            .map_err(ExportError::iteration(stage))?;
        let mut validators = Vec::with_capacity(cursor.remaining());
        for address in cursor {
            if let Some(validator) = state
                .validator(&address)
                .map_err(ExportError::iteration(stage))?
            {
                validators.push(validator);
            }
        }
        Ok(validators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kita_genesis_core::{ConsensusPubKey, Dec, ValAddress};
    use kita_genesis_store::MemoryState;

    fn state_with(bytes: &[u8]) -> MemoryState {
        let mut state = MemoryState::new();
        for &byte in bytes {
            state
                .set_validator(Validator::new(
                    ValAddress::from_bytes([byte; 20]),
                    ConsensusPubKey([byte; 32]),
                    format!("v{}", byte),
                    Dec::ZERO,
                ))
                .unwrap();
        }
        state
    }

    #[test]
    fn test_walks_highest_key_first() {
        let state = state_with(&[3, 1, 2]);
        let monikers: Vec<_> = ValidatorSetIterator::new()
            .collect(&state, Stage::NormalizeValidators)
            .unwrap()
            .into_iter()
            .map(|v| v.moniker)
            .collect();
        assert_eq!(monikers, vec!["v3", "v2", "v1"]);
    }

    #[test]
    fn test_early_break() {
        let mut state = state_with(&[1, 2, 3, 4]);
        let visited = ValidatorSetIterator::new()
            .for_each(&mut state, Stage::NormalizeValidators, |_, index, _| {
                Ok(if index == 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                })
            })
            .unwrap();
        assert_eq!(visited, 2);
        assert_eq!(state.open_cursors(), 0);
    }

    #[test]
    fn test_error_releases_cursor() {
        let mut state = state_with(&[1, 2]);
        let err = ValidatorSetIterator::new()
            .for_each(&mut state, Stage::WithdrawCommissions, |_, _, v| {
                Err(ExportError::NotFound {
                    stage: Stage::WithdrawCommissions,
                    what: v.moniker,
                })
            })
            .unwrap_err();
        assert!(matches!(err, ExportError::NotFound { .. }));
        assert_eq!(state.open_cursors(), 0);
    }

    #[test]
    fn test_callback_may_write() {
        let mut state = state_with(&[1, 2]);
        ValidatorSetIterator::new()
            .for_each(&mut state, Stage::NormalizeValidators, |state, _, mut v| {
                v.jailed = true;
                state
                    .set_validator(v)
                    .map_err(ExportError::store(Stage::NormalizeValidators))?;
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();
        let jailed = ValidatorSetIterator::new()
            .collect(&state, Stage::NormalizeValidators)
            .unwrap()
            .iter()
            .all(|v| v.jailed);
        assert!(jailed);
    }

    #[test]
    fn test_removed_validator_is_skipped() {
        let mut state = state_with(&[1, 2, 3]);
        let mut seen = Vec::new();
        ValidatorSetIterator::new()
            .for_each(&mut state, Stage::NormalizeValidators, |state, _, v| {
                if v.moniker == "v3" {
                    state
                        .remove_validator(&ValAddress::from_bytes([2; 20]))
                        .map_err(ExportError::store(Stage::NormalizeValidators))?;
                }
                seen.push(v.moniker);
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();
        assert_eq!(seen, vec!["v3", "v1"]);
    }
}
