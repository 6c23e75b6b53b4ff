//! Staking lifecycle hooks.
//!
//! The normalizer reseeds reward state by replaying the lifecycle events a
//! fresh chain would emit. Hooks are handed the working state explicitly so
//! any implementation can be swapped in, including recorders in tests.

use kita_genesis_core::{AccAddress, DelegationKey, ValAddress};
use kita_genesis_store::LedgerState;

use crate::error::RewardError;
use crate::rewards;

/// Receiver of validator and delegation lifecycle events.
pub trait LifecycleHooks<S: LedgerState> {
    fn after_validator_created(
        &mut self,
        state: &mut S,
        validator: &ValAddress,
    ) -> Result<(), RewardError>;

    fn before_delegation_created(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError>;

    fn after_delegation_modified(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError>;
}

impl<S: LedgerState, H: LifecycleHooks<S> + ?Sized> LifecycleHooks<S> for &mut H {
    fn after_validator_created(
        &mut self,
        state: &mut S,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        (**self).after_validator_created(state, validator)
    }

    fn before_delegation_created(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        (**self).before_delegation_created(state, delegator, validator)
    }

    fn after_delegation_modified(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        (**self).after_delegation_modified(state, delegator, validator)
    }
}

/// The reward ledger's reaction to lifecycle events.
///
/// - validator created: seed period 0 and open period 1
/// - delegation about to be created: close the validator's open period
/// - delegation modified: record the delegation's starting info
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionHooks;

impl<S: LedgerState> LifecycleHooks<S> for DistributionHooks {
    fn after_validator_created(
        &mut self,
        state: &mut S,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        rewards::initialize_validator(state, validator)
    }

    fn before_delegation_created(
        &mut self,
        state: &mut S,
        _delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        let record = state
            .validator(validator)?
            .ok_or_else(|| RewardError::ValidatorNotFound(validator.clone()))?;
        rewards::increment_validator_period(state, &record).map(|_| ())
    }

    fn after_delegation_modified(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        rewards::initialize_delegation(
            state,
            &DelegationKey::new(delegator.clone(), validator.clone()),
        )
    }
}
