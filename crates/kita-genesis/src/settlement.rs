//! Reward settlement: paying out what validators and delegators are owed.

use kita_genesis_core::{AccAddress, ChainConfig, Coin, DelegationKey, ValAddress};
use kita_genesis_store::LedgerState;
use tracing::debug;

use crate::error::RewardError;
use crate::rewards::{self, Result};

/// Withdraws accrued commission and delegation rewards.
///
/// Each call mutates the reward ledger. Settling an already-settled
/// validator or delegation returns a zero coin and never pays twice.
#[derive(Debug, Clone)]
pub struct RewardSettlement {
    denom: String,
}

impl RewardSettlement {
    pub fn new(config: &ChainConfig) -> Self {
        Self {
            denom: config.bond_denom.clone(),
        }
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    /// Withdraw all whole-coin commission of `validator`.
    ///
    /// Fails with `ValidatorNotFound` for an unknown validator and with
    /// `ZeroCoins` when nothing has accumulated.
    pub fn settle_validator_commission<S: LedgerState>(
        &self,
        state: &mut S,
        validator: &ValAddress,
    ) -> Result<Coin> {
        if state.validator(validator)?.is_none() {
            return Err(RewardError::ValidatorNotFound(validator.clone()));
        }
        let coin = rewards::withdraw_validator_commission(state, validator, &self.denom)?;
        debug!(validator = %validator, amount = %coin, "withdrew commission");
        Ok(coin)
    }

    /// Withdraw the reward of one delegation.
    ///
    /// Fails with `NoDelegation` if the pair is not bonded and with
    /// `NoPositiveDelegation` if it holds no shares.
    pub fn settle_delegation_reward<S: LedgerState>(
        &self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<Coin> {
        let key = DelegationKey::new(delegator.clone(), validator.clone());
        let coin = rewards::withdraw_delegation_rewards(state, &key, &self.denom)?;
        debug!(delegator = %delegator, validator = %validator, amount = %coin, "withdrew delegation reward");
        Ok(coin)
    }
}
