//! Staking records: validators, delegations and the unbonding queues.

use serde::{Deserialize, Serialize};

use crate::address::{AccAddress, ValAddress};
use crate::coin::int_string;
use crate::crypto::ConsensusPubKey;
use crate::dec::Dec;
use crate::error::Result;

/// Bonding status of a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondStatus {
    Unbonded,
    Unbonding,
    Bonded,
}

/// A validator in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator_address: ValAddress,
    pub consensus_pubkey: ConsensusPubKey,
    pub moniker: String,
    pub jailed: bool,
    pub status: BondStatus,
    /// Bonded tokens.
    #[serde(with = "int_string")]
    pub tokens: u128,
    /// Total shares issued to delegators.
    pub delegator_shares: Dec,
    /// Height at which the validator started unbonding.
    pub unbonding_height: i64,
    /// Unix seconds at which unbonding completes.
    pub unbonding_time: i64,
    pub commission_rate: Dec,
}

impl Validator {
    pub fn new(
        operator_address: ValAddress,
        consensus_pubkey: ConsensusPubKey,
        moniker: impl Into<String>,
        commission_rate: Dec,
    ) -> Self {
        Self {
            operator_address,
            consensus_pubkey,
            moniker: moniker.into(),
            jailed: false,
            status: BondStatus::Unbonded,
            tokens: 0,
            delegator_shares: Dec::ZERO,
            unbonding_height: 0,
            unbonding_time: 0,
            commission_rate,
        }
    }

    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }

    /// Consensus power for the given power reduction.
    pub fn consensus_power(&self, power_reduction: u128) -> i64 {
        if power_reduction == 0 {
            return 0;
        }
        i64::try_from(self.tokens / power_reduction).unwrap_or(i64::MAX)
    }

    /// Tokens backing `shares`, truncated.
    ///
    /// A validator without shares backs nothing.
    pub fn tokens_from_shares_truncated(&self, shares: Dec) -> Result<Dec> {
        if self.delegator_shares.is_zero() {
            return Ok(Dec::ZERO);
        }
        shares.mul_int_quo(self.tokens, self.delegator_shares)
    }

    /// Shares issued for `amount` new tokens.
    pub fn shares_from_tokens(&self, amount: u128) -> Result<Dec> {
        if self.tokens == 0 || self.delegator_shares.is_zero() {
            return Dec::from_int(amount);
        }
        self.delegator_shares
            .mul_int_quo(amount, Dec::from_int(self.tokens)?)
    }
}

/// Key of a delegation: (delegator, validator).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DelegationKey {
    pub delegator: AccAddress,
    pub validator: ValAddress,
}

impl DelegationKey {
    pub fn new(delegator: AccAddress, validator: ValAddress) -> Self {
        Self {
            delegator,
            validator,
        }
    }
}

/// A bond of shares from a delegator to a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    pub shares: Dec,
}

impl Delegation {
    pub fn key(&self) -> DelegationKey {
        DelegationKey::new(self.delegator.clone(), self.validator.clone())
    }
}

/// One pending unbonding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegationEntry {
    pub creation_height: i64,
    /// Unix seconds.
    pub completion_time: i64,
    #[serde(with = "int_string")]
    pub initial_balance: u128,
    #[serde(with = "int_string")]
    pub balance: u128,
}

/// All pending unbondings of one delegator from one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    pub entries: Vec<UnbondingDelegationEntry>,
}

impl UnbondingDelegation {
    pub fn key(&self) -> DelegationKey {
        DelegationKey::new(self.delegator.clone(), self.validator.clone())
    }
}

/// Key of a redelegation: (delegator, source validator, destination validator).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RedelegationKey {
    pub delegator: AccAddress,
    pub validator_src: ValAddress,
    pub validator_dst: ValAddress,
}

/// One pending redelegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    pub creation_height: i64,
    /// Unix seconds.
    pub completion_time: i64,
    #[serde(with = "int_string")]
    pub initial_balance: u128,
    pub shares_dst: Dec,
}

/// All pending redelegations between one pair of validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redelegation {
    pub delegator: AccAddress,
    pub validator_src: ValAddress,
    pub validator_dst: ValAddress,
    pub entries: Vec<RedelegationEntry>,
}

impl Redelegation {
    pub fn key(&self) -> RedelegationKey {
        RedelegationKey {
            delegator: self.delegator.clone(),
            validator_src: self.validator_src.clone(),
            validator_dst: self.validator_dst.clone(),
        }
    }
}

/// Staking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// Seconds.
    pub unbonding_time: u64,
    pub max_validators: u32,
    pub max_entries: u32,
    pub historical_entries: u32,
    pub bond_denom: String,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            unbonding_time: 21 * 24 * 60 * 60,
            max_validators: 100,
            max_entries: 7,
            historical_entries: 10_000,
            bond_denom: "kita".into(),
        }
    }
}

/// A change of consensus power handed to the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: ConsensusPubKey,
    pub power: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(tokens: u128, shares: &str) -> Validator {
        let mut v = Validator::new(
            ValAddress::from_bytes([1; 20]),
            ConsensusPubKey([0; 32]),
            "v1",
            Dec::ZERO,
        );
        v.tokens = tokens;
        v.delegator_shares = shares.parse().unwrap();
        v
    }

    #[test]
    fn test_consensus_power() {
        let v = validator(5_500_000, "5500000");
        assert_eq!(v.consensus_power(1_000_000), 5);
        assert_eq!(v.consensus_power(0), 0);
    }

    #[test]
    fn test_tokens_from_shares_after_slash() {
        // Half the tokens were slashed, shares are unchanged.
        let v = validator(50, "100");
        let tokens = v.tokens_from_shares_truncated("10".parse().unwrap()).unwrap();
        assert_eq!(tokens, "5".parse().unwrap());
    }

    #[test]
    fn test_shares_from_tokens_initial_rate() {
        let v = validator(0, "0");
        assert_eq!(v.shares_from_tokens(42).unwrap(), Dec::from_int(42).unwrap());
    }

    #[test]
    fn test_tokens_from_shares_without_shares() {
        let v = validator(0, "0");
        assert_eq!(v.tokens_from_shares_truncated(Dec::ONE).unwrap(), Dec::ZERO);
    }
}
