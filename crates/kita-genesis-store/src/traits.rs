//! Ledger state capabilities.
//!
//! Genesis export works against these traits only, so the same algorithms
//! run over the in-memory state in tests and over a real backend in a node.
//! The traits are deliberately dumb: typed get/set/iterate. Reward and
//! power-index logic lives in the `kita-genesis` crate.

use kita_genesis_core::{
    AccAddress, ConsensusParams, CurrentRewards, Dec, Delegation, DelegationKey,
    DelegatorStartingInfo, FeePool, HistoricalRewards, Redelegation, RedelegationKey,
    SlashEvent, SlashEventKey, StakingParams, UnbondingDelegation, ValAddress, Validator,
};

use crate::cursor::{Cursor, Order};
use crate::error::Result;

/// Block context of a working state.
pub trait Context {
    /// The height writes are attributed to.
    fn block_height(&self) -> i64;

    /// Override the working height.
    fn set_block_height(&mut self, height: i64);
}

/// Validator registry, delegation graph and unbonding queues.
pub trait StakingStore {
    // ─────────────────────────────────────────────────────────────────────────
    // Validators
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a validator by operator address.
    fn validator(&self, address: &ValAddress) -> Result<Option<Validator>>;

    /// Insert or replace a validator.
    fn set_validator(&mut self, validator: Validator) -> Result<()>;

    /// Remove a validator from the registry.
    fn remove_validator(&mut self, address: &ValAddress) -> Result<()>;

    /// Open a cursor over operator addresses, the validator-set ordering key.
    fn validator_cursor(&self, order: Order) -> Result<Cursor<ValAddress>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Delegations
    // ─────────────────────────────────────────────────────────────────────────

    fn delegation(&self, key: &DelegationKey) -> Result<Option<Delegation>>;

    fn set_delegation(&mut self, delegation: Delegation) -> Result<()>;

    /// Open a cursor over all delegations, ascending by (delegator, validator).
    fn delegation_cursor(&self) -> Result<Cursor<DelegationKey>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Unbonding queues
    // ─────────────────────────────────────────────────────────────────────────

    fn unbonding_delegation(&self, key: &DelegationKey) -> Result<Option<UnbondingDelegation>>;

    fn set_unbonding_delegation(&mut self, ubd: UnbondingDelegation) -> Result<()>;

    fn unbonding_delegation_cursor(&self) -> Result<Cursor<DelegationKey>>;

    fn redelegation(&self, key: &RedelegationKey) -> Result<Option<Redelegation>>;

    fn set_redelegation(&mut self, red: Redelegation) -> Result<()>;

    fn redelegation_cursor(&self) -> Result<Cursor<RedelegationKey>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Last committed validator set
    // ─────────────────────────────────────────────────────────────────────────

    /// Powers of the last bonded set, ascending by operator address.
    fn last_validator_powers(&self) -> Result<Vec<(ValAddress, i64)>>;

    fn set_last_validator_power(&mut self, address: &ValAddress, power: i64) -> Result<()>;

    fn delete_last_validator_power(&mut self, address: &ValAddress) -> Result<()>;

    fn last_total_power(&self) -> Result<i64>;

    fn set_last_total_power(&mut self, power: i64) -> Result<()>;

    fn staking_params(&self) -> Result<StakingParams>;
}

/// Reward ledger and community pool.
pub trait DistributionStore {
    fn outstanding_rewards(&self, validator: &ValAddress) -> Result<Option<Dec>>;

    fn set_outstanding_rewards(&mut self, validator: &ValAddress, rewards: Dec) -> Result<()>;

    fn accumulated_commission(&self, validator: &ValAddress) -> Result<Option<Dec>>;

    fn set_accumulated_commission(&mut self, validator: &ValAddress, commission: Dec)
        -> Result<()>;

    fn current_rewards(&self, validator: &ValAddress) -> Result<Option<CurrentRewards>>;

    fn set_current_rewards(&mut self, validator: &ValAddress, rewards: CurrentRewards)
        -> Result<()>;

    fn historical_rewards(
        &self,
        validator: &ValAddress,
        period: u64,
    ) -> Result<Option<HistoricalRewards>>;

    fn set_historical_rewards(
        &mut self,
        validator: &ValAddress,
        period: u64,
        rewards: HistoricalRewards,
    ) -> Result<()>;

    fn delete_historical_rewards(&mut self, validator: &ValAddress, period: u64) -> Result<()>;

    /// Drop every historical reward record of every validator.
    fn clear_historical_rewards(&mut self) -> Result<()>;

    fn starting_info(&self, key: &DelegationKey) -> Result<Option<DelegatorStartingInfo>>;

    fn set_starting_info(&mut self, key: &DelegationKey, info: DelegatorStartingInfo)
        -> Result<()>;

    fn delete_starting_info(&mut self, key: &DelegationKey) -> Result<()>;

    fn set_slash_event(&mut self, key: SlashEventKey, event: SlashEvent) -> Result<()>;

    /// Drop every slash event of every validator.
    fn clear_slash_events(&mut self) -> Result<()>;

    fn fee_pool(&self) -> Result<FeePool>;

    fn set_fee_pool(&mut self, pool: FeePool) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Full listings for genesis export, ascending by key
    // ─────────────────────────────────────────────────────────────────────────

    fn all_outstanding_rewards(&self) -> Result<Vec<(ValAddress, Dec)>>;

    fn all_accumulated_commissions(&self) -> Result<Vec<(ValAddress, Dec)>>;

    fn all_current_rewards(&self) -> Result<Vec<(ValAddress, CurrentRewards)>>;

    fn all_historical_rewards(&self) -> Result<Vec<(ValAddress, u64, HistoricalRewards)>>;

    fn all_starting_infos(&self) -> Result<Vec<(DelegationKey, DelegatorStartingInfo)>>;

    fn all_slash_events(&self) -> Result<Vec<(SlashEventKey, SlashEvent)>>;
}

/// Account balances in the bond denomination.
pub trait BankStore {
    fn balance(&self, address: &AccAddress) -> Result<u128>;

    fn credit(&mut self, address: &AccAddress, amount: u128) -> Result<()>;

    fn all_balances(&self) -> Result<Vec<(AccAddress, u128)>>;
}

/// Consensus parameter accessor.
pub trait ConsensusStore {
    fn consensus_params(&self) -> Result<ConsensusParams>;
}

/// Everything genesis export reads and writes.
pub trait LedgerState: Context + StakingStore + DistributionStore + BankStore + ConsensusStore {}

impl<T> LedgerState for T where
    T: Context + StakingStore + DistributionStore + BankStore + ConsensusStore
{
}

/// A committed state that working contexts are branched from.
pub trait Snapshot {
    type Working: LedgerState;

    /// Height of the last committed block.
    fn last_block_height(&self) -> i64;

    /// Branch an independent read/write context at `height`.
    ///
    /// Writes to the context never reach the snapshot; discarding the
    /// context discards them all.
    fn working_context(&self, height: i64) -> Result<Self::Working>;
}
