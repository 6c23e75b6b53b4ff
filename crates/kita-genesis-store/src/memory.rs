//! In-memory implementation of the ledger state traits.
//!
//! Every table is a `BTreeMap`, so all listings and cursors come out in key
//! order no matter how the state was built. Used as the snapshot in tests and
//! offline tooling.

use std::collections::BTreeMap;

use kita_genesis_core::{
    AccAddress, ConsensusParams, CurrentRewards, Dec, Delegation, DelegationKey,
    DelegatorStartingInfo, FeePool, HistoricalRewards, Redelegation, RedelegationKey,
    SlashEvent, SlashEventKey, StakingParams, UnbondingDelegation, ValAddress, Validator,
};
use tracing::debug;

use crate::cursor::{Cursor, CursorTracker, Order};
use crate::error::{Result, StoreError};
use crate::traits::{
    BankStore, ConsensusStore, Context, DistributionStore, Snapshot, StakingStore,
};

/// In-memory ledger state.
///
/// Cloning produces an independent copy with its own cursor tracker.
#[derive(Debug, Default)]
pub struct MemoryState {
    data: LedgerData,
    cursors: CursorTracker,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LedgerData {
    height: i64,

    // Staking
    validators: BTreeMap<ValAddress, Validator>,
    delegations: BTreeMap<DelegationKey, Delegation>,
    unbonding: BTreeMap<DelegationKey, UnbondingDelegation>,
    redelegations: BTreeMap<RedelegationKey, Redelegation>,
    last_powers: BTreeMap<ValAddress, i64>,
    last_total_power: i64,
    staking_params: StakingParams,

    // Distribution
    outstanding: BTreeMap<ValAddress, Dec>,
    commission: BTreeMap<ValAddress, Dec>,
    current: BTreeMap<ValAddress, CurrentRewards>,
    historical: BTreeMap<(ValAddress, u64), HistoricalRewards>,
    starting: BTreeMap<DelegationKey, DelegatorStartingInfo>,
    slash_events: BTreeMap<SlashEventKey, SlashEvent>,
    fee_pool: FeePool,

    // Bank
    balances: BTreeMap<AccAddress, u128>,

    consensus_params: ConsensusParams,
}

impl MemoryState {
    /// Create an empty state at height 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty state with the given staking parameters.
    pub fn with_params(params: StakingParams) -> Self {
        let mut state = Self::new();
        state.data.staking_params = params;
        state
    }

    pub fn set_staking_params(&mut self, params: StakingParams) {
        self.data.staking_params = params;
    }

    pub fn set_consensus_params(&mut self, params: ConsensusParams) {
        self.data.consensus_params = params;
    }

    /// Number of cursors currently open on this state.
    pub fn open_cursors(&self) -> usize {
        self.cursors.open_count()
    }
}

impl Clone for MemoryState {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            cursors: CursorTracker::new(),
        }
    }
}

impl PartialEq for MemoryState {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for MemoryState {}

impl Context for MemoryState {
    fn block_height(&self) -> i64 {
        self.data.height
    }

    fn set_block_height(&mut self, height: i64) {
        self.data.height = height;
    }
}

impl Snapshot for MemoryState {
    type Working = MemoryState;

    fn last_block_height(&self) -> i64 {
        self.data.height
    }

    fn working_context(&self, height: i64) -> Result<MemoryState> {
        debug!(height, validators = self.data.validators.len(), "branching working context");
        let mut working = self.clone();
        working.data.height = height;
        Ok(working)
    }
}

impl StakingStore for MemoryState {
    fn validator(&self, address: &ValAddress) -> Result<Option<Validator>> {
        Ok(self.data.validators.get(address).cloned())
    }

    fn set_validator(&mut self, validator: Validator) -> Result<()> {
        self.data
            .validators
            .insert(validator.operator_address.clone(), validator);
        Ok(())
    }

    fn remove_validator(&mut self, address: &ValAddress) -> Result<()> {
        self.data
            .validators
            .remove(address)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("validator {}", address)))
    }

    fn validator_cursor(&self, order: Order) -> Result<Cursor<ValAddress>> {
        let keys = self.data.validators.keys().cloned().collect();
        Ok(self.cursors.open(keys, order))
    }

    fn delegation(&self, key: &DelegationKey) -> Result<Option<Delegation>> {
        Ok(self.data.delegations.get(key).cloned())
    }

    fn set_delegation(&mut self, delegation: Delegation) -> Result<()> {
        self.data.delegations.insert(delegation.key(), delegation);
        Ok(())
    }

    fn delegation_cursor(&self) -> Result<Cursor<DelegationKey>> {
        let keys = self.data.delegations.keys().cloned().collect();
        Ok(self.cursors.open(keys, Order::Ascending))
    }

    fn unbonding_delegation(&self, key: &DelegationKey) -> Result<Option<UnbondingDelegation>> {
        Ok(self.data.unbonding.get(key).cloned())
    }

    fn set_unbonding_delegation(&mut self, ubd: UnbondingDelegation) -> Result<()> {
        self.data.unbonding.insert(ubd.key(), ubd);
        Ok(())
    }

    fn unbonding_delegation_cursor(&self) -> Result<Cursor<DelegationKey>> {
        let keys = self.data.unbonding.keys().cloned().collect();
        Ok(self.cursors.open(keys, Order::Ascending))
    }

    fn redelegation(&self, key: &RedelegationKey) -> Result<Option<Redelegation>> {
        Ok(self.data.redelegations.get(key).cloned())
    }

    fn set_redelegation(&mut self, red: Redelegation) -> Result<()> {
        self.data.redelegations.insert(red.key(), red);
        Ok(())
    }

    fn redelegation_cursor(&self) -> Result<Cursor<RedelegationKey>> {
        let keys = self.data.redelegations.keys().cloned().collect();
        Ok(self.cursors.open(keys, Order::Ascending))
    }

    fn last_validator_powers(&self) -> Result<Vec<(ValAddress, i64)>> {
        Ok(self
            .data
            .last_powers
            .iter()
            .map(|(addr, power)| (addr.clone(), *power))
            .collect())
    }

    fn set_last_validator_power(&mut self, address: &ValAddress, power: i64) -> Result<()> {
        self.data.last_powers.insert(address.clone(), power);
        Ok(())
    }

    fn delete_last_validator_power(&mut self, address: &ValAddress) -> Result<()> {
        self.data.last_powers.remove(address);
        Ok(())
    }

    fn last_total_power(&self) -> Result<i64> {
        Ok(self.data.last_total_power)
    }

    fn set_last_total_power(&mut self, power: i64) -> Result<()> {
        self.data.last_total_power = power;
        Ok(())
    }

    fn staking_params(&self) -> Result<StakingParams> {
        Ok(self.data.staking_params.clone())
    }
}

impl DistributionStore for MemoryState {
    fn outstanding_rewards(&self, validator: &ValAddress) -> Result<Option<Dec>> {
        Ok(self.data.outstanding.get(validator).copied())
    }

    fn set_outstanding_rewards(&mut self, validator: &ValAddress, rewards: Dec) -> Result<()> {
        self.data.outstanding.insert(validator.clone(), rewards);
        Ok(())
    }

    fn accumulated_commission(&self, validator: &ValAddress) -> Result<Option<Dec>> {
        Ok(self.data.commission.get(validator).copied())
    }

    fn set_accumulated_commission(
        &mut self,
        validator: &ValAddress,
        commission: Dec,
    ) -> Result<()> {
        self.data.commission.insert(validator.clone(), commission);
        Ok(())
    }

    fn current_rewards(&self, validator: &ValAddress) -> Result<Option<CurrentRewards>> {
        Ok(self.data.current.get(validator).copied())
    }

    fn set_current_rewards(
        &mut self,
        validator: &ValAddress,
        rewards: CurrentRewards,
    ) -> Result<()> {
        self.data.current.insert(validator.clone(), rewards);
        Ok(())
    }

    fn historical_rewards(
        &self,
        validator: &ValAddress,
        period: u64,
    ) -> Result<Option<HistoricalRewards>> {
        Ok(self
            .data
            .historical
            .get(&(validator.clone(), period))
            .copied())
    }

    fn set_historical_rewards(
        &mut self,
        validator: &ValAddress,
        period: u64,
        rewards: HistoricalRewards,
    ) -> Result<()> {
        self.data
            .historical
            .insert((validator.clone(), period), rewards);
        Ok(())
    }

    fn delete_historical_rewards(&mut self, validator: &ValAddress, period: u64) -> Result<()> {
        self.data.historical.remove(&(validator.clone(), period));
        Ok(())
    }

    fn clear_historical_rewards(&mut self) -> Result<()> {
        self.data.historical.clear();
        Ok(())
    }

    fn starting_info(&self, key: &DelegationKey) -> Result<Option<DelegatorStartingInfo>> {
        Ok(self.data.starting.get(key).copied())
    }

    fn set_starting_info(
        &mut self,
        key: &DelegationKey,
        info: DelegatorStartingInfo,
    ) -> Result<()> {
        self.data.starting.insert(key.clone(), info);
        Ok(())
    }

    fn delete_starting_info(&mut self, key: &DelegationKey) -> Result<()> {
        self.data.starting.remove(key);
        Ok(())
    }

    fn set_slash_event(&mut self, key: SlashEventKey, event: SlashEvent) -> Result<()> {
        self.data.slash_events.insert(key, event);
        Ok(())
    }

    fn clear_slash_events(&mut self) -> Result<()> {
        self.data.slash_events.clear();
        Ok(())
    }

    fn fee_pool(&self) -> Result<FeePool> {
        Ok(self.data.fee_pool)
    }

    fn set_fee_pool(&mut self, pool: FeePool) -> Result<()> {
        self.data.fee_pool = pool;
        Ok(())
    }

    fn all_outstanding_rewards(&self) -> Result<Vec<(ValAddress, Dec)>> {
        Ok(self
            .data
            .outstanding
            .iter()
            .map(|(addr, rewards)| (addr.clone(), *rewards))
            .collect())
    }

    fn all_accumulated_commissions(&self) -> Result<Vec<(ValAddress, Dec)>> {
        Ok(self
            .data
            .commission
            .iter()
            .map(|(addr, commission)| (addr.clone(), *commission))
            .collect())
    }

    fn all_current_rewards(&self) -> Result<Vec<(ValAddress, CurrentRewards)>> {
        Ok(self
            .data
            .current
            .iter()
            .map(|(addr, rewards)| (addr.clone(), *rewards))
            .collect())
    }

    fn all_historical_rewards(&self) -> Result<Vec<(ValAddress, u64, HistoricalRewards)>> {
        Ok(self
            .data
            .historical
            .iter()
            .map(|((addr, period), rewards)| (addr.clone(), *period, *rewards))
            .collect())
    }

    fn all_starting_infos(&self) -> Result<Vec<(DelegationKey, DelegatorStartingInfo)>> {
        Ok(self
            .data
            .starting
            .iter()
            .map(|(key, info)| (key.clone(), *info))
            .collect())
    }

    fn all_slash_events(&self) -> Result<Vec<(SlashEventKey, SlashEvent)>> {
        Ok(self
            .data
            .slash_events
            .iter()
            .map(|(key, event)| (key.clone(), *event))
            .collect())
    }
}

impl BankStore for MemoryState {
    fn balance(&self, address: &AccAddress) -> Result<u128> {
        Ok(self.data.balances.get(address).copied().unwrap_or(0))
    }

    fn credit(&mut self, address: &AccAddress, amount: u128) -> Result<()> {
        let balance = self.data.balances.entry(address.clone()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or_else(|| {
            StoreError::InvalidData(format!("balance overflow for account {}", address))
        })?;
        Ok(())
    }

    fn all_balances(&self) -> Result<Vec<(AccAddress, u128)>> {
        Ok(self
            .data
            .balances
            .iter()
            .map(|(addr, amount)| (addr.clone(), *amount))
            .collect())
    }
}

impl ConsensusStore for MemoryState {
    fn consensus_params(&self) -> Result<ConsensusParams> {
        Ok(self.data.consensus_params.clone())
    }
}
