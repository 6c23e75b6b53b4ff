//! Zero-height normalization.
//!
//! Prepares a working state so the exported ledger can restart at height 0.
//! Stages run strictly in order and the first failure aborts the run. The
//! state may be left half-normalized on error; callers discard it.
//!
//! 1. validate the jail allow-list
//! 2. withdraw every validator's commission
//! 3. withdraw every delegation's reward
//! 4. clear slash events and historical rewards
//! 5. at height 0, sweep outstanding remainders into the community pool and
//!    reseed each validator through `after_validator_created`
//! 6. at height 0, replay `before_delegation_created` then
//!    `after_delegation_modified` for every delegation settled in stage 3
//! 7. zero the creation height of every redelegation and unbonding entry
//! 8. reset unbonding heights and jail validators missing from the allow-list
//! 9. recompute the validator power index

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use kita_genesis_core::{ChainConfig, Dec, Delegation, ValAddress, ValidatorUpdate};
use kita_genesis_store::LedgerState;
use tracing::{debug, info, warn};

use crate::error::{ExportError, Result, RewardError, Stage};
use crate::hooks::LifecycleHooks;
use crate::iterator::ValidatorSetIterator;
use crate::power;
use crate::settlement::RewardSettlement;

/// What a normalization run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Whole coins of commission paid out.
    pub commissions_withdrawn: u128,
    /// Validators whose commission was settled, including those owed nothing.
    pub validators_settled: usize,
    /// Whole coins of delegation rewards paid out.
    pub rewards_withdrawn: u128,
    pub delegations_settled: usize,
    pub slash_events_cleared: usize,
    pub historical_rewards_cleared: usize,
    /// Community pool right before the sweep.
    pub community_pool_before_sweep: Dec,
    /// Sum of outstanding remainders moved into the community pool.
    pub scraps_swept: Dec,
    pub community_pool_after: Dec,
    /// Redelegation and unbonding entries whose creation height was zeroed.
    pub entries_reset: usize,
    pub validators_visited: usize,
    /// Validators newly jailed by the allow-list policy, in visit order.
    pub jailed: Vec<ValAddress>,
    /// Power changes from the final recompute.
    pub validator_updates: Vec<ValidatorUpdate>,
}

/// Runs the zero-height stages against a working state.
#[derive(Debug)]
pub struct ZeroHeightNormalizer<H> {
    config: ChainConfig,
    settlement: RewardSettlement,
    iterator: ValidatorSetIterator,
    hooks: H,
}

impl<H> ZeroHeightNormalizer<H> {
    pub fn new(config: ChainConfig, hooks: H) -> Self {
        Self {
            settlement: RewardSettlement::new(&config),
            iterator: ValidatorSetIterator::new(),
            config,
            hooks,
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Parse validator operator addresses. Fails on the first malformed one.
    pub fn parse_allow_list(&self, allow_list: &[String]) -> Result<BTreeSet<ValAddress>> {
        let codec = self.config.validator_codec();
        allow_list
            .iter()
            .map(|text| {
                ValAddress::from_bech32(text, &codec).map_err(|source| {
                    ExportError::InvalidAddress {
                        stage: Stage::ValidateAllowList,
                        address: text.clone(),
                        source,
                    }
                })
            })
            .collect()
    }

    /// Run all stages. `allow_list` holds bech32 operator addresses exempt
    /// from jailing; an empty list disables the jailing policy.
    pub fn normalize<S>(&mut self, state: &mut S, allow_list: &[String]) -> Result<NormalizationReport>
    where
        S: LedgerState,
        H: LifecycleHooks<S>,
    {
        let allowed = self.parse_allow_list(allow_list)?;
        info!(
            height = state.block_height(),
            allowed = allowed.len(),
            "starting zero-height normalization"
        );

        let mut report = NormalizationReport::default();
        self.withdraw_commissions(state, &mut report)?;
        let delegations = self.withdraw_delegation_rewards(state, &mut report)?;
        self.clear_historical_rewards(state, &mut report)?;

        let height = state.block_height();
        state.set_block_height(0);
        let reseeded = self
            .reinitialize_validators(state, &mut report)
            .and_then(|()| self.reinitialize_delegations(state, &delegations));
        state.set_block_height(height);
        reseeded?;

        self.reset_entry_heights(state, &mut report)?;
        self.normalize_validators(state, &allowed, &mut report)?;

        report.validator_updates =
            power::apply_and_return_validator_set_updates(state, self.config.power_reduction)
                .map_err(ExportError::store(Stage::RecomputePowerIndex))?;
        info!(
            updates = report.validator_updates.len(),
            "recomputed validator power index"
        );

        Ok(report)
    }

    fn withdraw_commissions<S: LedgerState>(
        &self,
        state: &mut S,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        let stage = Stage::WithdrawCommissions;
        let settlement = &self.settlement;

        self.iterator.for_each(state, stage, |state, _, validator| {
            let address = &validator.operator_address;
            match settlement.settle_validator_commission(state, address) {
                Ok(coin) => {
                    report.commissions_withdrawn =
                        report.commissions_withdrawn.saturating_add(coin.amount);
                }
                Err(RewardError::ZeroCoins(_)) => {
                    warn!(validator = %address, "no commission to withdraw");
                }
                Err(e) => return Err(ExportError::settlement(stage, address, e)),
            }
            report.validators_settled += 1;
            Ok(ControlFlow::Continue(()))
        })?;

        info!(
            validators = report.validators_settled,
            withdrawn = report.commissions_withdrawn,
            "withdrew validator commissions"
        );
        Ok(())
    }

    fn withdraw_delegation_rewards<S: LedgerState>(
        &self,
        state: &mut S,
        report: &mut NormalizationReport,
    ) -> Result<Vec<Delegation>> {
        let stage = Stage::WithdrawDelegationRewards;

        let mut delegations = Vec::new();
        for key in state.delegation_cursor().map_err(ExportError::iteration(stage))? {
            if let Some(delegation) = state.delegation(&key).map_err(ExportError::iteration(stage))? {
                delegations.push(delegation);
            }
        }

        for delegation in &delegations {
            let coin = self
                .settlement
                .settle_delegation_reward(state, &delegation.delegator, &delegation.validator)
                .map_err(|e| {
                    ExportError::settlement(
                        stage,
                        format_args!("{}/{}", delegation.delegator, delegation.validator),
                        e,
                    )
                })?;
            report.rewards_withdrawn = report.rewards_withdrawn.saturating_add(coin.amount);
            report.delegations_settled += 1;
        }

        info!(
            delegations = report.delegations_settled,
            withdrawn = report.rewards_withdrawn,
            "withdrew delegation rewards"
        );
        Ok(delegations)
    }

    fn clear_historical_rewards<S: LedgerState>(
        &self,
        state: &mut S,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        let store = || ExportError::store(Stage::ClearHistoricalRewards);

        report.slash_events_cleared = state.all_slash_events().map_err(store())?.len();
        report.historical_rewards_cleared = state.all_historical_rewards().map_err(store())?.len();
        state.clear_slash_events().map_err(store())?;
        state.clear_historical_rewards().map_err(store())?;

        info!(
            slash_events = report.slash_events_cleared,
            historical_rewards = report.historical_rewards_cleared,
            "cleared historical reward bookkeeping"
        );
        Ok(())
    }

    fn reinitialize_validators<S>(&mut self, state: &mut S, report: &mut NormalizationReport) -> Result<()>
    where
        S: LedgerState,
        H: LifecycleHooks<S>,
    {
        let stage = Stage::ReinitializeValidators;
        let store = || ExportError::store(stage);
        let hooks = &mut self.hooks;

        report.community_pool_before_sweep = state.fee_pool().map_err(store())?.community_pool;

        let visited = self.iterator.for_each(state, stage, |state, _, validator| {
            let address = &validator.operator_address;
            let scraps = state
                .outstanding_rewards(address)
                .map_err(store())?
                .unwrap_or(Dec::ZERO);

            let mut pool = state.fee_pool().map_err(store())?;
            pool.community_pool = pool
                .community_pool
                .checked_add(scraps)
                .map_err(|e| ExportError::settlement(stage, address, e.into()))?;
            state.set_fee_pool(pool).map_err(store())?;
            report.scraps_swept = report
                .scraps_swept
                .checked_add(scraps)
                .map_err(|e| ExportError::settlement(stage, address, e.into()))?;

            hooks
                .after_validator_created(state, address)
                .map_err(|source| ExportError::HookFailure {
                    stage,
                    hook: "after_validator_created",
                    subject: address.to_string(),
                    source,
                })?;
            debug!(validator = %address, scraps = %scraps, "reseeded validator rewards");
            Ok(ControlFlow::Continue(()))
        })?;

        report.community_pool_after = state.fee_pool().map_err(store())?.community_pool;
        info!(
            validators = visited,
            scraps = %report.scraps_swept,
            "swept outstanding rewards into community pool"
        );
        Ok(())
    }

    fn reinitialize_delegations<S>(&mut self, state: &mut S, delegations: &[Delegation]) -> Result<()>
    where
        S: LedgerState,
        H: LifecycleHooks<S>,
    {
        let stage = Stage::ReinitializeDelegations;
        let failure = |hook: &'static str, d: &Delegation| {
            let subject = format!("{}/{}", d.delegator, d.validator);
            move |source| ExportError::HookFailure {
                stage,
                hook,
                subject,
                source,
            }
        };

        for d in delegations {
            self.hooks
                .before_delegation_created(state, &d.delegator, &d.validator)
                .map_err(failure("before_delegation_created", d))?;
            self.hooks
                .after_delegation_modified(state, &d.delegator, &d.validator)
                .map_err(failure("after_delegation_modified", d))?;
        }

        info!(delegations = delegations.len(), "reinitialized delegations");
        Ok(())
    }

    fn reset_entry_heights<S: LedgerState>(
        &self,
        state: &mut S,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        let stage = Stage::ResetEntryHeights;

        for key in state.redelegation_cursor().map_err(ExportError::iteration(stage))? {
            let Some(mut red) = state.redelegation(&key).map_err(ExportError::iteration(stage))? else {
                continue;
            };
            for entry in &mut red.entries {
                entry.creation_height = 0;
            }
            report.entries_reset += red.entries.len();
            state.set_redelegation(red).map_err(ExportError::store(stage))?;
        }

        for key in state
            .unbonding_delegation_cursor()
            .map_err(ExportError::iteration(stage))?
        {
            let Some(mut ubd) = state
                .unbonding_delegation(&key)
                .map_err(ExportError::iteration(stage))?
            else {
                continue;
            };
            for entry in &mut ubd.entries {
                entry.creation_height = 0;
            }
            report.entries_reset += ubd.entries.len();
            state.set_unbonding_delegation(ubd).map_err(ExportError::store(stage))?;
        }

        info!(entries = report.entries_reset, "reset entry creation heights");
        Ok(())
    }

    fn normalize_validators<S: LedgerState>(
        &self,
        state: &mut S,
        allowed: &BTreeSet<ValAddress>,
        report: &mut NormalizationReport,
    ) -> Result<()> {
        let stage = Stage::NormalizeValidators;
        let enforce = !allowed.is_empty();

        report.validators_visited = self.iterator.for_each(state, stage, |state, index, mut validator| {
            validator.unbonding_height = 0;
            if enforce && !allowed.contains(&validator.operator_address) && !validator.jailed {
                validator.jailed = true;
                debug!(index, validator = %validator.operator_address, "jailed validator");
                report.jailed.push(validator.operator_address.clone());
            }
            state.set_validator(validator).map_err(ExportError::store(stage))?;
            Ok(ControlFlow::Continue(()))
        })?;

        info!(
            validators = report.validators_visited,
            jailed = report.jailed.len(),
            "normalized validator records"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::DistributionHooks;
    use crate::rewards;
    use kita_genesis_core::{
        AccAddress, ConsensusPubKey, DelegationKey, Redelegation, RedelegationEntry,
        RedelegationKey, Validator,
    };
    use kita_genesis_store::{Context, DistributionStore, MemoryState, StakingStore};

    fn validator_address(byte: u8) -> ValAddress {
        ValAddress::from_bytes([byte; 20])
    }

    /// Validators 1..=n with one delegator each, 10 tokens allocated to each.
    fn ledger(n: u8) -> MemoryState {
        let mut state = MemoryState::new();
        state.set_block_height(100);
        for byte in 1..=n {
            let mut validator = Validator::new(
                validator_address(byte),
                ConsensusPubKey([byte; 32]),
                format!("v{}", byte),
                "0.05".parse().unwrap(),
            );
            validator.tokens = 2_000_000;
            validator.delegator_shares = Dec::from_int(2_000_000).unwrap();
            validator.unbonding_height = 40;
            state.set_validator(validator.clone()).unwrap();
            rewards::initialize_validator(&mut state, &validator.operator_address).unwrap();

            let delegator = AccAddress::from_bytes([byte + 100; 20]);
            rewards::increment_validator_period(&mut state, &validator).unwrap();
            state
                .set_delegation(Delegation {
                    delegator: delegator.clone(),
                    validator: validator.operator_address.clone(),
                    shares: validator.delegator_shares,
                })
                .unwrap();
            rewards::initialize_delegation(
                &mut state,
                &DelegationKey::new(delegator, validator.operator_address.clone()),
            )
            .unwrap();
            rewards::allocate_tokens_to_validator(&mut state, &validator, Dec::from_int(10).unwrap())
                .unwrap();
        }
        power::apply_and_return_validator_set_updates(&mut state, 1_000_000).unwrap();
        state
    }

    fn bech32(byte: u8) -> String {
        validator_address(byte)
            .to_bech32(&ChainConfig::default().validator_codec())
            .unwrap()
    }

    #[test]
    fn test_allow_list_jails_others() {
        let mut state = ledger(3);
        let mut normalizer = ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks);
        let report = normalizer.normalize(&mut state, &[bech32(1)]).unwrap();

        assert!(!state.validator(&validator_address(1)).unwrap().unwrap().jailed);
        assert!(state.validator(&validator_address(2)).unwrap().unwrap().jailed);
        assert!(state.validator(&validator_address(3)).unwrap().unwrap().jailed);
        // Highest key first.
        assert_eq!(report.jailed, vec![validator_address(3), validator_address(2)]);
        assert_eq!(report.validators_visited, 3);
    }

    #[test]
    fn test_unbonding_heights_reset() {
        let mut state = ledger(2);
        ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks)
            .normalize(&mut state, &[])
            .unwrap();
        for byte in 1..=2 {
            let v = state.validator(&validator_address(byte)).unwrap().unwrap();
            assert_eq!(v.unbonding_height, 0);
            assert!(!v.jailed);
        }
        assert_eq!(state.block_height(), 100);
    }

    #[test]
    fn test_scraps_swept_and_reward_state_reseeded() {
        let mut state = ledger(1);
        let report = ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks)
            .normalize(&mut state, &[])
            .unwrap();

        // Commission 0.5 cannot be paid in whole coins, reward 9.5 pays 9.
        assert_eq!(report.commissions_withdrawn, 0);
        assert_eq!(report.rewards_withdrawn, 9);
        assert_eq!(report.community_pool_before_sweep, "0.5".parse().unwrap());
        assert_eq!(report.scraps_swept, "0.5".parse().unwrap());
        assert_eq!(report.community_pool_after, Dec::ONE);
        assert_eq!(state.fee_pool().unwrap().community_pool, Dec::ONE);

        let addr = validator_address(1);
        assert_eq!(state.outstanding_rewards(&addr).unwrap(), Some(Dec::ZERO));
        assert_eq!(state.accumulated_commission(&addr).unwrap(), Some(Dec::ZERO));
        let key = DelegationKey::new(AccAddress::from_bytes([101; 20]), addr);
        let info = state.starting_info(&key).unwrap().unwrap();
        assert_eq!(info.height, 0);
        assert_eq!(info.previous_period, 1);
    }

    #[test]
    fn test_entry_heights_zeroed() {
        let mut state = ledger(2);
        state
            .set_redelegation(Redelegation {
                delegator: AccAddress::from_bytes([101; 20]),
                validator_src: validator_address(1),
                validator_dst: validator_address(2),
                entries: vec![
                    RedelegationEntry {
                        creation_height: 90,
                        completion_time: 5,
                        initial_balance: 1,
                        shares_dst: Dec::ONE,
                    };
                    2
                ],
            })
            .unwrap();

        let report = ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks)
            .normalize(&mut state, &[])
            .unwrap();
        assert_eq!(report.entries_reset, 2);
        let key = RedelegationKey {
            delegator: AccAddress::from_bytes([101; 20]),
            validator_src: validator_address(1),
            validator_dst: validator_address(2),
        };
        let red = state.redelegation(&key).unwrap().unwrap();
        assert!(red.entries.iter().all(|e| e.creation_height == 0));
    }

    #[test]
    fn test_malformed_allow_list_leaves_state_untouched() {
        let mut state = ledger(2);
        let before = state.clone();
        let err = ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks)
            .normalize(&mut state, &[bech32(1), "not-an-address".to_string()])
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::InvalidAddress { stage: Stage::ValidateAllowList, ref address, .. }
                if address == "not-an-address"
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_jailed_validators_leave_bonded_set() {
        let mut state = ledger(3);
        let report = ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks)
            .normalize(&mut state, &[bech32(2)])
            .unwrap();

        assert_eq!(report.validator_updates.len(), 2);
        assert!(report.validator_updates.iter().all(|u| u.power == 0));
        let bonded: Vec<_> = state
            .last_validator_powers()
            .unwrap()
            .into_iter()
            .map(|(a, _)| a)
            .collect();
        assert_eq!(bonded, vec![validator_address(2)]);
    }
}
