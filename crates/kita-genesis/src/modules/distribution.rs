use kita_genesis_core::{
    ChainConfig, CurrentRewards, Dec, DelegatorStartingInfo, FeePool, HistoricalRewards,
    SlashEvent,
};
use kita_genesis_store::LedgerState;
use serde::{Deserialize, Serialize};

use super::{encode_address, ModuleExporter};
use crate::error::{ExportError, Result, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingRewardsRecord {
    pub validator_address: String,
    pub outstanding_rewards: Dec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedCommissionRecord {
    pub validator_address: String,
    pub accumulated: Dec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRewardsRecord {
    pub validator_address: String,
    pub period: u64,
    pub rewards: HistoricalRewards,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRewardsRecord {
    pub validator_address: String,
    pub rewards: CurrentRewards,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingInfoRecord {
    pub delegator_address: String,
    pub validator_address: String,
    pub starting_info: DelegatorStartingInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashEventRecord {
    pub validator_address: String,
    pub height: i64,
    pub period: u64,
    pub validator_slash_event: SlashEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionGenesis {
    pub fee_pool: FeePool,
    pub outstanding_rewards: Vec<OutstandingRewardsRecord>,
    pub validator_accumulated_commissions: Vec<AccumulatedCommissionRecord>,
    pub validator_historical_rewards: Vec<HistoricalRewardsRecord>,
    pub validator_current_rewards: Vec<CurrentRewardsRecord>,
    pub delegator_starting_infos: Vec<StartingInfoRecord>,
    pub validator_slash_events: Vec<SlashEventRecord>,
}

/// Reward ledger and community pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionModule;

impl<S: LedgerState> ModuleExporter<S> for DistributionModule {
    fn name(&self) -> &'static str {
        "distribution"
    }

    fn export_genesis(&self, state: &S, config: &ChainConfig) -> Result<serde_json::Value> {
        let store = || ExportError::store(Stage::ExportModules);
        let acc = config.account_codec();
        let val = config.validator_codec();

        let outstanding_rewards = state
            .all_outstanding_rewards()
            .map_err(store())?
            .into_iter()
            .map(|(address, outstanding_rewards)| {
                Ok(OutstandingRewardsRecord {
                    validator_address: encode_address(address.as_bytes(), &val)?,
                    outstanding_rewards,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validator_accumulated_commissions = state
            .all_accumulated_commissions()
            .map_err(store())?
            .into_iter()
            .map(|(address, accumulated)| {
                Ok(AccumulatedCommissionRecord {
                    validator_address: encode_address(address.as_bytes(), &val)?,
                    accumulated,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validator_historical_rewards = state
            .all_historical_rewards()
            .map_err(store())?
            .into_iter()
            .map(|(address, period, rewards)| {
                Ok(HistoricalRewardsRecord {
                    validator_address: encode_address(address.as_bytes(), &val)?,
                    period,
                    rewards,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validator_current_rewards = state
            .all_current_rewards()
            .map_err(store())?
            .into_iter()
            .map(|(address, rewards)| {
                Ok(CurrentRewardsRecord {
                    validator_address: encode_address(address.as_bytes(), &val)?,
                    rewards,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let delegator_starting_infos = state
            .all_starting_infos()
            .map_err(store())?
            .into_iter()
            .map(|(key, starting_info)| {
                Ok(StartingInfoRecord {
                    delegator_address: encode_address(key.delegator.as_bytes(), &acc)?,
                    validator_address: encode_address(key.validator.as_bytes(), &val)?,
                    starting_info,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let validator_slash_events = state
            .all_slash_events()
            .map_err(store())?
            .into_iter()
            .map(|(key, validator_slash_event)| {
                Ok(SlashEventRecord {
                    validator_address: encode_address(key.validator.as_bytes(), &val)?,
                    height: key.height,
                    period: key.period,
                    validator_slash_event,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let genesis = DistributionGenesis {
            fee_pool: state.fee_pool().map_err(store())?,
            outstanding_rewards,
            validator_accumulated_commissions,
            validator_historical_rewards,
            validator_current_rewards,
            delegator_starting_infos,
            validator_slash_events,
        };
        Ok(serde_json::to_value(genesis)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kita_genesis_core::ValAddress;
    use kita_genesis_store::{DistributionStore, MemoryState};

    #[test]
    fn test_export_reward_ledger() {
        let mut state = MemoryState::new();
        let addr = ValAddress::from_bytes([1; 20]);
        crate::rewards::initialize_validator(&mut state, &addr).unwrap();
        state
            .set_fee_pool(FeePool {
                community_pool: "1.5".parse().unwrap(),
            })
            .unwrap();

        let value = DistributionModule
            .export_genesis(&state, &ChainConfig::default())
            .unwrap();
        assert_eq!(value["fee_pool"]["community_pool"], "1.500000000000000000");

        let genesis: DistributionGenesis = serde_json::from_value(value).unwrap();
        assert_eq!(genesis.validator_historical_rewards.len(), 1);
        assert_eq!(genesis.validator_historical_rewards[0].period, 0);
        assert_eq!(genesis.validator_current_rewards[0].rewards.period, 1);
        assert!(genesis.outstanding_rewards[0]
            .validator_address
            .starts_with("kitavaloper1"));
        assert!(genesis.validator_slash_events.is_empty());
    }
}
