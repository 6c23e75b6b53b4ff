use kita_genesis_core::coin::int_string;
use kita_genesis_core::{
    BondStatus, ChainConfig, Dec, RedelegationEntry, StakingParams, UnbondingDelegationEntry,
};
use kita_genesis_store::{LedgerState, Order};
use serde::{Deserialize, Serialize};

use super::{encode_address, ModuleExporter};
use crate::error::{ExportError, Result, Stage};
use crate::genesis::GenesisPubKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastValidatorPower {
    pub address: String,
    pub power: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub operator_address: String,
    pub consensus_pubkey: GenesisPubKey,
    pub moniker: String,
    pub jailed: bool,
    pub status: BondStatus,
    #[serde(with = "int_string")]
    pub tokens: u128,
    pub delegator_shares: Dec,
    pub unbonding_height: i64,
    pub unbonding_time: i64,
    pub commission_rate: Dec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub delegator_address: String,
    pub validator_address: String,
    pub shares: Dec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegationRecord {
    pub delegator_address: String,
    pub validator_address: String,
    pub entries: Vec<UnbondingDelegationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationRecord {
    pub delegator_address: String,
    pub validator_src_address: String,
    pub validator_dst_address: String,
    pub entries: Vec<RedelegationEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingGenesis {
    pub params: StakingParams,
    pub last_total_power: i64,
    pub last_validator_powers: Vec<LastValidatorPower>,
    pub validators: Vec<ValidatorRecord>,
    pub delegations: Vec<DelegationRecord>,
    pub unbonding_delegations: Vec<UnbondingDelegationRecord>,
    pub redelegations: Vec<RedelegationRecord>,
    pub exported: bool,
}

/// Validator registry, delegations and unbonding queues.
#[derive(Debug, Clone, Copy, Default)]
pub struct StakingModule;

impl<S: LedgerState> ModuleExporter<S> for StakingModule {
    fn name(&self) -> &'static str {
        "staking"
    }

    fn export_genesis(&self, state: &S, config: &ChainConfig) -> Result<serde_json::Value> {
        let stage = Stage::ExportModules;
        let acc = config.account_codec();
        let val = config.validator_codec();

        let last_validator_powers = state
            .last_validator_powers()
            .map_err(ExportError::store(stage))?
            .into_iter()
            .map(|(address, power)| {
                Ok(LastValidatorPower {
                    address: encode_address(address.as_bytes(), &val)?,
                    power,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut validators = Vec::new();
        for address in state
            .validator_cursor(Order::Ascending)
            .map_err(ExportError::iteration(stage))?
        {
            let Some(v) = state.validator(&address).map_err(ExportError::store(stage))? else {
                continue;
            };
            validators.push(ValidatorRecord {
                operator_address: encode_address(address.as_bytes(), &val)?,
                consensus_pubkey: GenesisPubKey {
                    key_type: v.consensus_pubkey.key_type().to_string(),
                    value: v.consensus_pubkey.to_hex(),
                },
                moniker: v.moniker,
                jailed: v.jailed,
                status: v.status,
                tokens: v.tokens,
                delegator_shares: v.delegator_shares,
                unbonding_height: v.unbonding_height,
                unbonding_time: v.unbonding_time,
                commission_rate: v.commission_rate,
            });
        }

        let mut delegations = Vec::new();
        for key in state.delegation_cursor().map_err(ExportError::iteration(stage))? {
            if let Some(d) = state.delegation(&key).map_err(ExportError::store(stage))? {
                delegations.push(DelegationRecord {
                    delegator_address: encode_address(d.delegator.as_bytes(), &acc)?,
                    validator_address: encode_address(d.validator.as_bytes(), &val)?,
                    shares: d.shares,
                });
            }
        }

        let mut unbonding_delegations = Vec::new();
        for key in state
            .unbonding_delegation_cursor()
            .map_err(ExportError::iteration(stage))?
        {
            if let Some(ubd) = state
                .unbonding_delegation(&key)
                .map_err(ExportError::store(stage))?
            {
                unbonding_delegations.push(UnbondingDelegationRecord {
                    delegator_address: encode_address(ubd.delegator.as_bytes(), &acc)?,
                    validator_address: encode_address(ubd.validator.as_bytes(), &val)?,
                    entries: ubd.entries,
                });
            }
        }

        let mut redelegations = Vec::new();
        for key in state
            .redelegation_cursor()
            .map_err(ExportError::iteration(stage))?
        {
            if let Some(red) = state.redelegation(&key).map_err(ExportError::store(stage))? {
                redelegations.push(RedelegationRecord {
                    delegator_address: encode_address(red.delegator.as_bytes(), &acc)?,
                    validator_src_address: encode_address(red.validator_src.as_bytes(), &val)?,
                    validator_dst_address: encode_address(red.validator_dst.as_bytes(), &val)?,
                    entries: red.entries,
                });
            }
        }

        let genesis = StakingGenesis {
            params: state.staking_params().map_err(ExportError::store(stage))?,
            last_total_power: state.last_total_power().map_err(ExportError::store(stage))?,
            last_validator_powers,
            validators,
            delegations,
            unbonding_delegations,
            redelegations,
            exported: true,
        };
        Ok(serde_json::to_value(genesis)?)
    }
}
