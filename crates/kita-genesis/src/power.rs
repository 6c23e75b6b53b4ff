//! Validator power index.
//!
//! The bonded set is the `max_validators` highest-power validators that are
//! not jailed. The last committed set lives in the last-power table; the
//! difference between the two is what the consensus engine is told.

use std::collections::BTreeMap;

use kita_genesis_core::{BondStatus, ChainConfig, ValAddress, ValidatorUpdate};
use kita_genesis_store::{LedgerState, Order, StakingStore, StoreError};
use tracing::debug;

use crate::error::{ExportError, Result, Stage};
use crate::genesis::{GenesisPubKey, GenesisValidator};

/// Recompute the bonded set and return the power changes.
///
/// Candidates are sorted by power, highest first, with ties broken by
/// operator address. Validators entering the set become `Bonded`; those
/// leaving it get a zero-power update and start unbonding at the working
/// height. The last-power table and total are rewritten.
pub fn apply_and_return_validator_set_updates<S: LedgerState>(
    state: &mut S,
    power_reduction: u128,
) -> kita_genesis_store::Result<Vec<ValidatorUpdate>> {
    let max_validators = state.staking_params()?.max_validators as usize;
    let mut last: BTreeMap<ValAddress, i64> = state.last_validator_powers()?.into_iter().collect();

    let mut candidates = Vec::new();
    for address in state.validator_cursor(Order::Ascending)? {
        let Some(validator) = state.validator(&address)? else {
            continue;
        };
        let power = validator.consensus_power(power_reduction);
        if !validator.jailed && power > 0 {
            candidates.push((power, address));
        }
    }
    candidates.sort_by(|(pa, aa), (pb, ab)| pb.cmp(pa).then_with(|| aa.cmp(ab)));
    candidates.truncate(max_validators);

    let mut updates = Vec::new();
    let mut total_power: i64 = 0;

    for (power, address) in candidates {
        let mut validator = state
            .validator(&address)?
            .ok_or_else(|| StoreError::NotFound(format!("validator {}", address)))?;

        if last.remove(&address) != Some(power) {
            updates.push(ValidatorUpdate {
                pub_key: validator.consensus_pubkey,
                power,
            });
            state.set_last_validator_power(&address, power)?;
        }
        if validator.status != BondStatus::Bonded {
            validator.status = BondStatus::Bonded;
            state.set_validator(validator)?;
        }
        total_power = total_power.saturating_add(power);
    }

    let height = state.block_height();
    for (address, _) in last {
        if let Some(mut validator) = state.validator(&address)? {
            updates.push(ValidatorUpdate {
                pub_key: validator.consensus_pubkey,
                power: 0,
            });
            validator.status = BondStatus::Unbonding;
            validator.unbonding_height = height;
            state.set_validator(validator)?;
        }
        state.delete_last_validator_power(&address)?;
    }

    state.set_last_total_power(total_power)?;
    debug!(updates = updates.len(), total_power, "applied validator set updates");
    Ok(updates)
}

/// The consensus-facing validator list, built from the last-power table.
pub fn write_validators<S: StakingStore>(
    state: &S,
    config: &ChainConfig,
) -> Result<Vec<GenesisValidator>> {
    let stage = Stage::CollectValidators;
    let codec = config.consensus_codec();

    let mut validators = Vec::new();
    for (address, power) in state.last_validator_powers().map_err(ExportError::store(stage))? {
        let validator = state
            .validator(&address)
            .map_err(ExportError::store(stage))?
            .ok_or_else(|| ExportError::NotFound {
                stage,
                what: format!("bonded validator {}", address),
            })?;

        let cons_address = validator.consensus_pubkey.address();
        let encoded = cons_address
            .to_bech32(&codec)
            .map_err(|source| ExportError::InvalidAddress {
                stage,
                address: cons_address.to_hex(),
                source,
            })?;

        validators.push(GenesisValidator {
            address: encoded,
            pub_key: GenesisPubKey {
                key_type: validator.consensus_pubkey.key_type().to_string(),
                value: validator.consensus_pubkey.to_hex(),
            },
            power,
            name: validator.moniker,
        });
    }
    Ok(validators)
}
