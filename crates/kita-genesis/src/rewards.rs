//! Period-based reward accounting.
//!
//! Each validator accrues rewards into an open period. Closing the period
//! turns the accrued amount into a reward-per-token ratio and appends it to
//! a cumulative ratio stored under the period number. A delegation
//! remembers the period it started in, so its reward is its stake times
//! the difference between two cumulative ratios.
//!
//! Historical records are reference counted: one reference for the
//! validator's open period, one for every delegation or slash event that
//! points at the period. A record is deleted when its count drops to zero.

use kita_genesis_core::{
    truncate_decimal, Coin, CurrentRewards, Dec, DelegationKey, DelegatorStartingInfo,
    HistoricalRewards, SlashEvent, SlashEventKey, ValAddress, Validator,
};
use kita_genesis_store::LedgerState;

use crate::error::RewardError;

/// Result type for reward operations.
pub type Result<T> = std::result::Result<T, RewardError>;

fn load_validator<S: LedgerState>(state: &S, address: &ValAddress) -> Result<Validator> {
    state
        .validator(address)?
        .ok_or_else(|| RewardError::ValidatorNotFound(address.clone()))
}

fn missing(validator: &ValAddress, what: &'static str) -> RewardError {
    RewardError::MissingRecord {
        validator: validator.clone(),
        what,
    }
}

/// Seed a validator's reward records: period 0 closed at ratio zero, period 1
/// open, nothing accumulated.
pub fn initialize_validator<S: LedgerState>(state: &mut S, validator: &ValAddress) -> Result<()> {
    state.set_historical_rewards(
        validator,
        0,
        HistoricalRewards {
            cumulative_reward_ratio: Dec::ZERO,
            reference_count: 1,
        },
    )?;
    state.set_current_rewards(
        validator,
        CurrentRewards {
            rewards: Dec::ZERO,
            period: 1,
        },
    )?;
    state.set_accumulated_commission(validator, Dec::ZERO)?;
    state.set_outstanding_rewards(validator, Dec::ZERO)?;
    Ok(())
}

/// Split `amount` between the validator's commission and its delegators.
pub fn allocate_tokens_to_validator<S: LedgerState>(
    state: &mut S,
    validator: &Validator,
    amount: Dec,
) -> Result<()> {
    let address = &validator.operator_address;
    let commission = amount.checked_mul(validator.commission_rate)?;
    let shared = amount.checked_sub(commission)?;

    let accumulated = state.accumulated_commission(address)?.unwrap_or(Dec::ZERO);
    state.set_accumulated_commission(address, accumulated.checked_add(commission)?)?;

    let mut current = state
        .current_rewards(address)?
        .ok_or_else(|| missing(address, "current rewards"))?;
    current.rewards = current.rewards.checked_add(shared)?;
    state.set_current_rewards(address, current)?;

    let outstanding = state.outstanding_rewards(address)?.unwrap_or(Dec::ZERO);
    state.set_outstanding_rewards(address, outstanding.checked_add(amount)?)?;
    Ok(())
}

fn increment_reference_count<S: LedgerState>(
    state: &mut S,
    validator: &ValAddress,
    period: u64,
) -> Result<()> {
    let mut record = state
        .historical_rewards(validator, period)?
        .ok_or_else(|| missing(validator, "historical rewards"))?;
    record.reference_count = record
        .reference_count
        .checked_add(1)
        .ok_or_else(|| missing(validator, "reference count headroom"))?;
    state.set_historical_rewards(validator, period, record)?;
    Ok(())
}

fn decrement_reference_count<S: LedgerState>(
    state: &mut S,
    validator: &ValAddress,
    period: u64,
) -> Result<()> {
    let mut record = state
        .historical_rewards(validator, period)?
        .ok_or_else(|| missing(validator, "historical rewards"))?;
    match record.reference_count {
        0 => return Err(missing(validator, "historical reference")),
        1 => state.delete_historical_rewards(validator, period)?,
        _ => {
            record.reference_count -= 1;
            state.set_historical_rewards(validator, period, record)?;
        }
    }
    Ok(())
}

/// Close the validator's open period and return its number.
///
/// Rewards of a validator without tokens cannot be shared out and go to the
/// community pool.
pub fn increment_validator_period<S: LedgerState>(
    state: &mut S,
    validator: &Validator,
) -> Result<u64> {
    let address = &validator.operator_address;
    let current = state
        .current_rewards(address)?
        .ok_or_else(|| missing(address, "current rewards"))?;

    let ratio = if validator.tokens == 0 {
        let mut pool = state.fee_pool()?;
        pool.community_pool = pool.community_pool.checked_add(current.rewards)?;
        state.set_fee_pool(pool)?;

        let outstanding = state.outstanding_rewards(address)?.unwrap_or(Dec::ZERO);
        state.set_outstanding_rewards(address, outstanding.checked_sub(current.rewards)?)?;
        Dec::ZERO
    } else {
        current.rewards.checked_quo_int(validator.tokens)?
    };

    let previous_period = current
        .period
        .checked_sub(1)
        .ok_or_else(|| missing(address, "closed period"))?;
    let previous = state
        .historical_rewards(address, previous_period)?
        .ok_or_else(|| missing(address, "historical rewards"))?;
    decrement_reference_count(state, address, previous_period)?;

    state.set_historical_rewards(
        address,
        current.period,
        HistoricalRewards {
            cumulative_reward_ratio: previous.cumulative_reward_ratio.checked_add(ratio)?,
            reference_count: 1,
        },
    )?;
    state.set_current_rewards(
        address,
        CurrentRewards {
            rewards: Dec::ZERO,
            period: current.period + 1,
        },
    )?;

    Ok(current.period)
}

/// Record a slash of `fraction` at the working height.
///
/// Closes the open period so rewards earned before the slash are paid at
/// the full stake, and pins that period for the slash event.
pub fn update_validator_slash_fraction<S: LedgerState>(
    state: &mut S,
    validator: &Validator,
    fraction: Dec,
) -> Result<()> {
    if fraction > Dec::ONE {
        return Err(kita_genesis_core::CoreError::InvalidDecimal(fraction.to_string()).into());
    }
    let address = &validator.operator_address;
    let period = increment_validator_period(state, validator)?;
    increment_reference_count(state, address, period)?;

    let height = state.block_height();
    state.set_slash_event(
        SlashEventKey {
            validator: address.clone(),
            height,
            period,
        },
        SlashEvent {
            validator_period: period,
            fraction,
        },
    )?;
    Ok(())
}

/// Record where a delegation's accrual starts: the last closed period, the
/// stake its shares currently back, and the working height.
pub fn initialize_delegation<S: LedgerState>(state: &mut S, key: &DelegationKey) -> Result<()> {
    let validator = load_validator(state, &key.validator)?;
    let delegation = state
        .delegation(key)?
        .ok_or_else(|| RewardError::NoDelegation {
            delegator: key.delegator.clone(),
            validator: key.validator.clone(),
        })?;

    let current = state
        .current_rewards(&key.validator)?
        .ok_or_else(|| missing(&key.validator, "current rewards"))?;
    let previous_period = current
        .period
        .checked_sub(1)
        .ok_or_else(|| missing(&key.validator, "closed period"))?;
    increment_reference_count(state, &key.validator, previous_period)?;

    let stake = validator.tokens_from_shares_truncated(delegation.shares)?;
    let height = state.block_height();
    state.set_starting_info(
        key,
        DelegatorStartingInfo {
            previous_period,
            stake,
            height,
        },
    )?;
    Ok(())
}

fn rewards_between<S: LedgerState>(
    state: &S,
    validator: &ValAddress,
    starting_period: u64,
    ending_period: u64,
    stake: Dec,
) -> Result<Dec> {
    let start = state
        .historical_rewards(validator, starting_period)?
        .ok_or_else(|| missing(validator, "starting historical rewards"))?;
    let end = state
        .historical_rewards(validator, ending_period)?
        .ok_or_else(|| missing(validator, "ending historical rewards"))?;
    let difference = end
        .cumulative_reward_ratio
        .checked_sub(start.cumulative_reward_ratio)?;
    Ok(stake.checked_mul(difference)?)
}

/// Rewards owed to a delegation up to `ending_period`.
///
/// Slash events recorded after the delegation started split the range: each
/// segment is paid at the stake that was bonded during it.
pub fn calculate_delegation_rewards<S: LedgerState>(
    state: &S,
    validator: &Validator,
    key: &DelegationKey,
    ending_period: u64,
) -> Result<Dec> {
    let address = &validator.operator_address;
    let starting = state
        .starting_info(key)?
        .ok_or_else(|| missing(address, "delegator starting info"))?;
    let height = state.block_height();

    let mut stake = starting.stake;
    let mut start = starting.previous_period;
    let mut rewards = Dec::ZERO;

    if starting.height < height {
        let slashes = state
            .all_slash_events()?
            .into_iter()
            .filter(|(k, _)| &k.validator == address && k.height > starting.height && k.height <= height);
        for (_, event) in slashes {
            let end = event.validator_period;
            if end > start {
                rewards = rewards.checked_add(rewards_between(state, address, start, end, stake)?)?;
                stake = stake.checked_mul(Dec::ONE.checked_sub(event.fraction)?)?;
                start = end;
            }
        }
    }

    // Rounding in share conversion can leave the recorded stake a hair above
    // what the shares back today.
    let delegation = state
        .delegation(key)?
        .ok_or_else(|| RewardError::NoDelegation {
            delegator: key.delegator.clone(),
            validator: key.validator.clone(),
        })?;
    let current_stake = validator.tokens_from_shares_truncated(delegation.shares)?;
    if stake > current_stake {
        stake = current_stake;
    }

    rewards.checked_add(rewards_between(state, address, start, ending_period, stake)?)
        .map_err(RewardError::from)
}

/// Pay out a delegation's rewards and restart its accrual.
///
/// Whole coins go to the delegator and the fractional remainder to the
/// community pool. Outstanding rewards shrink by the full decimal amount.
pub fn withdraw_delegation_rewards<S: LedgerState>(
    state: &mut S,
    key: &DelegationKey,
    denom: &str,
) -> Result<Coin> {
    let validator = load_validator(state, &key.validator)?;
    let delegation = state
        .delegation(key)?
        .ok_or_else(|| RewardError::NoDelegation {
            delegator: key.delegator.clone(),
            validator: key.validator.clone(),
        })?;
    if delegation.shares.is_zero() || validator.delegator_shares.is_zero() {
        return Err(RewardError::NoPositiveDelegation {
            delegator: key.delegator.clone(),
            validator: key.validator.clone(),
        });
    }

    let ending_period = increment_validator_period(state, &validator)?;
    let mut rewards = calculate_delegation_rewards(state, &validator, key, ending_period)?;

    let outstanding = state
        .outstanding_rewards(&key.validator)?
        .ok_or_else(|| missing(&key.validator, "outstanding rewards"))?;
    if rewards > outstanding {
        rewards = outstanding;
    }

    let (coin, remainder) = truncate_decimal(denom, rewards)?;
    if !coin.is_zero() {
        state.credit(&key.delegator, coin.amount)?;
    }

    state.set_outstanding_rewards(&key.validator, outstanding.checked_sub(rewards)?)?;
    let mut pool = state.fee_pool()?;
    pool.community_pool = pool.community_pool.checked_add(remainder)?;
    state.set_fee_pool(pool)?;

    let starting = state
        .starting_info(key)?
        .ok_or_else(|| missing(&key.validator, "delegator starting info"))?;
    decrement_reference_count(state, &key.validator, starting.previous_period)?;
    state.delete_starting_info(key)?;

    initialize_delegation(state, key)?;
    Ok(coin)
}

/// Pay out a validator's accumulated commission in whole coins.
///
/// The fractional remainder stays accumulated. Fails with `ZeroCoins` when
/// nothing has accumulated.
pub fn withdraw_validator_commission<S: LedgerState>(
    state: &mut S,
    validator: &ValAddress,
    denom: &str,
) -> Result<Coin> {
    let accumulated = state.accumulated_commission(validator)?.unwrap_or(Dec::ZERO);
    if accumulated.is_zero() {
        return Err(RewardError::ZeroCoins(validator.clone()));
    }

    let (coin, remainder) = truncate_decimal(denom, accumulated)?;
    state.set_accumulated_commission(validator, remainder)?;

    let outstanding = state
        .outstanding_rewards(validator)?
        .ok_or_else(|| missing(validator, "outstanding rewards"))?;
    state.set_outstanding_rewards(validator, outstanding.checked_sub(coin.to_dec()?)?)?;

    if !coin.is_zero() {
        state.credit(&validator.to_account(), coin.amount)?;
    }
    Ok(coin)
}
