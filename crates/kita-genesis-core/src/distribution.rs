//! Reward distribution records.
//!
//! Rewards are tracked per validator period. Each period closes with a
//! cumulative reward-per-token ratio, and a delegation's reward is its stake
//! times the ratio difference between the period it started in and the
//! period it ends in.

use serde::{Deserialize, Serialize};

use crate::address::ValAddress;
use crate::dec::Dec;

/// Rewards accumulated in the validator's open period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRewards {
    pub rewards: Dec,
    pub period: u64,
}

/// Closed-period cumulative ratio with a reference count.
///
/// The count tracks the validator's current period plus every delegation
/// whose starting info points at this period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRewards {
    pub cumulative_reward_ratio: Dec,
    pub reference_count: u32,
}

/// Where a delegation's reward accrual starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorStartingInfo {
    pub previous_period: u64,
    pub stake: Dec,
    pub height: i64,
}

/// Key of a slash event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlashEventKey {
    pub validator: ValAddress,
    pub height: i64,
    pub period: u64,
}

/// A recorded slash of a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashEvent {
    pub validator_period: u64,
    pub fraction: Dec,
}

/// Global pool of undistributed funds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePool {
    pub community_pool: Dec,
}
