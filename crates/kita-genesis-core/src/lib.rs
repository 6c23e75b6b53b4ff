//! # Kita Genesis Core
//!
//! Pure ledger records for genesis export: addresses, decimals, staking and
//! distribution state.
//!
//! This crate contains no I/O and no storage. It is plain data plus the
//! arithmetic the reward accounting needs.
//!
//! ## Key Types
//!
//! - [`ValAddress`] / [`AccAddress`] - Raw addresses, encoded with an explicit [`AddressCodec`]
//! - [`ChainConfig`] - Prefixes, denomination and power reduction
//! - [`Dec`] - 18-digit fixed-point decimal, truncating
//! - [`Validator`], [`Delegation`], [`Redelegation`], [`UnbondingDelegation`] - Staking records
//! - [`CurrentRewards`], [`HistoricalRewards`], [`DelegatorStartingInfo`], [`FeePool`] - Distribution records

pub mod address;
pub mod coin;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod dec;
pub mod distribution;
pub mod error;
pub mod staking;

pub use address::{verify_address_bytes, AccAddress, AddressCodec, ConsAddress, ValAddress};
pub use coin::{truncate_decimal, Coin};
pub use config::ChainConfig;
pub use consensus::ConsensusParams;
pub use crypto::ConsensusPubKey;
pub use dec::Dec;
pub use distribution::{
    CurrentRewards, DelegatorStartingInfo, FeePool, HistoricalRewards, SlashEvent, SlashEventKey,
};
pub use error::{CoreError, Result};
pub use staking::{
    BondStatus, Delegation, DelegationKey, Redelegation, RedelegationEntry, RedelegationKey,
    StakingParams, UnbondingDelegation, UnbondingDelegationEntry, Validator, ValidatorUpdate,
};
