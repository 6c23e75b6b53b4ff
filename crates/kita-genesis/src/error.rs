//! Error types for genesis export.

use std::fmt;

use kita_genesis_core::{AccAddress, CoreError, ValAddress};
use kita_genesis_store::StoreError;
use thiserror::Error;

/// A step of the export pipeline, used to locate failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    OpenContext,
    ValidateAllowList,
    WithdrawCommissions,
    WithdrawDelegationRewards,
    ClearHistoricalRewards,
    ReinitializeValidators,
    ReinitializeDelegations,
    ResetEntryHeights,
    NormalizeValidators,
    RecomputePowerIndex,
    ExportModules,
    CollectValidators,
}

impl Stage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Stage::OpenContext => "open_context",
            Stage::ValidateAllowList => "validate_allow_list",
            Stage::WithdrawCommissions => "withdraw_commissions",
            Stage::WithdrawDelegationRewards => "withdraw_delegation_rewards",
            Stage::ClearHistoricalRewards => "clear_historical_rewards",
            Stage::ReinitializeValidators => "reinitialize_validators",
            Stage::ReinitializeDelegations => "reinitialize_delegations",
            Stage::ResetEntryHeights => "reset_entry_heights",
            Stage::NormalizeValidators => "normalize_validators",
            Stage::RecomputePowerIndex => "recompute_power_index",
            Stage::ExportModules => "export_modules",
            Stage::CollectValidators => "collect_validators",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the reward ledger and the lifecycle hooks built on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("validator not found: {0}")]
    ValidatorNotFound(ValAddress),

    #[error("no delegation from {delegator} to {validator}")]
    NoDelegation {
        delegator: AccAddress,
        validator: ValAddress,
    },

    #[error("delegation from {delegator} to {validator} has no shares")]
    NoPositiveDelegation {
        delegator: AccAddress,
        validator: ValAddress,
    },

    /// Nothing is owed. Settlement treats this as success.
    #[error("no commission accumulated for validator {0}")]
    ZeroCoins(ValAddress),

    #[error("missing {what} for validator {validator}")]
    MissingRecord {
        validator: ValAddress,
        what: &'static str,
    },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("arithmetic error: {0}")]
    Core(#[from] CoreError),
}

/// Errors that abort an export.
///
/// Every variant raised inside a stage carries the stage and, where there is
/// one, the identity being processed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid address {address:?} in {stage}: {source}")]
    InvalidAddress {
        stage: Stage,
        address: String,
        #[source]
        source: CoreError,
    },

    #[error("{what} not found in {stage}")]
    NotFound { stage: Stage, what: String },

    #[error("iteration failed in {stage}: {source}")]
    IterationFailure {
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("serialization failed: {0}")]
    SerializationFailure(#[from] serde_json::Error),

    #[error("hook {hook} failed in {stage} for {subject}: {source}")]
    HookFailure {
        stage: Stage,
        hook: &'static str,
        subject: String,
        #[source]
        source: RewardError,
    },

    #[error("settlement failed in {stage} for {subject}: {source}")]
    Settlement {
        stage: Stage,
        subject: String,
        #[source]
        source: RewardError,
    },

    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("block height {0} has no successor")]
    HeightOverflow(i64),

    #[error("storage error in {stage}: {source}")]
    Store {
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// The stage the error was raised in, if it was raised inside one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ExportError::InvalidAddress { stage, .. }
            | ExportError::NotFound { stage, .. }
            | ExportError::IterationFailure { stage, .. }
            | ExportError::HookFailure { stage, .. }
            | ExportError::Settlement { stage, .. }
            | ExportError::Store { stage, .. } => Some(*stage),
            ExportError::SerializationFailure(_)
            | ExportError::UnknownModule(_)
            | ExportError::HeightOverflow(_)
            | ExportError::Io(_) => None,
        }
    }

    /// Map a settlement failure, surfacing a missing validator as `NotFound`.
    pub(crate) fn settlement(stage: Stage, subject: impl fmt::Display, source: RewardError) -> Self {
        match source {
            RewardError::ValidatorNotFound(validator) => ExportError::NotFound {
                stage,
                what: format!("validator {}", validator),
            },
            source => ExportError::Settlement {
                stage,
                subject: subject.to_string(),
                source,
            },
        }
    }

    pub(crate) fn store(stage: Stage) -> impl FnOnce(StoreError) -> Self {
        move |source| ExportError::Store { stage, source }
    }

    pub(crate) fn iteration(stage: Stage) -> impl FnOnce(StoreError) -> Self {
        move |source| ExportError::IterationFailure { stage, source }
    }
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
