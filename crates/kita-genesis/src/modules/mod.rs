//! Per-module genesis export.
//!
//! Each module turns its slice of the ledger into a JSON value. The manager
//! keeps modules in registration order and assembles the app state.

mod bank;
mod distribution;
mod staking;

pub use bank::{Balance, BankGenesis, BankModule};
pub use distribution::{
    AccumulatedCommissionRecord, CurrentRewardsRecord, DistributionGenesis, DistributionModule,
    HistoricalRewardsRecord, OutstandingRewardsRecord, SlashEventRecord, StartingInfoRecord,
};
pub use staking::{
    DelegationRecord, LastValidatorPower, RedelegationRecord, StakingGenesis, StakingModule,
    UnbondingDelegationRecord, ValidatorRecord,
};

use std::fmt;

use kita_genesis_core::{AddressCodec, ChainConfig};
use kita_genesis_store::LedgerState;
use tracing::debug;

use crate::error::{ExportError, Result, Stage};
use crate::genesis::AppState;

/// A module that contributes a section of the app state.
pub trait ModuleExporter<S> {
    /// Key of the module's section in the app state.
    fn name(&self) -> &'static str;

    fn export_genesis(&self, state: &S, config: &ChainConfig) -> Result<serde_json::Value>;
}

/// Registered module exporters, in registration order.
pub struct ModuleManager<S> {
    modules: Vec<Box<dyn ModuleExporter<S>>>,
}

impl<S> ModuleManager<S> {
    /// A manager with no modules.
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn register(&mut self, module: impl ModuleExporter<S> + 'static) -> &mut Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Reject any name in `filter` that no registered module answers to.
    pub fn check_filter(&self, filter: &[String]) -> Result<()> {
        match filter
            .iter()
            .find(|name| !self.modules.iter().any(|m| m.name() == name.as_str()))
        {
            Some(name) => Err(ExportError::UnknownModule(name.clone())),
            None => Ok(()),
        }
    }

    /// Export every module, or only those named in `filter` when it is not
    /// empty. Unknown names are rejected before anything is exported.
    pub fn export_genesis_for_modules(
        &self,
        state: &S,
        config: &ChainConfig,
        filter: &[String],
    ) -> Result<AppState> {
        self.check_filter(filter)?;

        let mut app_state = AppState::new();
        for module in &self.modules {
            if !filter.is_empty() && !filter.iter().any(|name| name == module.name()) {
                continue;
            }
            let section = module.export_genesis(state, config)?;
            debug!(module = module.name(), "exported module genesis");
            app_state.insert(module.name().to_string(), section);
        }
        Ok(app_state)
    }
}

impl<S: LedgerState> ModuleManager<S> {
    /// Bank, staking and distribution.
    pub fn with_default_modules() -> Self {
        let mut manager = Self::new();
        manager
            .register(BankModule)
            .register(StakingModule)
            .register(DistributionModule);
        manager
    }
}

impl<S: LedgerState> Default for ModuleManager<S> {
    fn default() -> Self {
        Self::with_default_modules()
    }
}

impl<S> fmt::Debug for ModuleManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleManager")
            .field("modules", &self.module_names())
            .finish()
    }
}

pub(crate) fn encode_address(bytes: &[u8], codec: &AddressCodec) -> Result<String> {
    codec
        .encode(bytes)
        .map_err(|source| ExportError::InvalidAddress {
            stage: Stage::ExportModules,
            address: hex::encode(bytes),
            source,
        })
}
