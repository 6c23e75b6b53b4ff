//! The export entry point.

use kita_genesis_core::ChainConfig;
use kita_genesis_store::{LedgerState, Snapshot};
use tracing::info;

use crate::error::{ExportError, Result, Stage};
use crate::genesis::ExportedApp;
use crate::hooks::{DistributionHooks, LifecycleHooks};
use crate::modules::ModuleManager;
use crate::normalizer::{NormalizationReport, ZeroHeightNormalizer};
use crate::power;

/// Operator input of one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    /// Normalize the state so the exported chain restarts at height 0.
    pub for_zero_height: bool,
    /// Bech32 operator addresses exempt from jailing. Only read for
    /// zero-height exports; empty disables jailing.
    pub jail_allowed_addrs: Vec<String>,
    /// Modules to include. Empty exports all of them.
    pub modules_to_export: Vec<String>,
}

impl ExportRequest {
    pub fn zero_height(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            for_zero_height: true,
            jail_allowed_addrs: allowed.into_iter().map(Into::into).collect(),
            modules_to_export: Vec::new(),
        }
    }

    pub fn with_modules(mut self, modules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.modules_to_export = modules.into_iter().map(Into::into).collect();
        self
    }
}

/// Produces genesis exports from committed snapshots.
///
/// Every export runs against a fresh working context branched from the
/// snapshot. The snapshot itself is never written to, so a failed export
/// leaves nothing to roll back.
#[derive(Debug)]
pub struct GenesisExporter<W, H = DistributionHooks> {
    config: ChainConfig,
    modules: ModuleManager<W>,
    hooks: H,
}

impl<W: LedgerState> GenesisExporter<W, DistributionHooks> {
    /// An exporter with the default modules and reward hooks.
    pub fn new(config: ChainConfig) -> Self {
        Self::with_hooks(config, DistributionHooks)
    }
}

impl<W: LedgerState, H: LifecycleHooks<W>> GenesisExporter<W, H> {
    pub fn with_hooks(config: ChainConfig, hooks: H) -> Self {
        Self {
            config,
            modules: ModuleManager::with_default_modules(),
            hooks,
        }
    }

    /// Replace the registered modules.
    pub fn with_modules(mut self, modules: ModuleManager<W>) -> Self {
        self.modules = modules;
        self
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn modules(&self) -> &ModuleManager<W> {
        &self.modules
    }

    /// Export the app state, validator list and consensus parameters.
    pub fn export<P>(&mut self, snapshot: &P, request: &ExportRequest) -> Result<ExportedApp>
    where
        P: Snapshot<Working = W>,
    {
        self.export_with_report(snapshot, request).map(|(app, _)| app)
    }

    /// Like [`export`](Self::export), also returning what normalization did.
    pub fn export_with_report<P>(
        &mut self,
        snapshot: &P,
        request: &ExportRequest,
    ) -> Result<(ExportedApp, Option<NormalizationReport>)>
    where
        P: Snapshot<Working = W>,
    {
        self.modules.check_filter(&request.modules_to_export)?;

        let last_height = snapshot.last_block_height();
        let height = if request.for_zero_height {
            0
        } else {
            last_height
                .checked_add(1)
                .ok_or(ExportError::HeightOverflow(last_height))?
        };

        let mut working = snapshot
            .working_context(last_height)
            .map_err(ExportError::store(Stage::OpenContext))?;

        let report = if request.for_zero_height {
            let mut normalizer = ZeroHeightNormalizer::new(self.config.clone(), &mut self.hooks);
            Some(normalizer.normalize(&mut working, &request.jail_allowed_addrs)?)
        } else {
            None
        };

        let app_state = self.modules.export_genesis_for_modules(
            &working,
            &self.config,
            &request.modules_to_export,
        )?;
        let app_state = ExportedApp::encode_app_state(&app_state)?;

        let validators = power::write_validators(&working, &self.config)?;
        let consensus_params = working
            .consensus_params()
            .map_err(ExportError::store(Stage::CollectValidators))?;

        info!(
            last_height,
            height,
            zero_height = request.for_zero_height,
            validators = validators.len(),
            bytes = app_state.len(),
            "exported genesis"
        );

        Ok((
            ExportedApp {
                app_state,
                validators,
                height,
                consensus_params,
            },
            report,
        ))
    }
}
