//! # Kita Genesis
//!
//! Captures a ledger's state into a genesis document and, for zero-height
//! exports, normalizes validator, delegation and reward state so the exported
//! chain can restart at height 0.
//!
//! ## Overview
//!
//! - **Export**: every registered module writes its section of the app state
//! - **Zero-height normalization**: rewards are settled, reward bookkeeping is
//!   reseeded, heights are reset and the jail allow-list is applied
//! - **Validator list**: the bonded set, as the consensus engine will see it
//!
//! ## Key Concepts
//!
//! - **Working context**: an independent copy of a snapshot. Exports never
//!   write back, so a failed export needs no rollback.
//! - **Scraps**: what remains in a validator's outstanding rewards after every
//!   delegation has been paid. Swept into the community pool.
//! - **Allow-list**: validators exempt from jailing during zero-height export.
//!   An empty list jails nobody.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kita_genesis::{ChainConfig, ExportRequest, GenesisExporter};
//! use kita_genesis::store::MemoryState;
//!
//! let snapshot = MemoryState::new();
//! let mut exporter = GenesisExporter::new(ChainConfig::default());
//!
//! let request = ExportRequest::zero_height(["kitavaloper1..."]);
//! let exported = exporter.export(&snapshot, &request).unwrap();
//!
//! let document = exported.into_genesis_document("kita-1").unwrap();
//! document.write_to_file("genesis.json").unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `kita_genesis::core` - Ledger records and the address codec
//! - `kita_genesis::store` - State capabilities and the in-memory snapshot

pub mod error;
pub mod exporter;
pub mod genesis;
pub mod hooks;
pub mod iterator;
pub mod modules;
pub mod normalizer;
pub mod power;
pub mod rewards;
pub mod settlement;

// Re-export component crates
pub use kita_genesis_core as core;
pub use kita_genesis_store as store;

pub use error::{ExportError, Result, RewardError, Stage};
pub use exporter::{ExportRequest, GenesisExporter};
pub use genesis::{AppState, ExportedApp, GenesisDocument, GenesisPubKey, GenesisValidator};
pub use hooks::{DistributionHooks, LifecycleHooks};
pub use iterator::ValidatorSetIterator;
pub use modules::{ModuleExporter, ModuleManager};
pub use normalizer::{NormalizationReport, ZeroHeightNormalizer};
pub use settlement::RewardSettlement;

pub use kita_genesis_core::{ChainConfig, ConsensusParams};
