//! # Kita Genesis Testkit
//!
//! Testing utilities for kita genesis export.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Ledgers built through the same reward hooks a live chain fires
//! - **Recorders**: Hook implementations that record or fail on demand
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Quickly set up a ledger:
//!
//! ```rust
//! use kita_genesis_testkit::fixtures::LedgerFixture;
//!
//! let mut fixture = LedgerFixture::at_height(100);
//! let validator = fixture.add_validator(1, "0.1");
//! fixture.delegate(1, &validator, 2_000_000);
//! fixture.allocate(&validator, "10.5");
//! fixture.bond();
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use kita_genesis_testkit::generators::{fixture_from_params, LedgerParams};
//!
//! proptest! {
//!     #[test]
//!     fn export_is_deterministic(params: LedgerParams) {
//!         let a = fixture_from_params(&params);
//!         let b = fixture_from_params(&params);
//!         prop_assert_eq!(a.state, b.state);
//!     }
//! }
//! ```
//!
//! ## Hook Recording
//!
//! ```rust
//! use kita_genesis::{ChainConfig, DistributionHooks, ExportRequest, GenesisExporter};
//! use kita_genesis_testkit::fixtures::bonded_ledger;
//! use kita_genesis_testkit::recorder::RecordingHooks;
//!
//! let snapshot = bonded_ledger(2).into_snapshot();
//! let mut exporter = GenesisExporter::with_hooks(ChainConfig::default(), RecordingHooks::wrap(DistributionHooks));
//! exporter.export(&snapshot, &ExportRequest::zero_height(Vec::<String>::new())).unwrap();
//! assert!(!exporter.hooks().events().is_empty());
//! ```

pub mod fixtures;
pub mod generators;
pub mod recorder;

pub use fixtures::{bonded_ledger, LedgerFixture};
pub use generators::{fixture_from_params, LedgerParams};
pub use recorder::{FailingHooks, HookEvent, HookKind, RecordingHooks};
