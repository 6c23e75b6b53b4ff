//! # Kita Genesis Store
//!
//! State abstraction for genesis export. Provides the capability traits the
//! export pipeline reads and writes through, ordered cursors with tracked
//! leases, and an in-memory snapshot.
//!
//! ## Overview
//!
//! Export never touches a live store directly. It asks a [`Snapshot`] for a
//! working context, an independent copy positioned at some height, and runs
//! every stage against that context. Dropping the context discards its writes.
//!
//! ## Key Types
//!
//! - [`LedgerState`] - Everything a working context can do
//! - [`Snapshot`] - Committed state that working contexts branch from
//! - [`Cursor`] - Ordered key sequence holding a lease on its store
//! - [`MemoryState`] - BTreeMap-backed state for tests and offline tools
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kita_genesis_store::{Context, MemoryState, Order, Snapshot, StakingStore};
//!
//! let snapshot = MemoryState::new();
//! let mut working = snapshot.working_context(snapshot.last_block_height()).unwrap();
//!
//! for address in working.validator_cursor(Order::Descending).unwrap() {
//!     let _validator = working.validator(&address).unwrap();
//! }
//! working.set_block_height(0);
//! ```
//!
//! ## Design Notes
//!
//! - **Key snapshots**: Cursors own their keys, so the store may be mutated mid-iteration
//! - **Lease tracking**: Every open cursor is counted until dropped
//! - **Deterministic order**: All listings are ascending by key unless asked otherwise

pub mod cursor;
pub mod error;
pub mod memory;
pub mod traits;

pub use cursor::{Cursor, CursorTracker, Order};
pub use error::{Result, StoreError};
pub use memory::MemoryState;
pub use traits::{
    BankStore, ConsensusStore, Context, DistributionStore, LedgerState, Snapshot, StakingStore,
};
