//! fips: indexed, case-insensitive lookup tables for US state and county
//! FIPS codes.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: organize already-parsed census reference rows into a two-tier
//!   read-only index in safe, verifiable layers so each piece can be
//!   reasoned about independently.
//! - Layers:
//!   - KeyTable<V> (crate-private): structural map with a
//!     precomputed-hash index over slot storage; insert-only, so slot
//!     iteration order is insertion order and slot keys stay valid for
//!     the table's life.
//!   - Record: case-insensitive attribute map over KeyTable; folds names
//!     to uppercase on write and lookup, strict on misses.
//!   - CountyIndex: per-state map from zero-padded 3-digit FIPS code to
//!     CountyRecord, with ascending-order `codes()` sequences.
//!   - StateRecord / StateIndex: public surface; one record per state
//!     owning its CountyIndex, indexed by folded postal code.
//!
//! Constraints
//! - Built once by [`StateIndex::from_rows`] (or [`load`]); read-only
//!   afterward. No interior mutability anywhere, so the whole structure
//!   is `Send + Sync` and lock-free for readers.
//! - Construction is atomic: it fully succeeds or fails with a
//!   [`LoadError`], and a half-linked state is never observable. Each
//!   county's back-reference to its owner is established inside
//!   `Arc::new_cyclic` before the state is published.
//! - Codes may start with a digit, so county access is call-style
//!   ([`CountyIndex::lookup`]) rather than attribute-style; attribute
//!   names go through the folded [`Record`] path.
//! - Unknown names, codes, and postal codes are errors
//!   ([`MissingAttributeError`], [`UnknownCodeError`],
//!   [`UnknownStateError`]), never defaults.
//!
//! Notes and non-goals
//! - The loader boundary is rows in memory: [`tables::parse`] handles the
//!   delimited-text shape the reference data ships in, and callers hand
//!   the resulting rows to [`StateIndex::from_rows`]. No file or network
//!   I/O happens in this crate.
//! - No mutation API after load; records and indexes have no public
//!   constructors besides the load protocol.
//! - The process-wide table is published at most once via [`init`];
//!   re-initialization is an error, never a silent rebuild.

mod county;
mod record;
mod record_proptest;
mod state;
mod table;
pub mod tables;

use std::sync::OnceLock;
use thiserror::Error;

pub use county::{
    Codes, CountyCode, CountyIndex, CountyRecord, DuplicateCodeError, UnknownCodeError,
};
pub use record::{MissingAttributeError, Record};
pub use state::{LoadError, StateIndex, StateRecord, UnknownStateError};
pub use tables::{ParseOptions, TableError};

/// One raw data row: (column, value) pairs in column order, as produced by
/// [`tables::parse`] or an equivalent loader.
pub type Row = Vec<(String, String)>;

/// Parse the two tab-delimited reference tables and build a [`StateIndex`].
pub fn load(states_table: &str, counties_table: &str) -> Result<StateIndex, LoadError> {
    let opts = ParseOptions::default();
    let state_rows = tables::parse(states_table, &opts)?;
    let county_rows = tables::parse(counties_table, &opts)?;
    StateIndex::from_rows(state_rows, county_rows)
}

/// A second call to [`init`]: the process-wide table is already published.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[error("state table is already initialized")]
pub struct AlreadyInitializedError;

static STATES: OnceLock<StateIndex> = OnceLock::new();

/// Publish `index` as the process-wide state table.
///
/// Publication happens exactly once; the `OnceLock` provides the
/// happens-before barrier, so readers on any thread observe the fully
/// constructed index or none at all.
pub fn init(index: StateIndex) -> Result<&'static StateIndex, AlreadyInitializedError> {
    STATES.set(index).map_err(|_| AlreadyInitializedError)?;
    Ok(STATES.get().expect("published above"))
}

/// The process-wide state table, if [`init`] has published one.
pub fn states() -> Option<&'static StateIndex> {
    STATES.get()
}
