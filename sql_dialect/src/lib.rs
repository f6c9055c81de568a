//! SQL dialect abstraction for store backends
//!
//! A dialect is a stateless policy object: it answers capability questions
//! (merge-upsert support, bind parameter bounds) and produces query text
//! parameterized by table and column names. It carries no connections and
//! performs no I/O, so any dialect can be held by a transmittable store
//! factory.
//!
//! New backends plug in by implementing [`Dialect`]; configuration-selected
//! variants are enumerated by [`DialectKind`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod ansi;
mod embedded;
mod postgres;
mod standard;

pub use embedded::EmbeddedDialect;
pub use postgres::PostgresDialect;
pub use standard::StandardDialect;

pub(crate) use ansi::ParamMarkers;

/// Capability interface for backend-specific query generation.
///
/// Bind parameter order is part of the contract:
/// - [`load_query`](Dialect::load_query) and
///   [`delete_query`](Dialect::delete_query) take key parameters repeated
///   `key_count` times, in `key_cols` order;
/// - [`insert_query`](Dialect::insert_query) and
///   [`upsert_query`](Dialect::upsert_query) take key parameters followed by
///   value parameters;
/// - [`update_query`](Dialect::update_query) takes value parameters followed
///   by key parameters;
/// - [`load_cache_range_query`](Dialect::load_cache_range_query) takes the
///   lower-bound key tuple (when appended) followed by the upper-bound key
///   tuple (when appended).
///
/// All column slices must be non-empty; callers validate their table mapping
/// before asking for query text.
pub trait Dialect: Send + Sync {
    /// Whether the backend has a native merge-upsert statement.
    ///
    /// When `false`, stores must fall back to update-then-insert-on-miss and
    /// never ask for [`upsert_query`](Dialect::upsert_query) text.
    fn supports_upsert(&self) -> bool;

    /// Maximum bind parameters per statement; 0 means unbounded.
    fn max_parameters(&self) -> usize;

    /// Ordered key walk used to split a bulk load into ranges.
    fn select_range_query(&self, table: &str, key_cols: &[&str]) -> String;

    /// Full-table select of `uniq_cols` for bulk load.
    fn load_cache_query(&self, table: &str, uniq_cols: &[&str]) -> String;

    /// Bounded variant of [`load_cache_query`](Dialect::load_cache_query);
    /// the boundary flags control which key-tuple bounds appear.
    fn load_cache_range_query(
        &self,
        table: &str,
        key_cols: &[&str],
        uniq_cols: &[&str],
        append_lower_bound: bool,
        append_upper_bound: bool,
    ) -> String;

    /// Point or batch load of `uniq_cols` for `key_count` keys.
    fn load_query(
        &self,
        table: &str,
        key_cols: &[&str],
        uniq_cols: &[&str],
        key_count: usize,
    ) -> String;

    /// Single-row insert.
    fn insert_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String;

    /// Single-row update by key.
    fn update_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String;

    /// Native merge-upsert text; `None` when the backend has no such
    /// statement.
    fn upsert_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> Option<String>;

    /// Delete of `key_count` keys.
    fn delete_query(&self, table: &str, key_cols: &[&str], key_count: usize) -> String;
}

/// Configuration-selected dialect variant.
///
/// The closed set keeps factory configuration transmittable by construction;
/// code-constructed factories may instead inject any [`Dialect`]
/// implementation directly, at the cost of transmittability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// Generic ANSI fallback without merge-upsert
    #[default]
    Standard,
    /// PostgreSQL (`$n` markers, `ON CONFLICT` upsert)
    Postgres,
    /// Embedded engine flavor (`MERGE INTO` upsert)
    Embedded,
}

impl DialectKind {
    /// Construct the dialect this variant names.
    pub fn dialect(&self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Standard => Arc::new(StandardDialect),
            DialectKind::Postgres => Arc::new(PostgresDialect),
            DialectKind::Embedded => Arc::new(EmbeddedDialect),
        }
    }
}
