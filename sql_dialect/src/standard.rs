//! Generic ANSI fallback dialect

use crate::{ansi, Dialect, ParamMarkers};

/// Lowest-common-denominator dialect: positional `?` markers, no native
/// merge-upsert, conservative parameter bound.
///
/// Stores combined with this dialect take the update-then-insert write path.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDialect;

impl Dialect for StandardDialect {
    fn supports_upsert(&self) -> bool {
        false
    }

    fn max_parameters(&self) -> usize {
        2000
    }

    fn select_range_query(&self, table: &str, key_cols: &[&str]) -> String {
        ansi::select_range_query(table, key_cols)
    }

    fn load_cache_query(&self, table: &str, uniq_cols: &[&str]) -> String {
        ansi::load_cache_query(table, uniq_cols)
    }

    fn load_cache_range_query(
        &self,
        table: &str,
        key_cols: &[&str],
        uniq_cols: &[&str],
        append_lower_bound: bool,
        append_upper_bound: bool,
    ) -> String {
        ansi::load_cache_range_query(
            table,
            key_cols,
            uniq_cols,
            append_lower_bound,
            append_upper_bound,
            &mut ParamMarkers::positional(),
        )
    }

    fn load_query(
        &self,
        table: &str,
        key_cols: &[&str],
        uniq_cols: &[&str],
        key_count: usize,
    ) -> String {
        ansi::load_query(
            table,
            key_cols,
            uniq_cols,
            key_count,
            &mut ParamMarkers::positional(),
        )
    }

    fn insert_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String {
        ansi::insert_query(table, key_cols, val_cols, &mut ParamMarkers::positional())
    }

    fn update_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String {
        ansi::update_query(table, key_cols, val_cols, &mut ParamMarkers::positional())
    }

    fn upsert_query(&self, _table: &str, _key_cols: &[&str], _val_cols: &[&str]) -> Option<String> {
        None
    }

    fn delete_query(&self, table: &str, key_cols: &[&str], key_count: usize) -> String {
        ansi::delete_query(
            table,
            key_cols,
            key_count,
            &mut ParamMarkers::positional(),
        )
    }
}
