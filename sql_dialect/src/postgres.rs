//! PostgreSQL dialect

use crate::{ansi, Dialect, ParamMarkers};

/// PostgreSQL dialect: numbered `$n` markers, native upsert through
/// `INSERT .. ON CONFLICT .. DO UPDATE`, 16-bit bind parameter bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn supports_upsert(&self) -> bool {
        true
    }

    fn max_parameters(&self) -> usize {
        // Wire protocol carries the bind count as a u16
        65535
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
            &mut ParamMarkers::numbered(),
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
            &mut ParamMarkers::numbered(),
        )
    }

    fn insert_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String {
        ansi::insert_query(table, key_cols, val_cols, &mut ParamMarkers::numbered())
    }

    fn update_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String {
        ansi::update_query(table, key_cols, val_cols, &mut ParamMarkers::numbered())
    }

    fn upsert_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> Option<String> {
        let insert = ansi::insert_query(table, key_cols, val_cols, &mut ParamMarkers::numbered());

        let updates = val_cols
            .iter()
            .map(|col| format!("{} = EXCLUDED.{}", col, col))
            .collect::<Vec<_>>()
            .join(", ");

        Some(format!(
            "{} ON CONFLICT ({}) DO UPDATE SET {}",
            insert,
            key_cols.join(", "),
            updates
        ))
    }

    fn delete_query(&self, table: &str, key_cols: &[&str], key_count: usize) -> String {
        ansi::delete_query(table, key_cols, key_count, &mut ParamMarkers::numbered())
    }
}
