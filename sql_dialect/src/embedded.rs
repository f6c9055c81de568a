//! Embedded-engine dialect

use crate::{ansi, Dialect, ParamMarkers};

/// Dialect tuned for embedded engines in the H2 mold: positional `?`
/// markers, `MERGE INTO .. KEY` upsert, no statement parameter bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedDialect;

impl Dialect for EmbeddedDialect {
    fn supports_upsert(&self) -> bool {
        true
    }

    fn max_parameters(&self) -> usize {
        0
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

    fn upsert_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> Option<String> {
        let mut cols: Vec<&str> = Vec::with_capacity(key_cols.len() + val_cols.len());
        cols.extend_from_slice(key_cols);
        cols.extend_from_slice(val_cols);

        let mut markers = ParamMarkers::positional();
        Some(format!(
            "MERGE INTO {} ({}) KEY ({}) VALUES ({})",
            table,
            cols.join(", "),
            key_cols.join(", "),
            ansi::marker_list(cols.len(), &mut markers)
        ))
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

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "cache_entries";

    #[test]
    fn test_capabilities() {
        let dialect = EmbeddedDialect;
        assert!(dialect.supports_upsert());
        // 0 means unbounded
        assert_eq!(dialect.max_parameters(), 0);
    }

    #[test]
    fn test_merge_upsert() {
        assert_eq!(
            EmbeddedDialect.upsert_query(TABLE, &["k"], &["v"]).unwrap(),
            "MERGE INTO cache_entries (k, v) KEY (k) VALUES (?, ?)"
        );
        assert_eq!(
            EmbeddedDialect
                .upsert_query(TABLE, &["k1", "k2"], &["v"])
                .unwrap(),
            "MERGE INTO cache_entries (k1, k2, v) KEY (k1, k2) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_point_queries_match_standard_shapes() {
        let dialect = EmbeddedDialect;
        assert_eq!(
            dialect.load_query(TABLE, &["k"], &["v"], 1),
            "SELECT v FROM cache_entries WHERE k = ?"
        );
        assert_eq!(
            dialect.delete_query(TABLE, &["k"], 3),
            "DELETE FROM cache_entries WHERE k IN (?, ?, ?)"
        );
    }
}
