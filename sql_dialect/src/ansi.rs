//! Shared ANSI query construction
//!
//! Builders used by all bundled dialects; only the parameter marker style
//! and the upsert statement differ between them.

/// Bind parameter marker generator.
///
/// Positional markers render as `?`; numbered markers render as `$1`, `$2`,
/// ... across the whole statement.
pub(crate) struct ParamMarkers {
    numbered: bool,
    next: usize,
}

impl ParamMarkers {
    pub(crate) fn positional() -> Self {
        Self {
            numbered: false,
            next: 1,
        }
    }

    pub(crate) fn numbered() -> Self {
        Self {
            numbered: true,
            next: 1,
        }
    }

    pub(crate) fn next(&mut self) -> String {
        if self.numbered {
            let marker = format!("${}", self.next);
            self.next += 1;
            marker
        } else {
            "?".to_string()
        }
    }
}

pub(crate) fn column_list(cols: &[&str]) -> String {
    cols.join(", ")
}

/// `k1 = ? AND k2 = ?`
pub(crate) fn key_predicate(key_cols: &[&str], markers: &mut ParamMarkers) -> String {
    key_cols
        .iter()
        .map(|col| format!("{} = {}", col, markers.next()))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `v1 = ?, v2 = ?`
pub(crate) fn assignment_list(val_cols: &[&str], markers: &mut ParamMarkers) -> String {
    val_cols
        .iter()
        .map(|col| format!("{} = {}", col, markers.next()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `?, ?, ?`
pub(crate) fn marker_list(count: usize, markers: &mut ParamMarkers) -> String {
    (0..count)
        .map(|_| markers.next())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Predicate selecting `key_count` keys.
///
/// Single key column: `k IN (?, ?)`; composite keys expand to an OR chain of
/// per-key conjunctions. `key_count == 1` collapses to plain equality.
pub(crate) fn keys_predicate(
    key_cols: &[&str],
    key_count: usize,
    markers: &mut ParamMarkers,
) -> String {
    if key_count == 1 {
        return key_predicate(key_cols, markers);
    }

    if key_cols.len() == 1 {
        return format!("{} IN ({})", key_cols[0], marker_list(key_count, markers));
    }

    (0..key_count)
        .map(|_| format!("({})", key_predicate(key_cols, markers)))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Row-value bound over the key tuple, e.g. `(k1, k2) >= (?, ?)`.
///
/// Single key column degenerates to `k1 >= ?`.
pub(crate) fn key_bound(key_cols: &[&str], op: &str, markers: &mut ParamMarkers) -> String {
    if key_cols.len() == 1 {
        format!("{} {} {}", key_cols[0], op, markers.next())
    } else {
        format!(
            "({}) {} ({})",
            column_list(key_cols),
            op,
            marker_list(key_cols.len(), markers)
        )
    }
}

pub(crate) fn select_range_query(table: &str, key_cols: &[&str]) -> String {
    let cols = column_list(key_cols);
    format!("SELECT {} FROM {} ORDER BY {}", cols, table, cols)
}

pub(crate) fn load_cache_query(table: &str, uniq_cols: &[&str]) -> String {
    format!("SELECT {} FROM {}", column_list(uniq_cols), table)
}

pub(crate) fn load_cache_range_query(
    table: &str,
    key_cols: &[&str],
    uniq_cols: &[&str],
    append_lower_bound: bool,
    append_upper_bound: bool,
    markers: &mut ParamMarkers,
) -> String {
    let mut query = load_cache_query(table, uniq_cols);

    let mut bounds = Vec::with_capacity(2);
    if append_lower_bound {
        bounds.push(key_bound(key_cols, ">=", markers));
    }
    if append_upper_bound {
        bounds.push(key_bound(key_cols, "<", markers));
    }

    if !bounds.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&bounds.join(" AND "));
    }

    query
}

pub(crate) fn load_query(
    table: &str,
    key_cols: &[&str],
    uniq_cols: &[&str],
    key_count: usize,
    markers: &mut ParamMarkers,
) -> String {
    format!(
        "SELECT {} FROM {} WHERE {}",
        column_list(uniq_cols),
        table,
        keys_predicate(key_cols, key_count, markers)
    )
}

pub(crate) fn insert_query(
    table: &str,
    key_cols: &[&str],
    val_cols: &[&str],
    markers: &mut ParamMarkers,
) -> String {
    let mut cols: Vec<&str> = Vec::with_capacity(key_cols.len() + val_cols.len());
    cols.extend_from_slice(key_cols);
    cols.extend_from_slice(val_cols);

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        column_list(&cols),
        marker_list(cols.len(), markers)
    )
}

pub(crate) fn update_query(
    table: &str,
    key_cols: &[&str],
    val_cols: &[&str],
    markers: &mut ParamMarkers,
) -> String {
    let assignments = assignment_list(val_cols, markers);
    let predicate = key_predicate(key_cols, markers);
    format!("UPDATE {} SET {} WHERE {}", table, assignments, predicate)
}

pub(crate) fn delete_query(
    table: &str,
    key_cols: &[&str],
    key_count: usize,
    markers: &mut ParamMarkers,
) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        table,
        keys_predicate(key_cols, key_count, markers)
    )
}
