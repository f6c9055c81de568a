//! SQL-backed cache entry store
//!
//! The store performs the actual load/write/delete operations using the data
//! source and dialect injected by its factory. Keys and values are serde-JSON
//! encoded byte blobs; the table layout is a key column and a value column
//! described by [`TableMapping`].

use crate::data_source::{DataSource, SqlParam};
use crate::errors::StoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sql_dialect::Dialect;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Table and column names a SQL store operates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    pub table: String,
    pub key_column: String,
    pub value_column: String,
}

impl Default for TableMapping {
    fn default() -> Self {
        Self {
            table: "cache_entries".to_string(),
            key_column: "cache_key".to_string(),
            value_column: "cache_value".to_string(),
        }
    }
}

impl TableMapping {
    pub fn new(
        table: impl Into<String>,
        key_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            key_column: key_column.into(),
            value_column: value_column.into(),
        }
    }

    /// Validate all identifiers; called by factories before store creation
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_identifier("table name", &self.table)?;
        validate_identifier("key column", &self.key_column)?;
        validate_identifier("value column", &self.value_column)?;

        if self.key_column == self.value_column {
            return Err(StoreError::Configuration(format!(
                "Key column and value column must differ, both are '{}'",
                self.key_column
            )));
        }

        Ok(())
    }
}

impl From<&config::StoreConfig> for TableMapping {
    fn from(config: &config::StoreConfig) -> Self {
        Self {
            table: config.table.clone(),
            key_column: config.key_column.clone(),
            value_column: config.value_column.clone(),
        }
    }
}

/// PostgreSQL identifier length limit
const MAX_IDENTIFIER_LENGTH: usize = 63;

fn validate_identifier(kind: &str, name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::Configuration(format!(
            "Store {} cannot be empty",
            kind
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(StoreError::Configuration(format!(
            "Store {} '{}' is too long: {} characters (max {})",
            kind,
            name,
            name.len(),
            MAX_IDENTIFIER_LENGTH
        )));
    }

    let first_char = name.chars().next().ok_or_else(|| {
        StoreError::Configuration(format!("Store {} cannot be empty", kind))
    })?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(StoreError::Configuration(format!(
            "Store {} '{}' must start with a letter or underscore",
            kind, name
        )));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::Configuration(format!(
            "Store {} '{}' may only contain alphanumeric characters and underscores",
            kind, name
        )));
    }

    Ok(())
}

/// Store lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Created by a factory, no backend call made yet
    Configured,
    /// At least one backend call succeeded
    Active,
}

const STATE_CONFIGURED: u8 = 0;
const STATE_ACTIVE: u8 = 1;

/// SQL-backed store for cache entries of key type `K` and value type `V`
pub struct SqlStore<K, V> {
    data_source: Arc<dyn DataSource>,
    dialect: Arc<dyn Dialect>,
    mapping: TableMapping,
    write_batch_size: usize,
    state: AtomicU8,
    _entry: PhantomData<fn() -> (K, V)>,
}

impl<K, V> std::fmt::Debug for SqlStore<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlStore")
            .field("data_source", &self.data_source.describe())
            .field("mapping", &self.mapping)
            .field("write_batch_size", &self.write_batch_size)
            .field("state", &self.state())
            .finish()
    }
}

impl<K, V> SqlStore<K, V> {
    pub(crate) fn new(
        data_source: Arc<dyn DataSource>,
        dialect: Arc<dyn Dialect>,
        mapping: TableMapping,
        write_batch_size: usize,
    ) -> Self {
        Self {
            data_source,
            dialect,
            mapping,
            write_batch_size,
            state: AtomicU8::new(STATE_CONFIGURED),
            _entry: PhantomData,
        }
    }

    pub fn state(&self) -> StoreState {
        match self.state.load(Ordering::Relaxed) {
            STATE_CONFIGURED => StoreState::Configured,
            _ => StoreState::Active,
        }
    }

    fn mark_active(&self) {
        self.state.store(STATE_ACTIVE, Ordering::Relaxed);
    }

    /// The injected data source
    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }

    /// The injected dialect
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }

    pub fn write_batch_size(&self) -> usize {
        self.write_batch_size
    }

    /// Keys per statement such that the dialect's parameter bound holds
    fn key_chunk_size(&self, total: usize) -> usize {
        match self.dialect.max_parameters() {
            0 => total.max(1),
            max => max.max(1),
        }
    }
}

impl<K, V> SqlStore<K, V>
where
    K: Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load the value stored under `key`
    pub async fn load(&self, key: &K) -> Result<Option<V>, StoreError> {
        let key_cols = [self.mapping.key_column.as_str()];
        let val_cols = [self.mapping.value_column.as_str()];
        let sql = self
            .dialect
            .load_query(&self.mapping.table, &key_cols, &val_cols, 1);

        let params = vec![SqlParam::Bytes(Self::encode(key)?)];
        let rows = self.data_source.fetch(&sql, params).await?;
        self.mark_active();

        match rows.first() {
            None => Ok(None),
            Some(row) => {
                let bytes = row.column(0).ok_or_else(|| {
                    StoreError::InvalidRow(format!(
                        "Value column '{}' is missing or NULL",
                        self.mapping.value_column
                    ))
                })?;
                Ok(Some(Self::decode(bytes)?))
            }
        }
    }

    /// Load all present entries for `keys`, chunked to the dialect's
    /// parameter bound
    pub async fn load_all(&self, keys: &[K]) -> Result<Vec<(K, V)>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let key_cols = [self.mapping.key_column.as_str()];
        let uniq_cols = [
            self.mapping.key_column.as_str(),
            self.mapping.value_column.as_str(),
        ];

        let mut entries = Vec::with_capacity(keys.len());
        for batch in keys.chunks(self.key_chunk_size(keys.len())) {
            let sql =
                self.dialect
                    .load_query(&self.mapping.table, &key_cols, &uniq_cols, batch.len());
            let params = batch
                .iter()
                .map(|key| Ok(SqlParam::Bytes(Self::encode(key)?)))
                .collect::<Result<Vec<_>, StoreError>>()?;

            let rows = self.data_source.fetch(&sql, params).await?;
            for row in rows {
                entries.push(self.decode_entry(&row)?);
            }
        }

        self.mark_active();
        Ok(entries)
    }

    /// Write one entry.
    ///
    /// Dialects with native upsert get a single merge statement; all others
    /// take the update-then-insert-on-miss path.
    pub async fn write(&self, key: &K, value: &V) -> Result<(), StoreError> {
        self.write_entry(key, value).await?;
        self.mark_active();
        Ok(())
    }

    /// Write entries in configured batch sizes
    pub async fn write_all(&self, entries: &[(K, V)]) -> Result<(), StoreError> {
        for batch in entries.chunks(self.write_batch_size.max(1)) {
            for (key, value) in batch {
                self.write_entry(key, value).await?;
            }
            debug!(
                table = %self.mapping.table,
                batch = batch.len(),
                "wrote entry batch"
            );
        }

        self.mark_active();
        Ok(())
    }

    async fn write_entry(&self, key: &K, value: &V) -> Result<(), StoreError> {
        let key_cols = [self.mapping.key_column.as_str()];
        let val_cols = [self.mapping.value_column.as_str()];
        let key_bytes = Self::encode(key)?;
        let value_bytes = Self::encode(value)?;

        if self.dialect.supports_upsert() {
            let sql = self
                .dialect
                .upsert_query(&self.mapping.table, &key_cols, &val_cols)
                .ok_or_else(|| {
                    StoreError::Configuration(
                        "Dialect reports upsert support but produced no upsert statement"
                            .to_string(),
                    )
                })?;

            self.data_source
                .execute(
                    &sql,
                    vec![SqlParam::Bytes(key_bytes), SqlParam::Bytes(value_bytes)],
                )
                .await?;
            return Ok(());
        }

        let update = self
            .dialect
            .update_query(&self.mapping.table, &key_cols, &val_cols);
        let affected = self
            .data_source
            .execute(
                &update,
                vec![
                    SqlParam::Bytes(value_bytes.clone()),
                    SqlParam::Bytes(key_bytes.clone()),
                ],
            )
            .await?;

        if affected == 0 {
            debug!(table = %self.mapping.table, "update affected no rows, inserting");
            let insert = self
                .dialect
                .insert_query(&self.mapping.table, &key_cols, &val_cols);
            self.data_source
                .execute(
                    &insert,
                    vec![SqlParam::Bytes(key_bytes), SqlParam::Bytes(value_bytes)],
                )
                .await?;
        }

        Ok(())
    }

    /// Delete the entry stored under `key`; returns whether a row was removed
    pub async fn delete(&self, key: &K) -> Result<bool, StoreError> {
        let key_cols = [self.mapping.key_column.as_str()];
        let sql = self.dialect.delete_query(&self.mapping.table, &key_cols, 1);

        let affected = self
            .data_source
            .execute(&sql, vec![SqlParam::Bytes(Self::encode(key)?)])
            .await?;
        self.mark_active();
        Ok(affected > 0)
    }

    /// Delete entries for `keys`, chunked to the dialect's parameter bound;
    /// returns the number of rows removed
    pub async fn delete_all(&self, keys: &[K]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let key_cols = [self.mapping.key_column.as_str()];

        let mut removed = 0;
        for batch in keys.chunks(self.key_chunk_size(keys.len())) {
            let sql = self
                .dialect
                .delete_query(&self.mapping.table, &key_cols, batch.len());
            let params = batch
                .iter()
                .map(|key| Ok(SqlParam::Bytes(Self::encode(key)?)))
                .collect::<Result<Vec<_>, StoreError>>()?;

            removed += self.data_source.execute(&sql, params).await?;
        }

        self.mark_active();
        Ok(removed)
    }

    /// Bulk load every entry, feeding each to `visitor`; returns the number
    /// of entries visited
    pub async fn load_cache<F>(&self, mut visitor: F) -> Result<u64, StoreError>
    where
        F: FnMut(K, V),
    {
        let uniq_cols = [
            self.mapping.key_column.as_str(),
            self.mapping.value_column.as_str(),
        ];
        let sql = self.dialect.load_cache_query(&self.mapping.table, &uniq_cols);

        let rows = self.data_source.fetch(&sql, Vec::new()).await?;
        self.mark_active();

        let mut visited = 0;
        for row in rows {
            let (key, value) = self.decode_entry(&row)?;
            visitor(key, value);
            visited += 1;
        }
        Ok(visited)
    }

    /// Bulk load the entries whose keys fall in `[lower, upper)`; either
    /// bound may be absent
    pub async fn load_cache_range<F>(
        &self,
        lower: Option<&K>,
        upper: Option<&K>,
        mut visitor: F,
    ) -> Result<u64, StoreError>
    where
        F: FnMut(K, V),
    {
        let key_cols = [self.mapping.key_column.as_str()];
        let uniq_cols = [
            self.mapping.key_column.as_str(),
            self.mapping.value_column.as_str(),
        ];
        let sql = self.dialect.load_cache_range_query(
            &self.mapping.table,
            &key_cols,
            &uniq_cols,
            lower.is_some(),
            upper.is_some(),
        );

        let mut params = Vec::with_capacity(2);
        if let Some(lower) = lower {
            params.push(SqlParam::Bytes(Self::encode(lower)?));
        }
        if let Some(upper) = upper {
            params.push(SqlParam::Bytes(Self::encode(upper)?));
        }

        let rows = self.data_source.fetch(&sql, params).await?;
        self.mark_active();

        let mut visited = 0;
        for row in rows {
            let (key, value) = self.decode_entry(&row)?;
            visitor(key, value);
            visited += 1;
        }
        Ok(visited)
    }

    /// All keys in key order, as produced by the dialect's range walk
    pub async fn keys(&self) -> Result<Vec<K>, StoreError> {
        let key_cols = [self.mapping.key_column.as_str()];
        let sql = self
            .dialect
            .select_range_query(&self.mapping.table, &key_cols);

        let rows = self.data_source.fetch(&sql, Vec::new()).await?;
        self.mark_active();

        rows.iter()
            .map(|row| {
                let bytes = row.column(0).ok_or_else(|| {
                    StoreError::InvalidRow(format!(
                        "Key column '{}' is missing or NULL",
                        self.mapping.key_column
                    ))
                })?;
                Self::decode(bytes)
            })
            .collect()
    }

    fn decode_entry(&self, row: &crate::data_source::SqlRow) -> Result<(K, V), StoreError> {
        let key_bytes = row.column(0).ok_or_else(|| {
            StoreError::InvalidRow(format!(
                "Key column '{}' is missing or NULL",
                self.mapping.key_column
            ))
        })?;
        let value_bytes = row.column(1).ok_or_else(|| {
            StoreError::InvalidRow(format!(
                "Value column '{}' is missing or NULL",
                self.mapping.value_column
            ))
        })?;

        Ok((Self::decode(key_bytes)?, Self::decode(value_bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SqlRow;
    use async_trait::async_trait;
    use sql_dialect::{DialectKind, StandardDialect};
    use std::any::Any;
    use std::sync::Mutex;

    /// Data source that records statements and replays scripted results
    #[derive(Debug)]
    struct ScriptedDataSource {
        executed: Mutex<Vec<String>>,
        execute_results: Mutex<Vec<u64>>,
        fetch_results: Mutex<Vec<Vec<SqlRow>>>,
        fail: bool,
    }

    impl ScriptedDataSource {
        fn new() -> Self {
            Self {
                executed: Mutex::new(Vec::new()),
                execute_results: Mutex::new(Vec::new()),
                fetch_results: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn script_execute(self, results: Vec<u64>) -> Self {
            *self.execute_results.lock().unwrap() = results;
            self
        }

        fn script_fetch(self, results: Vec<Vec<SqlRow>>) -> Self {
            *self.fetch_results.lock().unwrap() = results;
            self
        }

        fn statements(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DataSource for ScriptedDataSource {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn describe(&self) -> String {
            "scripted data source".to_string()
        }

        async fn execute(&self, sql: &str, _params: Vec<SqlParam>) -> Result<u64, StoreError> {
            if self.fail {
                return Err(StoreError::Session("scripted failure".to_string()));
            }
            self.executed.lock().unwrap().push(sql.to_string());
            let mut results = self.execute_results.lock().unwrap();
            Ok(if results.is_empty() { 1 } else { results.remove(0) })
        }

        async fn fetch(
            &self,
            sql: &str,
            _params: Vec<SqlParam>,
        ) -> Result<Vec<SqlRow>, StoreError> {
            if self.fail {
                return Err(StoreError::Session("scripted failure".to_string()));
            }
            self.executed.lock().unwrap().push(sql.to_string());
            let mut results = self.fetch_results.lock().unwrap();
            Ok(if results.is_empty() {
                Vec::new()
            } else {
                results.remove(0)
            })
        }
    }

    /// Dialect without upsert and a tiny parameter bound, for chunking tests
    struct TinyBoundDialect;

    impl Dialect for TinyBoundDialect {
        fn supports_upsert(&self) -> bool {
            false
        }

        fn max_parameters(&self) -> usize {
            2
        }

        fn select_range_query(&self, table: &str, key_cols: &[&str]) -> String {
            StandardDialect.select_range_query(table, key_cols)
        }

        fn load_cache_query(&self, table: &str, uniq_cols: &[&str]) -> String {
            StandardDialect.load_cache_query(table, uniq_cols)
        }

        fn load_cache_range_query(
            &self,
            table: &str,
            key_cols: &[&str],
            uniq_cols: &[&str],
            append_lower_bound: bool,
            append_upper_bound: bool,
        ) -> String {
            StandardDialect.load_cache_range_query(
                table,
                key_cols,
                uniq_cols,
                append_lower_bound,
                append_upper_bound,
            )
        }

        fn load_query(
            &self,
            table: &str,
            key_cols: &[&str],
            uniq_cols: &[&str],
            key_count: usize,
        ) -> String {
            StandardDialect.load_query(table, key_cols, uniq_cols, key_count)
        }

        fn insert_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String {
            StandardDialect.insert_query(table, key_cols, val_cols)
        }

        fn update_query(&self, table: &str, key_cols: &[&str], val_cols: &[&str]) -> String {
            StandardDialect.update_query(table, key_cols, val_cols)
        }

        fn upsert_query(
            &self,
            _table: &str,
            _key_cols: &[&str],
            _val_cols: &[&str],
        ) -> Option<String> {
            None
        }

        fn delete_query(&self, table: &str, key_cols: &[&str], key_count: usize) -> String {
            StandardDialect.delete_query(table, key_cols, key_count)
        }
    }

    fn store_with(
        data_source: Arc<dyn DataSource>,
        dialect: Arc<dyn Dialect>,
    ) -> SqlStore<String, String> {
        SqlStore::new(data_source, dialect, TableMapping::default(), 512)
    }

    fn encoded(text: &str) -> Option<Vec<u8>> {
        Some(serde_json::to_vec(&text.to_string()).unwrap())
    }

    #[tokio::test]
    async fn test_write_uses_native_upsert_when_supported() {
        let source = Arc::new(ScriptedDataSource::new());
        let store = store_with(source.clone(), DialectKind::Embedded.dialect());

        store
            .write(&"k".to_string(), &"v".to_string())
            .await
            .unwrap();

        let statements = source.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("MERGE INTO"));
    }

    #[tokio::test]
    async fn test_write_falls_back_to_update_then_insert() {
        // Update affects no rows, so an insert must follow
        let source = Arc::new(ScriptedDataSource::new().script_execute(vec![0, 1]));
        let store = store_with(source.clone(), Arc::new(StandardDialect));

        store
            .write(&"k".to_string(), &"v".to_string())
            .await
            .unwrap();

        let statements = source.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("UPDATE"));
        assert!(statements[1].starts_with("INSERT"));
        for sql in &statements {
            assert!(!sql.contains("MERGE"));
            assert!(!sql.contains("ON CONFLICT"));
        }
    }

    #[tokio::test]
    async fn test_write_skips_insert_when_update_hits() {
        let source = Arc::new(ScriptedDataSource::new().script_execute(vec![1]));
        let store = store_with(source.clone(), Arc::new(StandardDialect));

        store
            .write(&"k".to_string(), &"v".to_string())
            .await
            .unwrap();

        let statements = source.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("UPDATE"));
    }

    #[tokio::test]
    async fn test_load_decodes_value_column() {
        let row = SqlRow::new(vec![encoded("hello")]);
        let source = Arc::new(ScriptedDataSource::new().script_fetch(vec![vec![row]]));
        let store = store_with(source, Arc::new(StandardDialect));

        let value = store.load(&"k".to_string()).await.unwrap();
        assert_eq!(value, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_load_miss_returns_none() {
        let source = Arc::new(ScriptedDataSource::new());
        let store = store_with(source, Arc::new(StandardDialect));

        assert_eq!(store.load(&"k".to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_null_value_is_an_error() {
        let row = SqlRow::new(vec![None]);
        let source = Arc::new(ScriptedDataSource::new().script_fetch(vec![vec![row]]));
        let store = store_with(source, Arc::new(StandardDialect));

        let err = store.load(&"k".to_string()).await.unwrap_err();
        assert!(err.to_string().contains("cache_value"));
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let source = Arc::new(ScriptedDataSource::new().script_execute(vec![1, 0]));
        let store = store_with(source, Arc::new(StandardDialect));

        assert!(store.delete(&"k".to_string()).await.unwrap());
        assert!(!store.delete(&"k".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_all_chunks_to_parameter_bound() {
        let source = Arc::new(ScriptedDataSource::new());
        let store = store_with(source.clone(), Arc::new(TinyBoundDialect));

        let keys: Vec<String> = (0..5).map(|i| format!("k{}", i)).collect();
        store.delete_all(&keys).await.unwrap();

        // Bound of 2 parameters over 5 keys: chunks of 2, 2 and 1
        let statements = source.statements();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].contains("IN (?, ?)"));
        assert!(statements[2].contains("= ?"));
    }

    #[tokio::test]
    async fn test_load_all_pairs_keys_and_values() {
        let rows = vec![
            SqlRow::new(vec![encoded("a"), encoded("1")]),
            SqlRow::new(vec![encoded("b"), encoded("2")]),
        ];
        let source = Arc::new(ScriptedDataSource::new().script_fetch(vec![rows]));
        let store = store_with(source, Arc::new(StandardDialect));

        let entries = store
            .load_all(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(
            entries,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_cache_visits_every_entry() {
        let rows = vec![
            SqlRow::new(vec![encoded("a"), encoded("1")]),
            SqlRow::new(vec![encoded("b"), encoded("2")]),
        ];
        let source = Arc::new(ScriptedDataSource::new().script_fetch(vec![rows]));
        let store = store_with(source, Arc::new(StandardDialect));

        let mut seen = Vec::new();
        let visited = store
            .load_cache(|key: String, value: String| seen.push((key, value)))
            .await
            .unwrap();

        assert_eq!(visited, 2);
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn test_keys_decode_in_order() {
        let rows = vec![
            SqlRow::new(vec![encoded("a")]),
            SqlRow::new(vec![encoded("b")]),
        ];
        let source = Arc::new(ScriptedDataSource::new().script_fetch(vec![rows]));
        let store = store_with(source.clone(), Arc::new(StandardDialect));

        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(source.statements()[0].contains("ORDER BY"));
    }

    #[tokio::test]
    async fn test_load_cache_range_binds_requested_bounds() {
        let source = Arc::new(ScriptedDataSource::new());
        let store = store_with(source.clone(), Arc::new(StandardDialect));

        let lower = "a".to_string();
        store
            .load_cache_range(Some(&lower), None, |_k: String, _v: String| {})
            .await
            .unwrap();

        let statements = source.statements();
        assert!(statements[0].contains(">= ?"));
        assert!(!statements[0].contains("< ?"));
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let source = Arc::new(ScriptedDataSource::new());
        let store = store_with(source, Arc::new(StandardDialect));
        assert_eq!(store.state(), StoreState::Configured);

        store.load(&"k".to_string()).await.unwrap();
        assert_eq!(store.state(), StoreState::Active);
    }

    #[tokio::test]
    async fn test_failed_operation_leaves_state_unchanged() {
        let source = Arc::new(ScriptedDataSource::failing());
        let store = store_with(source, Arc::new(StandardDialect));

        assert!(store.load(&"k".to_string()).await.is_err());
        assert_eq!(store.state(), StoreState::Configured);
    }

    #[test]
    fn test_mapping_validation() {
        TableMapping::default().validate().unwrap();

        let err = TableMapping::new("", "k", "v").validate().unwrap_err();
        assert!(err.to_string().contains("table name"));

        let err = TableMapping::new("t", "1k", "v").validate().unwrap_err();
        assert!(err.to_string().contains("letter or underscore"));

        let err = TableMapping::new("t", "k;drop", "v").validate().unwrap_err();
        assert!(err.to_string().contains("alphanumeric"));

        let err = TableMapping::new("t", "same", "same").validate().unwrap_err();
        assert!(err.to_string().contains("differ"));

        let long = "a".repeat(64);
        let err = TableMapping::new(long, "k", "v").validate().unwrap_err();
        assert!(err.to_string().contains("too long"));
    }
}
