//! Connection providers for SQL-backed stores
//!
//! A [`DataSource`] hands the store a way to run dialect-generated statements
//! without fixing how connections are obtained. Both bundled providers are
//! built from a [`ConnectionConfig`] and perform no I/O at construction; the
//! first statement triggers connection establishment.

use crate::errors::StoreError;
use async_trait::async_trait;
use config::ConnectionConfig;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::any::Any;
use std::time::Duration;
use tokio::sync::RwLock;

/// Owned bind parameter handed from the store to the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

/// Positional row of nullable byte columns returned by a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRow {
    columns: Vec<Option<Vec<u8>>>,
}

impl SqlRow {
    pub fn new(columns: Vec<Option<Vec<u8>>>) -> Self {
        Self { columns }
    }

    /// Column by position; `None` for NULL or out-of-range columns.
    pub fn column(&self, index: usize) -> Option<&[u8]> {
        self.columns
            .get(index)
            .and_then(|column| column.as_deref())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Provider of backend connections for a store.
///
/// Implementations must be safe for concurrent acquisition from many
/// cache-operation threads; a single shared connection does not qualify.
#[async_trait]
pub trait DataSource: std::fmt::Debug + Send + Sync + 'static {
    /// Downcasting hook used to verify wiring in integration tests.
    fn as_any(&self) -> &dyn Any;

    /// Human-readable target description for logs and errors; must not
    /// contain credentials.
    fn describe(&self) -> String;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, params: Vec<SqlParam>) -> Result<u64, StoreError>;

    /// Run a query and return all rows.
    async fn fetch(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<SqlRow>, StoreError>;
}

fn bind_params(sql: &str, params: Vec<SqlParam>) -> sqlx::query::Query<'_, sqlx::Postgres, PgArguments> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            SqlParam::Bytes(bytes) => query.bind(bytes),
            SqlParam::Text(text) => query.bind(text),
            SqlParam::Int(value) => query.bind(value),
            SqlParam::Bool(value) => query.bind(value),
            SqlParam::Null => query.bind(None::<Vec<u8>>),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> Result<SqlRow, StoreError> {
    let mut columns = Vec::with_capacity(row.columns().len());
    for index in 0..row.columns().len() {
        columns.push(row.try_get::<Option<Vec<u8>>, _>(index)?);
    }
    Ok(SqlRow::new(columns))
}

/// Pooled data source backed by a lazily created sqlx connection pool.
pub struct PooledDataSource {
    config: ConnectionConfig,
    pool: RwLock<Option<PgPool>>,
}

impl PooledDataSource {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    /// Get or create the connection pool
    async fn pool(&self) -> Result<PgPool, StoreError> {
        {
            let pool = self.pool.read().await;
            if let Some(pool) = pool.as_ref() {
                return Ok(pool.clone());
            }
        }

        let mut slot = self.pool.write().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let mut pool_options = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .acquire_timeout(Duration::from_secs(self.config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(self.config.idle_timeout_seconds));

        // Set max lifetime if specified
        if self.config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(self.config.max_lifetime_seconds));
        }

        let pool = pool_options
            .connect(&self.config.connection_string())
            .await?;

        *slot = Some(pool.clone());
        Ok(pool)
    }
}

impl std::fmt::Debug for PooledDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connected = match self.pool.try_read() {
            Ok(slot) => slot.is_some(),
            Err(_) => false,
        };

        f.debug_struct("PooledDataSource")
            .field("target", &self.describe())
            .field("connected", &connected)
            .finish()
    }
}

#[async_trait]
impl DataSource for PooledDataSource {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!(
            "pooled data source at {}:{}/{}",
            self.config.host, self.config.port, self.config.database
        )
    }

    async fn execute(&self, sql: &str, params: Vec<SqlParam>) -> Result<u64, StoreError> {
        let pool = self.pool().await?;
        let result = bind_params(sql, params).execute(&pool).await?;
        Ok(result.rows_affected())
    }

    async fn fetch(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<SqlRow>, StoreError> {
        let pool = self.pool().await?;
        let rows = bind_params(sql, params).fetch_all(&pool).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Non-pooled data source that opens one connection per statement.
///
/// The plain-driver counterpart of [`PooledDataSource`]; useful for
/// low-traffic caches and for distinguishing wiring in tests.
pub struct SimpleDataSource {
    config: ConnectionConfig,
}

impl SimpleDataSource {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<PgConnection, StoreError> {
        Ok(PgConnection::connect(&self.config.connection_string()).await?)
    }
}

impl std::fmt::Debug for SimpleDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleDataSource")
            .field("target", &self.describe())
            .finish()
    }
}

#[async_trait]
impl DataSource for SimpleDataSource {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!(
            "simple data source at {}:{}/{}",
            self.config.host, self.config.port, self.config.database
        )
    }

    async fn execute(&self, sql: &str, params: Vec<SqlParam>) -> Result<u64, StoreError> {
        let mut conn = self.connect().await?;
        let result = bind_params(sql, params).execute(&mut conn).await?;
        let _ = conn.close().await;
        Ok(result.rows_affected())
    }

    async fn fetch(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<SqlRow>, StoreError> {
        let mut conn = self.connect().await?;
        let rows = bind_params(sql, params).fetch_all(&mut conn).await?;
        let _ = conn.close().await;
        rows.iter().map(decode_row).collect()
    }
}
