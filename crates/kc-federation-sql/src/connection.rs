//! Legacy database connections.
//!
//! The adapter never pools or reuses connections: each call asks the
//! [`ConnectionFactory`] for a fresh connection, runs one statement on it and
//! hands it back through [`LegacyConnection::release`].

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use kc_federation::{FederationError, FederationResult};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Connection, Postgres, Row};

use crate::config::LegacyStoreConfig;
use crate::error::from_sqlx_error;
use crate::statement::{BoundQuery, SqlParam};

/// One row returned by the legacy store, keyed by column alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: HashMap<&'static str, Option<String>>,
}

impl RawRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value.
    #[must_use]
    pub fn with(mut self, column: &'static str, value: Option<String>) -> Self {
        self.values.insert(column, value);
        self
    }

    /// Returns the value of a column, `None` if it is absent or NULL.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).and_then(Option::as_deref)
    }
}

/// Hands out connections to the legacy store.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Connection type produced by this factory.
    type Connection: LegacyConnection;

    /// Opens a connection for exclusive use by one call.
    async fn acquire(&self, config: &LegacyStoreConfig) -> FederationResult<Self::Connection>;
}

/// A connection scoped to a single adapter call.
#[async_trait]
pub trait LegacyConnection: Send + Sized {
    /// Runs a statement that yields a single count.
    async fn fetch_count(&mut self, query: &BoundQuery) -> FederationResult<u64>;

    /// Runs a statement and returns every row it yields.
    async fn fetch_rows(&mut self, query: &BoundQuery) -> FederationResult<Vec<RawRow>>;

    /// Gives the connection back. Dropping a connection also releases it.
    async fn release(self);
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// Opens plain `PostgreSQL` connections from the store configuration.
///
/// `connection_timeout` bounds the connect; `read_timeout` becomes the
/// session `statement_timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnectionFactory;

#[async_trait]
impl ConnectionFactory for PgConnectionFactory {
    type Connection = PgLegacyConnection;

    async fn acquire(&self, config: &LegacyStoreConfig) -> FederationResult<PgLegacyConnection> {
        let mut options =
            PgConnectOptions::from_str(&config.connection_url).map_err(from_sqlx_error)?;
        if let Some(username) = &config.username {
            options = options.username(username);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        let statement_timeout = config.read_timeout.as_millis().to_string();
        let options = options
            .application_name("kc-legacy")
            .options([("statement_timeout", statement_timeout.as_str())]);

        let inner = tokio::time::timeout(
            config.connection_timeout,
            PgConnection::connect_with(&options),
        )
        .await
        .map_err(|_| {
            FederationError::unavailable(format!(
                "Connection not established within {:?}",
                config.connection_timeout
            ))
        })?
        .map_err(from_sqlx_error)?;

        Ok(PgLegacyConnection { inner })
    }
}

/// A single `PostgreSQL` connection.
#[derive(Debug)]
pub struct PgLegacyConnection {
    inner: PgConnection,
}

#[async_trait]
impl LegacyConnection for PgLegacyConnection {
    async fn fetch_count(&mut self, query: &BoundQuery) -> FederationResult<u64> {
        let row = bind(sqlx::query(&query.sql), &query.params)
            .fetch_one(&mut self.inner)
            .await
            .map_err(from_sqlx_error)?;

        let count: i64 = row.try_get(0).map_err(from_sqlx_error)?;
        u64::try_from(count)
            .map_err(|_| FederationError::query(format!("Negative row count {count}")))
    }

    async fn fetch_rows(&mut self, query: &BoundQuery) -> FederationResult<Vec<RawRow>> {
        let rows = bind(sqlx::query(&query.sql), &query.params)
            .fetch_all(&mut self.inner)
            .await
            .map_err(from_sqlx_error)?;

        rows.iter()
            .map(|row| decode_row(row, query.columns))
            .collect()
    }

    async fn release(self) {
        if let Err(e) = self.inner.close().await {
            tracing::warn!(error = %e, "Failed to close legacy store connection");
        }
    }
}

fn bind<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Text(value) => query.bind(value.as_str()),
            SqlParam::Int(value) => query.bind(*value),
        };
    }
    query
}

fn decode_row(row: &PgRow, columns: &'static [&'static str]) -> FederationResult<RawRow> {
    columns.iter().try_fold(RawRow::new(), |raw, &column| {
        let value: Option<String> = row.try_get(column).map_err(from_sqlx_error)?;
        Ok(raw.with(column, value))
    })
}
