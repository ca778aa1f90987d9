//! Query execution against the legacy store.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use kc_federation::FederationResult;

use crate::config::LegacyStoreConfig;
use crate::connection::{ConnectionFactory, LegacyConnection, RawRow};
use crate::statement::{BoundQuery, Statement};

/// Forward-only stream of rows produced by one query.
pub type RowStream = BoxStream<'static, FederationResult<RawRow>>;

/// Runs statements on connections acquired per call.
///
/// Every call acquires its own connection and releases it before yielding a
/// result, on success, empty result and error alike.
pub struct QueryExecutor<F> {
    factory: Arc<F>,
    config: Arc<LegacyStoreConfig>,
}

impl<F> Clone for QueryExecutor<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F: ConnectionFactory> QueryExecutor<F> {
    /// Creates an executor.
    #[must_use]
    pub const fn new(factory: Arc<F>, config: Arc<LegacyStoreConfig>) -> Self {
        Self { factory, config }
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &LegacyStoreConfig {
        &self.config
    }

    /// Returns the connection factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Counts the rows of the user table.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be reached and
    /// `Query` if the store rejects the statement.
    pub async fn count(&self) -> FederationResult<u64> {
        let query = Statement::Count.bind(&self.config.schema);
        tracing::debug!(statement = query.statement.name(), "Executing legacy query");

        let mut conn = self.factory.acquire(&self.config).await?;
        let result = conn.fetch_count(&query).await;
        conn.release().await;
        result
    }

    /// Runs a statement and streams its rows.
    ///
    /// Nothing is executed until the stream is first polled. The rows are
    /// fetched in one round trip and the connection is released before the
    /// first row is yielded. To read the rows again, call `query` again.
    pub fn query(&self, statement: Statement) -> RowStream {
        let query = statement.bind(&self.config.schema);
        let executor = self.clone();

        stream::once(async move {
            let rows = executor.fetch(&query).await?;
            Ok::<_, kc_federation::FederationError>(stream::iter(rows.into_iter().map(Ok)))
        })
        .try_flatten()
        .boxed()
    }

    async fn fetch(&self, query: &BoundQuery) -> FederationResult<Vec<RawRow>> {
        tracing::debug!(statement = query.statement.name(), "Executing legacy query");

        let mut conn = self.factory.acquire(&self.config).await?;
        let result = conn.fetch_rows(query).await;
        conn.release().await;

        if let Ok(rows) = &result {
            tracing::debug!(
                statement = query.statement.name(),
                rows = rows.len(),
                "Legacy query returned"
            );
        }
        result
    }
}
