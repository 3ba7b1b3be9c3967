//! The executor boundary: anything that can run a rendered statement.
//!
//! Chains only produce text and arguments. Running them is delegated to a
//! [`GenericClient`], implemented here for `tokio-postgres` clients and
//! transactions (and pooled `deadpool-postgres` clients with the `pool`
//! feature). Opening connections and driving transactions stays with the
//! caller; pass a transaction anywhere a client is expected.

use crate::error::{ChainError, ChainResult};
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients and transactions.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Vec<Row>>> + Send;

    /// Execute a query and return all rows, associating a tag for monitoring/observability.
    ///
    /// The default implementation ignores `tag` and calls [`GenericClient::query`].
    fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Vec<Row>>> + Send {
        let _ = tag;
        self.query(sql, params)
    }

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`ChainError::NotFound`]
    /// - 1 row: returns that row
    /// - multiple rows: returns the first row (does **not** error)
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| ChainError::not_found("Expected one row, got none"))
        }
    }

    /// Tagged variant of [`GenericClient::query_one`].
    fn query_one_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Row>> + Send {
        async move {
            let rows = self.query_tagged(tag, sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| ChainError::not_found("Expected one row, got none"))
        }
    }

    /// Execute a query and require that it returns **exactly one** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`ChainError::NotFound`]
    /// - 1 row: returns that row
    /// - multiple rows: returns [`ChainError::TooManyRows`]
    fn query_one_strict(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Row>> + Send {
        async move { exactly_one(self.query(sql, params).await?) }
    }

    /// Tagged variant of [`GenericClient::query_one_strict`].
    fn query_one_strict_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Row>> + Send {
        async move { exactly_one(self.query_tagged(tag, sql, params).await?) }
    }

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Tagged variant of [`GenericClient::query_opt`].
    fn query_opt_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Option<Row>>> + Send {
        async move {
            let rows = self.query_tagged(tag, sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send;

    /// Tagged variant of [`GenericClient::execute`]. The default ignores `tag`.
    fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send {
        let _ = tag;
        self.execute(sql, params)
    }

    /// Return a cancellation token for the underlying connection, if supported.
    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        None
    }
}

fn exactly_one(rows: Vec<Row>) -> ChainResult<Row> {
    let got = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), got) {
        (None, _) => Err(ChainError::not_found("Expected 1 row, got 0")),
        (Some(row), 1) => Ok(row),
        (Some(_), got) => Err(ChainError::too_many_rows(1, got)),
    }
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        Some(tokio_postgres::Client::cancel_token(self))
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, params)
            .await
            .map_err(ChainError::from_db_error)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        Some(tokio_postgres::Transaction::cancel_token(self))
    }
}

/// A stream of database rows.
///
/// A type-erased `Stream<Item = ChainResult<Row>>` so that different client
/// implementations return a uniform streaming type.
#[must_use]
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = ChainResult<Row>> + Send>>,
}

impl RowStream {
    /// Create a new `RowStream` from any compatible stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = ChainResult<Row>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for RowStream {
    type Item = ChainResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Row-by-row fetching.
///
/// Separate from [`GenericClient`] so that only clients that can stream
/// (via `tokio-postgres`'s `query_raw`) need to implement it.
pub trait StreamingClient: GenericClient {
    /// Execute a query and return a `RowStream` for incremental consumption.
    fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<RowStream>> + Send;

    /// Tagged variant of [`StreamingClient::query_stream`]. The default ignores `tag`.
    fn query_stream_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<RowStream>> + Send {
        let _ = tag;
        self.query_stream(sql, params)
    }
}

struct MapDbRowStream<S> {
    inner: Pin<Box<S>>,
}

impl<S> MapDbRowStream<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<S> Stream for MapDbRowStream<S>
where
    S: Stream<Item = Result<Row, tokio_postgres::Error>> + Send + 'static,
{
    type Item = ChainResult<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(ChainError::from_db_error(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl StreamingClient for tokio_postgres::Client {
    async fn query_stream(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<RowStream> {
        let stream = tokio_postgres::Client::query_raw(self, sql, params.iter().copied())
            .await
            .map_err(ChainError::from_db_error)?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }
}

impl StreamingClient for tokio_postgres::Transaction<'_> {
    async fn query_stream(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<RowStream> {
        let stream = tokio_postgres::Transaction::query_raw(self, sql, params.iter().copied())
            .await
            .map_err(ChainError::from_db_error)?;
        Ok(RowStream::new(MapDbRowStream::new(stream)))
    }
}

/// Transaction-scoped settings.
///
/// Implemented only for transaction handles, so `SET LOCAL` cannot be issued
/// on a bare connection where it would be a silent no-op.
pub trait LocalSettings: GenericClient {
    /// Run `SET LOCAL <setting>` for the rest of the current transaction,
    /// e.g. `"statement_timeout = '5s'"`.
    ///
    /// `SET` takes no bind parameters, so `setting` is sent as written and
    /// must not come from untrusted input.
    fn set_local(&self, setting: &str) -> impl std::future::Future<Output = ChainResult<()>> + Send {
        async move {
            let setting = setting.trim();
            if setting.is_empty() {
                return Err(ChainError::Validation("SET LOCAL needs a setting".to_string()));
            }
            self.execute(&format!("SET LOCAL {setting}"), &[]).await?;
            Ok(())
        }
    }
}

impl LocalSettings for tokio_postgres::Transaction<'_> {}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper -> tokio_postgres::Client).
        GenericClient::query(&***self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        GenericClient::execute(&***self, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        GenericClient::cancel_token(&***self)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        GenericClient::cancel_token(&**self)
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Client {
    async fn query_stream(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<RowStream> {
        StreamingClient::query_stream(&***self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl StreamingClient for deadpool_postgres::Transaction<'_> {
    async fn query_stream(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<RowStream> {
        StreamingClient::query_stream(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl LocalSettings for deadpool_postgres::Transaction<'_> {}

// ===== Reference implementations =====

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        (*self).query(sql, params).await
    }

    fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<Vec<Row>>> + Send {
        (*self).query_tagged(tag, sql, params)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        (*self).execute(sql, params).await
    }

    fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send {
        (*self).execute_tagged(tag, sql, params)
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        (*self).cancel_token()
    }
}

impl<C: StreamingClient> StreamingClient for &C {
    async fn query_stream(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<RowStream> {
        (*self).query_stream(sql, params).await
    }

    fn query_stream_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ChainResult<RowStream>> + Send {
        (*self).query_stream_tagged(tag, sql, params)
    }
}

impl<C: LocalSettings> LocalSettings for &C {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTx {
        executed: Mutex<Vec<(String, usize)>>,
    }

    impl GenericClient for RecordingTx {
        async fn query(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
            Ok(vec![])
        }
        async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
            self.executed
                .lock()
                .unwrap()
                .push((sql.to_string(), params.len()));
            Ok(0)
        }
    }

    impl LocalSettings for RecordingTx {}

    #[tokio::test]
    async fn set_local_sends_setting_verbatim() {
        let tx = RecordingTx::default();
        tx.set_local("statement_timeout = '5s'").await.unwrap();
        (&tx).set_local("  search_path TO app, public ").await.unwrap();

        let executed = tx.executed.lock().unwrap();
        assert_eq!(
            executed.as_slice(),
            &[
                ("SET LOCAL statement_timeout = '5s'".to_string(), 0),
                ("SET LOCAL search_path TO app, public".to_string(), 0),
            ]
        );
    }

    #[tokio::test]
    async fn set_local_rejects_empty_setting() {
        let tx = RecordingTx::default();
        let err = tx.set_local("   ").await.unwrap_err();
        assert!(matches!(err, ChainError::Validation(_)));
        assert!(tx.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_local_through_monitored_client() {
        let client = crate::MonitoredClient::new(RecordingTx::default());
        client.set_local("lock_timeout = 100").await.unwrap();

        let executed = client.inner().executed.lock().unwrap();
        assert_eq!(executed[0].0, "SET LOCAL lock_timeout = 100");
    }
}
