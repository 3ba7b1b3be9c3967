use super::MonitorConfig;
use crate::client::{GenericClient, LocalSettings, RowStream, StreamingClient};
use crate::error::{ChainError, ChainResult};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A client wrapper that times, bounds and logs every statement.
///
/// Tags set with [`Query::tag`](crate::Query::tag) or
/// [`ExpressionChain::tag`](crate::ExpressionChain::tag) reach the log events
/// through the `_tagged` client methods.
#[derive(Debug, Clone)]
pub struct MonitoredClient<C> {
    client: C,
    config: MonitorConfig,
}

impl<C> MonitoredClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = Some(timeout);
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_query_threshold = Some(threshold);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

/// What a statement produced, for logging.
enum Outcome<'a> {
    Rows(usize),
    Affected(u64),
    Stream,
    Failed(&'a ChainError),
}

impl fmt::Display for Outcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Rows(n) => write!(f, "{n} row(s)"),
            Outcome::Affected(n) => write!(f, "{n} affected"),
            Outcome::Stream => f.write_str("stream opened"),
            Outcome::Failed(err) => write!(f, "error: {err}"),
        }
    }
}

impl<C: GenericClient> MonitoredClient<C> {
    async fn with_timeout<T, F>(&self, future: F) -> ChainResult<T>
    where
        F: Future<Output = ChainResult<T>> + Send,
    {
        let Some(timeout) = self.config.query_timeout else {
            return future.await;
        };
        match tokio::time::timeout(timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                // The server keeps running the statement unless told otherwise.
                if let Some(cancel_token) = self.client.cancel_token() {
                    tokio::spawn(async move {
                        let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                    });
                }
                Err(ChainError::Timeout(timeout))
            }
        }
    }

    async fn query_inner(
        &self,
        tag: Option<&str>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Vec<Row>> {
        let start = Instant::now();
        let result = match tag {
            Some(tag) => self.with_timeout(self.client.query_tagged(tag, sql, params)).await,
            None => self.with_timeout(self.client.query(sql, params)).await,
        };
        let outcome = match &result {
            Ok(rows) => Outcome::Rows(rows.len()),
            Err(err) => Outcome::Failed(err),
        };
        self.report(tag, sql, params.len(), start.elapsed(), &outcome);
        result
    }

    async fn execute_inner(
        &self,
        tag: Option<&str>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<u64> {
        let start = Instant::now();
        let result = match tag {
            Some(tag) => self.with_timeout(self.client.execute_tagged(tag, sql, params)).await,
            None => self.with_timeout(self.client.execute(sql, params)).await,
        };
        let outcome = match &result {
            Ok(n) => Outcome::Affected(*n),
            Err(err) => Outcome::Failed(err),
        };
        self.report(tag, sql, params.len(), start.elapsed(), &outcome);
        result
    }

    #[cfg(feature = "tracing")]
    fn report(
        &self,
        tag: Option<&str>,
        sql: &str,
        param_count: usize,
        elapsed: Duration,
        outcome: &Outcome<'_>,
    ) {
        let kind = super::StatementKind::from_sql(sql);
        let tag = tag.unwrap_or("-");
        let sql = self.config.display_sql(sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        tracing::debug!(
            target: "pgchain.sql",
            kind = ?kind,
            tag,
            param_count,
            elapsed_ms,
            outcome = %outcome,
            sql = %sql,
        );
        if self.config.is_slow(elapsed) {
            tracing::warn!(
                target: "pgchain.sql",
                kind = ?kind,
                tag,
                param_count,
                elapsed_ms,
                sql = %sql,
                "slow query",
            );
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn report(
        &self,
        _tag: Option<&str>,
        _sql: &str,
        _param_count: usize,
        _elapsed: Duration,
        _outcome: &Outcome<'_>,
    ) {
    }
}

impl<C: GenericClient> GenericClient for MonitoredClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        self.query_inner(None, sql, params).await
    }

    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Vec<Row>> {
        self.query_inner(Some(tag), sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        self.execute_inner(None, sql, params).await
    }

    async fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<u64> {
        self.execute_inner(Some(tag), sql, params).await
    }

    fn cancel_token(&self) -> Option<tokio_postgres::CancelToken> {
        self.client.cancel_token()
    }
}

impl<C: StreamingClient> MonitoredClient<C> {
    /// Only opening the stream is bounded by the timeout; rows are pulled by
    /// the caller afterwards.
    async fn stream_inner(
        &self,
        tag: Option<&str>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        let start = Instant::now();
        let result = match tag {
            Some(tag) => {
                self.with_timeout(self.client.query_stream_tagged(tag, sql, params))
                    .await
            }
            None => self.with_timeout(self.client.query_stream(sql, params)).await,
        };
        let outcome = match &result {
            Ok(_) => Outcome::Stream,
            Err(err) => Outcome::Failed(err),
        };
        self.report(tag, sql, params.len(), start.elapsed(), &outcome);
        result
    }
}

impl<C: StreamingClient> StreamingClient for MonitoredClient<C> {
    async fn query_stream(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        self.stream_inner(None, sql, params).await
    }

    async fn query_stream_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        self.stream_inner(Some(tag), sql, params).await
    }
}

impl<C: LocalSettings> LocalSettings for MonitoredClient<C> {}
