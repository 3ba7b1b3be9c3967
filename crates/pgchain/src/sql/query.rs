use super::stream::FromRowStream;
use super::{starts_with_keyword, strip_sql_prefix};
use crate::client::{GenericClient, RowStream, StreamingClient};
use crate::error::{ChainError, ChainResult};
use crate::param::Param;
use crate::row::FromRow;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql};

/// A SQL string with numbered placeholders (`$1, $2, ...`) plus its arguments.
///
/// This is the output of [`ExpressionChain::render`](crate::ExpressionChain::render)
/// and [`escape_args`](crate::escape_args). The number of placeholders in
/// [`Query::sql`] always equals the length of [`Query::params`] for rendered
/// queries.
#[must_use]
#[derive(Clone, Debug)]
pub struct Query {
    sql: String,
    params: Vec<Param>,
    tag: Option<String>,
}

impl Query {
    /// Create a new pre-numbered query.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            tag: None,
        }
    }

    pub(crate) fn from_parts(sql: String, params: Vec<Param>) -> Self {
        Self {
            sql,
            params,
            tag: None,
        }
    }

    /// Associate a tag for monitoring/observability.
    ///
    /// The tag is passed to the `_tagged` methods of [`GenericClient`], which is
    /// how [`MonitoredClient`](crate::MonitoredClient) labels its log events.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Bind a parameter value.
    ///
    /// This does not modify the SQL string; the next `$n` must already be in it.
    pub fn bind<T>(mut self, value: T) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.params.push(Param::new(value));
        self
    }

    /// Access the SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Access the bound arguments in placeholder order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The monitoring tag, if one was set.
    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_sql).collect()
    }

    /// Split into SQL text and arguments.
    pub fn into_parts(self) -> (String, Vec<Param>) {
        (self.sql, self.params)
    }

    // ==================== Execution ====================

    /// Execute the query and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> ChainResult<Vec<Row>> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_tagged(tag, &self.sql, &params).await,
            None => conn.query(&self.sql, &params).await,
        }
    }

    /// Execute the query and return all rows mapped to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> ChainResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`ChainError::NotFound`]
    /// - 1 row: returns that row
    /// - multiple rows: returns the first row (does **not** error)
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> ChainResult<Row> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_one_tagged(tag, &self.sql, &params).await,
            None => conn.query_one(&self.sql, &params).await,
        }
    }

    /// Execute the query and return the **first** row mapped to `T`.
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> ChainResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute the query and require that it returns **exactly one** row.
    pub async fn fetch_one_strict(&self, conn: &impl GenericClient) -> ChainResult<Row> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_one_strict_tagged(tag, &self.sql, &params).await,
            None => conn.query_one_strict(&self.sql, &params).await,
        }
    }

    /// Execute the query and require exactly one row, mapped to `T`.
    pub async fn fetch_one_strict_as<T: FromRow>(&self, conn: &impl GenericClient) -> ChainResult<T> {
        let row = self.fetch_one_strict(conn).await?;
        T::from_row(&row)
    }

    /// Execute the query and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> ChainResult<Option<Row>> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_opt_tagged(tag, &self.sql, &params).await,
            None => conn.query_opt(&self.sql, &params).await,
        }
    }

    /// Execute the query and return at most one row mapped to `T`.
    pub async fn fetch_opt_as<T: FromRow>(&self, conn: &impl GenericClient) -> ChainResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the statement and return the affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> ChainResult<u64> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.execute_tagged(tag, &self.sql, &params).await,
            None => conn.execute(&self.sql, &params).await,
        }
    }

    // ==================== Streaming execution ====================

    /// Execute the query and return a row stream.
    ///
    /// Rows are pulled from the connection one at a time; the connection is
    /// busy until the stream is dropped or exhausted.
    pub async fn stream(&self, conn: &impl StreamingClient) -> ChainResult<RowStream> {
        let params = self.params_ref();
        match self.tag.as_deref() {
            Some(tag) => conn.query_stream_tagged(tag, &self.sql, &params).await,
            None => conn.query_stream(&self.sql, &params).await,
        }
    }

    /// Execute the query and return a stream of `T`.
    pub async fn stream_as<T: FromRow>(&self, conn: &impl StreamingClient) -> ChainResult<FromRowStream<T>> {
        let stream = self.stream(conn).await?;
        Ok(FromRowStream::new(stream))
    }

    // ==================== Convenience APIs ====================

    /// Execute and return exactly one scalar value from column 0.
    pub async fn fetch_scalar_one<T>(&self, conn: &impl GenericClient) -> ChainResult<T>
    where
        T: for<'b> FromSql<'b> + Send + Sync,
    {
        let row = self.fetch_one(conn).await?;
        row.try_get(0).map_err(|e| ChainError::decode("0", e.to_string()))
    }

    /// Execute and return at most one scalar value from column 0.
    pub async fn fetch_scalar_opt<T>(&self, conn: &impl GenericClient) -> ChainResult<Option<T>>
    where
        T: for<'b> FromSql<'b> + Send + Sync,
    {
        match self.fetch_opt(conn).await? {
            Some(r) => r
                .try_get(0)
                .map(Some)
                .map_err(|e| ChainError::decode("0", e.to_string())),
            None => Ok(None),
        }
    }

    /// Execute and return all scalar values from column 0.
    pub async fn fetch_scalar_all<T>(&self, conn: &impl GenericClient) -> ChainResult<Vec<T>>
    where
        T: for<'b> FromSql<'b> + Send + Sync,
    {
        let rows = self.fetch_all(conn).await?;
        rows.iter()
            .map(|r| r.try_get(0).map_err(|e| ChainError::decode("0", e.to_string())))
            .collect()
    }

    /// Check if any rows exist by wrapping the query in `SELECT EXISTS(...)`.
    pub async fn exists(&self, conn: &impl GenericClient) -> ChainResult<bool> {
        let wrapped = self.exists_sql()?;
        let params = self.params_ref();
        let row = match self.tag.as_deref() {
            Some(tag) => conn.query_one_tagged(tag, &wrapped, &params).await?,
            None => conn.query_one(&wrapped, &params).await?,
        };
        row.try_get(0).map_err(|e| ChainError::decode("0", e.to_string()))
    }

    pub(crate) fn exists_sql(&self) -> ChainResult<String> {
        let inner_sql = self.sql.trim_end();
        let inner_sql = inner_sql.strip_suffix(';').unwrap_or(inner_sql).trim_end();

        let trimmed = strip_sql_prefix(inner_sql);
        if !starts_with_keyword(trimmed, "SELECT") && !starts_with_keyword(trimmed, "WITH") {
            return Err(ChainError::Validation(
                "exists() only works with SELECT statements (including WITH ... SELECT)".to_string(),
            ));
        }
        Ok(format!("SELECT EXISTS({inner_sql})"))
    }
}
