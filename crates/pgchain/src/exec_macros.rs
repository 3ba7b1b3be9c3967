/// Generate execution methods for a chain type that has
/// `fn render(&self) -> ChainResult<Query>`.
///
/// Every method renders first, so an incomplete chain fails before the client
/// is touched, then delegates to the matching [`Query`](crate::Query) method.
macro_rules! impl_chain_exec {
    () => {
        /// Render and return all rows.
        pub async fn fetch_all(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<Vec<tokio_postgres::Row>> {
            let query = self.render()?;
            query.fetch_all(conn).await
        }

        /// Render and return all rows mapped to `T`.
        pub async fn fetch_all_as<T: $crate::row::FromRow>(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<Vec<T>> {
            let query = self.render()?;
            query.fetch_all_as(conn).await
        }

        /// Render and return the **first** row.
        pub async fn fetch_one(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<tokio_postgres::Row> {
            let query = self.render()?;
            query.fetch_one(conn).await
        }

        /// Render and return the **first** row mapped to `T`.
        pub async fn fetch_one_as<T: $crate::row::FromRow>(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<T> {
            let query = self.render()?;
            query.fetch_one_as(conn).await
        }

        /// Render and require **exactly one** row.
        pub async fn fetch_one_strict(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<tokio_postgres::Row> {
            let query = self.render()?;
            query.fetch_one_strict(conn).await
        }

        /// Render and require **exactly one** row, mapped to `T`.
        pub async fn fetch_one_strict_as<T: $crate::row::FromRow>(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<T> {
            let query = self.render()?;
            query.fetch_one_strict_as(conn).await
        }

        /// Render and return the first row, if any.
        pub async fn fetch_opt(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<Option<tokio_postgres::Row>> {
            let query = self.render()?;
            query.fetch_opt(conn).await
        }

        /// Render and return at most one row mapped to `T`.
        pub async fn fetch_opt_as<T: $crate::row::FromRow>(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<Option<T>> {
            let query = self.render()?;
            query.fetch_opt_as(conn).await
        }

        /// Render and return the affected row count.
        pub async fn execute(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<u64> {
            let query = self.render()?;
            query.execute(conn).await
        }

        /// Render and return a row stream.
        pub async fn stream(&self, conn: &impl $crate::client::StreamingClient) -> $crate::error::ChainResult<$crate::client::RowStream> {
            let query = self.render()?;
            query.stream(conn).await
        }

        /// Render and return a stream of `T`.
        pub async fn stream_as<T: $crate::row::FromRow>(&self, conn: &impl $crate::client::StreamingClient) -> $crate::error::ChainResult<$crate::sql::FromRowStream<T>> {
            let query = self.render()?;
            query.stream_as(conn).await
        }

        /// Render and return exactly one scalar value from column 0.
        pub async fn fetch_scalar_one<T>(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<T>
        where
            T: for<'b> tokio_postgres::types::FromSql<'b> + Send + Sync,
        {
            let query = self.render()?;
            query.fetch_scalar_one(conn).await
        }

        /// Render and return at most one scalar value from column 0.
        pub async fn fetch_scalar_opt<T>(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<Option<T>>
        where
            T: for<'b> tokio_postgres::types::FromSql<'b> + Send + Sync,
        {
            let query = self.render()?;
            query.fetch_scalar_opt(conn).await
        }

        /// Render and return every scalar value from column 0.
        pub async fn fetch_scalar_all<T>(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<Vec<T>>
        where
            T: for<'b> tokio_postgres::types::FromSql<'b> + Send + Sync,
        {
            let query = self.render()?;
            query.fetch_scalar_all(conn).await
        }

        /// Render and check whether any row matches.
        pub async fn exists(&self, conn: &impl $crate::client::GenericClient) -> $crate::error::ChainResult<bool> {
            let query = self.render()?;
            query.exists(conn).await
        }
    };
}
