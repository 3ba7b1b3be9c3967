use super::*;
use crate::args;
use crate::client::{GenericClient, RowStream, StreamingClient};
use crate::error::{ChainError, ChainResult};
use futures_util::StreamExt;
use std::sync::Mutex;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Default)]
struct TagCapture {
    calls: Mutex<Vec<(Option<String>, String, usize)>>,
}

impl GenericClient for TagCapture {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        self.calls
            .lock()
            .unwrap()
            .push((None, sql.to_string(), params.len()));
        Ok(vec![])
    }
    async fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<Vec<Row>> {
        self.calls
            .lock()
            .unwrap()
            .push((Some(tag.to_string()), sql.to_string(), params.len()));
        Ok(vec![])
    }
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        self.calls
            .lock()
            .unwrap()
            .push((None, sql.to_string(), params.len()));
        Ok(1)
    }
}

#[test]
fn bind_appends_params_without_touching_sql() {
    let q = query("SELECT * FROM users WHERE a = $1 AND b = $2")
        .bind(1_i32)
        .bind("x");

    assert_eq!(q.sql(), "SELECT * FROM users WHERE a = $1 AND b = $2");
    assert_eq!(format!("{:?}", q.params()), r#"[1, "x"]"#);
    assert_eq!(q.params_ref().len(), 2);
    assert_eq!(q.tag_name(), None);
}

#[test]
fn into_parts_returns_text_and_args() {
    let q = Query::from_parts("SELECT $1".to_string(), args![5_i64]).tag("t");
    assert_eq!(q.tag_name(), Some("t"));
    let (sql, params) = q.into_parts();
    assert_eq!(sql, "SELECT $1");
    assert_eq!(params.len(), 1);
}

#[test]
fn exists_wraps_select() {
    let q = query("SELECT id FROM users WHERE id = $1;  ");
    assert_eq!(
        q.exists_sql().unwrap(),
        "SELECT EXISTS(SELECT id FROM users WHERE id = $1)"
    );

    let q = query("-- lookup\nWITH x AS (SELECT 1) SELECT * FROM x");
    assert!(q.exists_sql().is_ok());
}

#[test]
fn exists_rejects_non_select() {
    let err = query("DELETE * FROM users").exists_sql().unwrap_err();
    assert!(matches!(err, ChainError::Validation(_)));
}

#[test]
fn keyword_detection_skips_comments_and_parens() {
    assert_eq!(strip_sql_prefix("  /* c */ (SELECT 1)"), "SELECT 1)");
    assert_eq!(strip_sql_prefix("-- only a comment"), "");
    assert!(starts_with_keyword("select 1", "SELECT"));
    assert!(!starts_with_keyword("SEL", "SELECT"));
}

#[tokio::test]
async fn untagged_query_uses_plain_client_methods() {
    let client = TagCapture::default();
    let q = query("SELECT * FROM users WHERE id = $1").bind(3_i64);

    let rows = q.fetch_all(&client).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(q.execute(&client).await.unwrap(), 1);

    let calls = client.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(tag, _, n)| tag.is_none() && *n == 1));
}

#[tokio::test]
async fn tagged_query_forwards_tag() {
    let client = TagCapture::default();
    let q = query("SELECT 1").tag("health");

    q.fetch_all(&client).await.unwrap();

    let calls = client.calls.lock().unwrap();
    assert_eq!(
        calls.as_slice(),
        &[(Some("health".to_string()), "SELECT 1".to_string(), 0)]
    );
}

#[tokio::test]
async fn fetch_one_on_no_rows_is_not_found() {
    let client = TagCapture::default();
    let err = query("SELECT 1").fetch_one(&client).await.unwrap_err();
    assert!(err.is_not_found());

    let err = query("SELECT 1").fetch_one_strict(&client).await.unwrap_err();
    assert!(err.is_not_found());

    let row = query("SELECT 1").fetch_opt(&client).await.unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn scalar_helpers_on_empty_result() {
    let client = TagCapture::default();

    let none: Option<i64> = query("SELECT 1").fetch_scalar_opt(&client).await.unwrap();
    assert_eq!(none, None);

    let all: Vec<i64> = query("SELECT 1").fetch_scalar_all(&client).await.unwrap();
    assert!(all.is_empty());
}

// ==================== Streaming ====================

/// Streams nothing, or a single driver error, and records how it was opened.
#[derive(Default)]
struct ScriptedStream {
    fail: bool,
    opened: Mutex<Vec<(Option<String>, String)>>,
}

impl ScriptedStream {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn rows(&self) -> RowStream {
        let items: Vec<ChainResult<Row>> = if self.fail {
            vec![Err(ChainError::Validation("connection reset".to_string()))]
        } else {
            vec![]
        };
        RowStream::new(futures_util::stream::iter(items))
    }
}

impl GenericClient for ScriptedStream {
    async fn query(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> ChainResult<Vec<Row>> {
        Ok(vec![])
    }
    async fn execute(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> ChainResult<u64> {
        Ok(0)
    }
}

impl StreamingClient for ScriptedStream {
    async fn query_stream(&self, sql: &str, _: &[&(dyn ToSql + Sync)]) -> ChainResult<RowStream> {
        self.opened.lock().unwrap().push((None, sql.to_string()));
        Ok(self.rows())
    }
    async fn query_stream_tagged(
        &self,
        tag: &str,
        sql: &str,
        _: &[&(dyn ToSql + Sync)],
    ) -> ChainResult<RowStream> {
        self.opened
            .lock()
            .unwrap()
            .push((Some(tag.to_string()), sql.to_string()));
        Ok(self.rows())
    }
}

#[derive(Debug)]
struct Never;

impl crate::row::FromRow for Never {
    fn from_row(_: &Row) -> ChainResult<Self> {
        Err(ChainError::decode("id", "unexpected row"))
    }
}

#[tokio::test]
async fn empty_stream_ends() {
    let client = ScriptedStream::default();

    let mut rows = query("SELECT id FROM t").stream(&client).await.unwrap();
    assert!(rows.next().await.is_none());

    let mut mapped = query("SELECT id FROM t")
        .tag("t.ids")
        .stream_as::<Never>(&client)
        .await
        .unwrap();
    assert!(mapped.next().await.is_none());
    assert_eq!(mapped.rows_seen(), 0);

    let opened = client.opened.lock().unwrap();
    assert_eq!(
        opened.as_slice(),
        &[
            (None, "SELECT id FROM t".to_string()),
            (Some("t.ids".to_string()), "SELECT id FROM t".to_string()),
        ]
    );
}

#[tokio::test]
async fn driver_error_passes_through_mapped_stream() {
    let client = ScriptedStream::failing();

    let mut mapped = query("SELECT id FROM t")
        .stream_as::<Never>(&client)
        .await
        .unwrap();
    match mapped.next().await {
        Some(Err(ChainError::Validation(message))) => assert_eq!(message, "connection reset"),
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(mapped.next().await.is_none());
}

#[tokio::test]
async fn chains_stream_rendered_sql() {
    let client = ScriptedStream::default();
    let chain = crate::ExpressionChain::new()
        .select(["id"])
        .table("t")
        .and_where("id > ?", args![1_i64]);

    let mut rows = chain.stream(&client).await.unwrap();
    assert!(rows.next().await.is_none());
    let mut mapped = crate::SharedChain::from(chain).stream_as::<Never>(&client).await.unwrap();
    assert!(mapped.next().await.is_none());

    let opened = client.opened.lock().unwrap();
    assert_eq!(opened.len(), 2);
    assert!(opened.iter().all(|(_, sql)| sql == "SELECT id FROM t WHERE id > $1"));

    let err = crate::ExpressionChain::new()
        .select(["id"])
        .stream(&client)
        .await
        .err()
        .unwrap();
    assert!(err.is_incomplete());
}

#[test]
fn decode_errors_name_the_row() {
    let err = stream::at_row(ChainError::decode("id", "wrong type"), 4);
    match err {
        ChainError::Decode { column, message } => {
            assert_eq!(column, "id");
            assert_eq!(message, "row 4: wrong type");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = stream::at_row(ChainError::not_found("gone"), 4);
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Not found: gone");
}

async fn try_connect() -> Option<tokio_postgres::Client> {
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(client)
}

#[tokio::test]
async fn exists_against_database() {
    let Some(client) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let yes = query("SELECT 1 WHERE $1::int > 0")
        .bind(1_i32)
        .exists(&client)
        .await
        .unwrap();
    assert!(yes);

    let no = query("SELECT 1 WHERE $1::int > 0")
        .bind(-1_i32)
        .exists(&client)
        .await
        .unwrap();
    assert!(!no);
}
