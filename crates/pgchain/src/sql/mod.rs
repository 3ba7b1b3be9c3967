//! Rendered statements and their execution.
//!
//! A [`Query`] is what every chain renders into: SQL text already numbered
//! `$1, $2, ...` plus the arguments in matching order. It can also be built by
//! hand when you already have a numbered statement.
//!
//! # Example
//!
//! ```ignore
//! use pgchain::query;
//!
//! let n: i64 = query("SELECT count(*) FROM users WHERE status = $1")
//!     .bind("active")
//!     .fetch_scalar_one(&client)
//!     .await?;
//! ```

mod query;
mod stream;

#[cfg(test)]
mod tests;

pub use query::Query;
pub use stream::FromRowStream;

/// Build a query from a pre-numbered SQL string (`$1, $2, ...`).
pub fn query(initial_sql: impl Into<String>) -> Query {
    Query::new(initial_sql)
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            if let Some(pos) = s.find('\n') {
                s = &s[pos + 1..];
                continue;
            }
            return "";
        }
        if s.starts_with("/*") {
            if let Some(pos) = s.find("*/") {
                s = &s[pos + 2..];
                continue;
            }
            return "";
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}
