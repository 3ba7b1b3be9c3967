//! Statement timing, timeouts and SQL logging.
//!
//! [`MonitoredClient`] wraps any [`GenericClient`](crate::GenericClient) and
//! reports every statement it runs. With the `tracing` feature (on by default)
//! each statement produces a `debug` event under the `pgchain.sql` target, and
//! statements slower than the configured threshold produce a `warn` event.
//!
//! ```rust,ignore
//! use pgchain::{ExpressionChain, MonitorConfig, MonitoredClient, args};
//! use std::time::Duration;
//!
//! let client = MonitoredClient::new(client).with_config(
//!     MonitorConfig::new()
//!         .with_query_timeout(Duration::from_secs(30))
//!         .with_slow_query_threshold(Duration::from_millis(250)),
//! );
//!
//! let rows = ExpressionChain::new()
//!     .select(["id", "name"])
//!     .table("users")
//!     .and_where("id > ?", args![10_i64])
//!     .tag("users.list")
//!     .fetch_all(&client)
//!     .await?;
//! ```

mod client;
mod config;


pub use client::MonitoredClient;
pub use config::MonitorConfig;

use crate::sql::{starts_with_keyword, strip_sql_prefix};

/// Statement kind, as reported in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// Classify by leading keyword, skipping comments and parentheses.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") || starts_with_keyword(trimmed, "WITH") {
            StatementKind::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            StatementKind::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            StatementKind::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            StatementKind::Delete
        } else {
            StatementKind::Other
        }
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
