//! # pgchain
//!
//! A fluent SQL statement builder for Postgres.
//!
//! ## Features
//!
//! - **Fluent chains**: record operation, table, joins, predicates, grouping,
//!   ordering and pagination in any order; render once at the end
//! - **Fixed clause order**: the rendered statement always reads
//!   `SELECT/DELETE → FROM → JOIN → WHERE → GROUP BY → ORDER BY → LIMIT → OFFSET`
//! - **Numbered placeholders**: `?` markers become `$1, $2, ...` in text order,
//!   with arguments returned in the same order
//! - **Executor-agnostic**: a rendered [`Query`] runs on anything implementing
//!   [`GenericClient`]; chains can execute directly
//! - **Query monitoring**: [`MonitoredClient`] adds timeouts and `tracing` events
//!
//! ## Example
//!
//! ```
//! use pgchain::{ExpressionChain, args};
//!
//! let query = ExpressionChain::new()
//!     .select(["field1", "field2", "field3"])
//!     .table("convenient_table")
//!     .and_where("field1 > ?", args![1_i32])
//!     .and_where("field2 = ?", args![2_i32])
//!     .and_where("field3 > ?", args!["pajarito"])
//!     .render()
//!     .unwrap();
//!
//! assert_eq!(
//!     query.sql(),
//!     "SELECT field1, field2, field3 FROM convenient_table \
//!      WHERE field1 > $1 AND field2 = $2 AND field3 > $3"
//! );
//! assert_eq!(format!("{:?}", query.params()), r#"[1, 2, "pajarito"]"#);
//! ```
//!
//! Executing against a database:
//!
//! ```ignore
//! use pgchain::prelude::*;
//!
//! let rows = ExpressionChain::new()
//!     .select(["id", "username"])
//!     .table("users")
//!     .and_where("status = ?", args!["active"])
//!     .order_by("id")
//!     .limit(10)
//!     .fetch_all(&client)
//!     .await?;
//! ```

#[macro_use]
mod exec_macros;

pub mod chain;
pub mod client;
pub mod error;
pub mod monitor;
pub mod param;
pub mod placeholder;
pub mod prelude;
pub mod row;
pub mod sql;

pub use chain::{ExpressionChain, SharedChain};
pub use client::{GenericClient, LocalSettings, RowStream, StreamingClient};
pub use error::{ChainError, ChainResult, Missing};
pub use monitor::{MonitorConfig, MonitoredClient, StatementKind};
pub use param::Param;
pub use placeholder::{count_markers, escape_args};
pub use row::{FromRow, RowExt};
pub use sql::{FromRowStream, Query, query};
