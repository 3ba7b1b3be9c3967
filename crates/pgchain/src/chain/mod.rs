//! Expression chains: accumulate fragments in any order, render once.
//!
//! A chain collects the pieces of one statement (operation, table, joins,
//! predicates, grouping, ordering, pagination) as independent fragments that
//! use a uniform `?` marker. Nothing is numbered until [`ExpressionChain::render`],
//! which lays clauses out in a fixed order and numbers `$1, $2, ...` in the
//! order they appear in the final text.
//!
//! # Example
//!
//! ```
//! use pgchain::{ExpressionChain, args};
//!
//! let q = ExpressionChain::new()
//!     .select(["id", "name"])
//!     .table("users")
//!     .and_where("status = ?", args!["active"])
//!     .join("teams ON teams.id = users.team_id AND teams.region = ?", args!["eu"])
//!     .order_by("name")
//!     .limit(20)
//!     .render()
//!     .unwrap();
//!
//! assert_eq!(
//!     q.sql(),
//!     "SELECT id, name FROM users JOIN teams ON teams.id = users.team_id AND teams.region = $1 \
//!      WHERE status = $2 ORDER BY name LIMIT 20"
//! );
//! ```

mod atom;
mod render;
mod shared;


pub use shared::SharedChain;

use crate::param::Param;
use atom::Atom;
use std::collections::BTreeMap;

/// The main operation of a chain.
#[derive(Clone, Debug)]
enum Operation {
    Select(Vec<String>),
    Delete,
    /// Keyed by column; `BTreeMap` keeps the columns in lexicographic order.
    Insert(BTreeMap<String, Param>),
}

/// An owned statement builder.
///
/// Every builder method takes `self` and returns it, so a chain is assembled
/// in one expression and then rendered with [`ExpressionChain::render`]. Use
/// [`SharedChain`] when one chain has to be fed from several threads.
///
/// Repeated [`and_where`](Self::and_where) and [`join`](Self::join) calls
/// accumulate in call order; every other method sets a single slot and the
/// last call wins.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct ExpressionChain {
    operation: Option<Operation>,
    table: Option<String>,
    joins: Vec<Atom>,
    predicates: Vec<Atom>,
    group_by: Option<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    tag: Option<String>,
}

impl ExpressionChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make this a `SELECT` of the given columns.
    ///
    /// An empty column list selects `*`.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operation = Some(Operation::Select(collect_columns(columns)));
        self
    }

    /// Make this a `DELETE`.
    ///
    /// Columns are accepted for call compatibility but the clause always
    /// renders as `DELETE *`.
    pub fn delete<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _ = columns;
        self.operation = Some(Operation::Delete);
        self
    }

    /// Make this an `INSERT` of one row.
    ///
    /// Columns render in lexicographic order regardless of the iteration
    /// order of `values`. If a column appears twice the last value is kept.
    /// Column names are emitted as given and never scanned for `?` markers.
    ///
    /// ```
    /// use pgchain::{ExpressionChain, Param};
    ///
    /// let q = ExpressionChain::new()
    ///     .insert([("b", Param::new(2_i32)), ("a", Param::new(1_i32))])
    ///     .table("t")
    ///     .render()
    ///     .unwrap();
    /// assert_eq!(q.sql(), "INSERT INTO $1 (a, b) VALUES ($2, $3)");
    /// ```
    pub fn insert<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, Param)>,
        K: Into<String>,
    {
        self.operation = Some(Operation::Insert(collect_values(values)));
        self
    }

    /// Set the table the statement operates on.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Append a predicate. Predicates are joined with `AND` in call order.
    pub fn and_where(mut self, fragment: impl Into<String>, args: impl IntoIterator<Item = Param>) -> Self {
        self.predicates.push(Atom::new(fragment, args));
        self
    }

    /// Append a join. `fragment` follows the `JOIN` keyword, e.g.
    /// `"teams ON teams.id = users.team_id"`.
    pub fn join(mut self, fragment: impl Into<String>, args: impl IntoIterator<Item = Param>) -> Self {
        self.joins.push(Atom::new(fragment, args));
        self
    }

    /// Set the `GROUP BY` expression.
    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by = Some(expr.into());
        self
    }

    /// Set the `ORDER BY` expression.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Set `LIMIT`. Rendered as a literal, not a bound argument.
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set `OFFSET`. Rendered as a literal, not a bound argument.
    ///
    /// An offset without a limit is rendered as given.
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Associate a tag for monitoring/observability. It is copied onto every
    /// rendered [`Query`](crate::Query).
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    impl_chain_exec!();
}

fn collect_columns<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into).collect()
}

fn collect_values<I, K>(values: I) -> BTreeMap<String, Param>
where
    I: IntoIterator<Item = (K, Param)>,
    K: Into<String>,
{
    values.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
