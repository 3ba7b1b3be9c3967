use super::atom::Atom;
use super::{ExpressionChain, Operation};
use crate::error::{ChainError, ChainResult, Missing};
use crate::param::{Param, ParamList};
use crate::placeholder::{check_arity, write_numbered};
use crate::sql::Query;
use std::collections::BTreeMap;
use std::fmt::Write;

impl ExpressionChain {
    /// Render the chain into SQL text and an argument list.
    ///
    /// Clauses always come out in this order, whatever order the builder
    /// methods were called in:
    ///
    /// `SELECT`/`DELETE` → `FROM` → `JOIN`s → `WHERE` (joined by `AND`) →
    /// `GROUP BY` → `ORDER BY` → `LIMIT` → `OFFSET`
    ///
    /// `?` markers are numbered `$1, $2, ...` in final-text order and the
    /// arguments are returned in that same order, so join arguments always
    /// precede predicate arguments.
    ///
    /// An `INSERT` renders as `INSERT INTO $1 (cols) VALUES ($2, ...)` with the
    /// table name bound as the first argument. Joins, predicates, grouping,
    /// ordering and pagination do not apply to it.
    ///
    /// Rendering does not modify the chain; calling it twice yields the same
    /// output.
    ///
    /// # Errors
    ///
    /// - [`ChainError::Incomplete`] when no operation or no table is set, or
    ///   an insert has no values.
    /// - [`ChainError::ArgumentMismatch`] when a fragment's marker count
    ///   differs from the number of arguments given with it.
    pub fn render(&self) -> ChainResult<Query> {
        let operation = self
            .operation
            .as_ref()
            .ok_or(ChainError::Incomplete(Missing::Operation))?;
        let table = self
            .table
            .as_deref()
            .ok_or(ChainError::Incomplete(Missing::Table))?;

        let mut out = Renderer::new();
        match operation {
            Operation::Insert(values) => {
                out.insert(table, values)?;
                return Ok(out.finish(self.tag.as_deref()));
            }
            Operation::Select(columns) if columns.is_empty() => out.keyword("SELECT *"),
            Operation::Select(columns) => {
                out.keyword("SELECT ");
                out.fragment(&columns.join(", "), &[])?;
            }
            Operation::Delete => out.keyword("DELETE *"),
        }

        out.keyword(" FROM ");
        out.fragment(table, &[])?;

        for join in &self.joins {
            out.keyword(" JOIN ");
            out.atom(join)?;
        }

        for (i, predicate) in self.predicates.iter().enumerate() {
            out.keyword(if i == 0 { " WHERE " } else { " AND " });
            out.atom(predicate)?;
        }

        if let Some(group_by) = &self.group_by {
            out.keyword(" GROUP BY ");
            out.fragment(group_by, &[])?;
        }
        if let Some(order_by) = &self.order_by {
            out.keyword(" ORDER BY ");
            out.fragment(order_by, &[])?;
        }
        if let Some(limit) = self.limit {
            out.literal(" LIMIT ", limit);
        }
        if let Some(offset) = self.offset {
            out.literal(" OFFSET ", offset);
        }

        Ok(out.finish(self.tag.as_deref()))
    }
}

/// Single-pass writer that numbers markers as fragments are appended.
struct Renderer {
    sql: String,
    params: ParamList,
}

impl Renderer {
    fn new() -> Self {
        Self {
            sql: String::with_capacity(128),
            params: ParamList::new(),
        }
    }

    /// Fixed SQL text, never scanned for markers.
    fn keyword(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn literal(&mut self, keyword: &str, n: u64) {
        self.sql.push_str(keyword);
        // Writing into a String cannot fail.
        let _ = write!(self.sql, "{n}");
    }

    fn fragment(&mut self, text: &str, args: &[Param]) -> ChainResult<()> {
        check_arity(text, args)?;
        write_numbered(&mut self.sql, text, args, &mut self.params);
        Ok(())
    }

    fn atom(&mut self, atom: &Atom) -> ChainResult<()> {
        self.fragment(&atom.text, &atom.args)
    }

    /// Column names are written verbatim; only the table and the values are
    /// bound.
    fn insert(&mut self, table: &str, values: &BTreeMap<String, Param>) -> ChainResult<()> {
        if values.is_empty() {
            return Err(ChainError::Incomplete(Missing::InsertValues));
        }

        self.fragment("INSERT INTO ?", &[Param::new(table.to_string())])?;

        let columns: Vec<&str> = values.keys().map(String::as_str).collect();
        self.keyword(" (");
        self.keyword(&columns.join(", "));
        self.keyword(") VALUES ");

        let markers = vec!["?"; values.len()];
        let args: Vec<Param> = values.values().cloned().collect();
        self.fragment(&format!("({})", markers.join(", ")), &args)
    }

    fn finish(self, tag: Option<&str>) -> Query {
        let query = Query::from_parts(self.sql, self.params.into_vec());
        match tag {
            Some(tag) => query.tag(tag),
            None => query,
        }
    }
}
