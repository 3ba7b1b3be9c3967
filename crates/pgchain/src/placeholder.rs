//! `?` marker scanning and `$n` renumbering.
//!
//! Fragments are written with a uniform `?` marker. Numbering is deferred
//! until the whole statement is assembled, so a fragment never needs to know
//! how many arguments precede it. `??` stands for a literal `?` (needed for
//! operators such as jsonb `?`) and is never bound.

use crate::error::{ChainError, ChainResult};
use crate::param::{Param, ParamList};
use crate::sql::Query;
use std::fmt::Write;

/// The uniform placeholder marker used in fragments.
pub const MARKER: char = '?';

/// Count the unescaped markers in `fragment`.
pub fn count_markers(fragment: &str) -> usize {
    let mut count = 0;
    let mut chars = fragment.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != MARKER {
            continue;
        }
        if chars.peek() == Some(&MARKER) {
            chars.next();
        } else {
            count += 1;
        }
    }
    count
}

/// Check that `fragment` has exactly as many markers as `args`.
pub(crate) fn check_arity(fragment: &str, args: &[Param]) -> ChainResult<()> {
    let markers = count_markers(fragment);
    if markers != args.len() {
        return Err(ChainError::argument_mismatch(fragment, markers, args.len()));
    }
    Ok(())
}

/// Append `fragment` to `out`, replacing each marker with the position its
/// argument receives in `params`.
///
/// Callers check arity first; a marker without an argument is left as-is.
pub(crate) fn write_numbered(out: &mut String, fragment: &str, args: &[Param], params: &mut ParamList) {
    let mut args = args.iter();
    let mut chars = fragment.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != MARKER {
            out.push(ch);
            continue;
        }
        if chars.peek() == Some(&MARKER) {
            chars.next();
            out.push(MARKER);
            continue;
        }
        match args.next() {
            Some(arg) => {
                let idx = params.push_param(arg.clone());
                // Writing into a String cannot fail.
                let _ = write!(out, "${idx}");
            }
            None => out.push(ch),
        }
    }
}

/// Convert a complete `?`-marked statement into `$n` form.
///
/// Fails with [`ChainError::ArgumentMismatch`] when the number of markers
/// differs from the number of arguments.
///
/// ```
/// use pgchain::{args, escape_args};
///
/// let q = escape_args("SELECT * FROM users WHERE id = ? AND name = ?", args![1_i64, "bob"]).unwrap();
/// assert_eq!(q.sql(), "SELECT * FROM users WHERE id = $1 AND name = $2");
/// ```
pub fn escape_args(statement: &str, args: Vec<Param>) -> ChainResult<Query> {
    check_arity(statement, &args)?;
    let mut sql = String::with_capacity(statement.len() + args.len() * 2);
    let mut params = ParamList::new();
    write_numbered(&mut sql, statement, &args, &mut params);
    Ok(Query::from_parts(sql, params.into_vec()))
}
