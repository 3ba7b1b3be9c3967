use super::atom::Atom;
use super::{ExpressionChain, Operation, collect_columns, collect_values};
use crate::error::ChainResult;
use crate::param::Param;
use crate::sql::Query;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An [`ExpressionChain`] behind a mutex, for chains fed from several threads.
///
/// Each method takes the lock for the duration of that call only and returns
/// `&Self`, so calls still chain. [`render`](Self::render) takes the same lock,
/// so it never observes a half-applied call. Establishing "operation and table
/// are set" before rendering remains the caller's job.
///
/// ```
/// use pgchain::{SharedChain, args};
///
/// let chain = SharedChain::new();
/// std::thread::scope(|s| {
///     s.spawn(|| {
///         chain.select(["id"]).table("users");
///     });
///     s.spawn(|| {
///         chain.and_where("id > ?", args![10_i64]);
///     });
/// });
/// assert_eq!(chain.render().unwrap().sql(), "SELECT id FROM users WHERE id > $1");
/// ```
#[derive(Debug, Default)]
pub struct SharedChain {
    inner: Mutex<ExpressionChain>,
}

impl SharedChain {
    /// Create an empty shared chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing chain.
    pub fn from_chain(chain: ExpressionChain) -> Self {
        Self {
            inner: Mutex::new(chain),
        }
    }

    /// See [`ExpressionChain::select`].
    pub fn select<I, S>(&self, columns: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = collect_columns(columns);
        self.lock().operation = Some(Operation::Select(columns));
        self
    }

    /// See [`ExpressionChain::delete`].
    pub fn delete<I, S>(&self, columns: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _ = columns;
        self.lock().operation = Some(Operation::Delete);
        self
    }

    /// See [`ExpressionChain::insert`].
    pub fn insert<I, K>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = (K, Param)>,
        K: Into<String>,
    {
        let values = collect_values(values);
        self.lock().operation = Some(Operation::Insert(values));
        self
    }

    /// See [`ExpressionChain::table`].
    pub fn table(&self, name: impl Into<String>) -> &Self {
        let name = name.into();
        self.lock().table = Some(name);
        self
    }

    /// See [`ExpressionChain::and_where`].
    pub fn and_where(&self, fragment: impl Into<String>, args: impl IntoIterator<Item = Param>) -> &Self {
        let atom = Atom::new(fragment, args);
        self.lock().predicates.push(atom);
        self
    }

    /// See [`ExpressionChain::join`].
    pub fn join(&self, fragment: impl Into<String>, args: impl IntoIterator<Item = Param>) -> &Self {
        let atom = Atom::new(fragment, args);
        self.lock().joins.push(atom);
        self
    }

    /// See [`ExpressionChain::group_by`].
    pub fn group_by(&self, expr: impl Into<String>) -> &Self {
        let expr = expr.into();
        self.lock().group_by = Some(expr);
        self
    }

    /// See [`ExpressionChain::order_by`].
    pub fn order_by(&self, expr: impl Into<String>) -> &Self {
        let expr = expr.into();
        self.lock().order_by = Some(expr);
        self
    }

    /// See [`ExpressionChain::limit`].
    pub fn limit(&self, n: u64) -> &Self {
        self.lock().limit = Some(n);
        self
    }

    /// See [`ExpressionChain::offset`].
    pub fn offset(&self, n: u64) -> &Self {
        self.lock().offset = Some(n);
        self
    }

    /// See [`ExpressionChain::tag`].
    pub fn tag(&self, tag: impl Into<String>) -> &Self {
        let tag = tag.into();
        self.lock().tag = Some(tag);
        self
    }

    /// Render under the lock. See [`ExpressionChain::render`].
    pub fn render(&self) -> ChainResult<Query> {
        self.lock().render()
    }

    /// Copy out the current state.
    pub fn snapshot(&self) -> ExpressionChain {
        self.lock().clone()
    }

    /// Take the chain back out.
    pub fn into_inner(self) -> ExpressionChain {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    impl_chain_exec!();

    // A panic in another caller cannot leave a chain half-written: every
    // mutation is a single assignment or push.
    fn lock(&self) -> MutexGuard<'_, ExpressionChain> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<ExpressionChain> for SharedChain {
    fn from(chain: ExpressionChain) -> Self {
        Self::from_chain(chain)
    }
}
