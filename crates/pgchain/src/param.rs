//! Bound argument storage.

use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound argument.
///
/// Values are shared through an `Arc`, so cloning a chain or a rendered
/// [`Query`](crate::Query) never copies the underlying data.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Wrap any `ToSql` value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Borrow the value in the shape `tokio-postgres` expects.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

/// Formats as the wrapped value, so `[1, "x"]` reads the same as the values
/// that were bound.
impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Collects rendered arguments and hands out their 1-based positions.
#[derive(Clone, Debug, Default)]
pub(crate) struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    pub(crate) fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub(crate) fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    pub(crate) fn into_vec(self) -> Vec<Param> {
        self.params
    }
}

/// Build a `Vec<Param>` from heterogeneous values.
///
/// ```
/// use pgchain::args;
///
/// let params = args![1_i32, "pajarito", 2.5_f64];
/// assert_eq!(params.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Param::new($value)),+]
    };
}
