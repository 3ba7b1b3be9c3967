//! Convenient imports for typical `pgchain` usage.
//!
//! ```ignore
//! use pgchain::prelude::*;
//! ```

pub use crate::args;
pub use crate::{
    ChainError, ChainResult, ExpressionChain, FromRow, GenericClient, LocalSettings, Param, Query,
    RowExt, SharedChain, StreamingClient, query,
};
