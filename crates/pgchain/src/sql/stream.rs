use crate::client::RowStream;
use crate::error::{ChainError, ChainResult};
use crate::row::FromRow;
use futures_core::Stream;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Rows from a [`RowStream`] mapped to `T` one at a time.
///
/// Driver errors pass through untouched. A [`ChainError::Decode`] raised by
/// `T::from_row` is prefixed with the 0-based position of the row that failed,
/// since a streamed result has no other way to point back at it.
#[must_use]
pub struct FromRowStream<T> {
    rows: RowStream,
    position: usize,
    _target: PhantomData<fn() -> T>,
}

impl<T> FromRowStream<T> {
    pub(crate) fn new(rows: RowStream) -> Self {
        Self {
            rows,
            position: 0,
            _target: PhantomData,
        }
    }

    /// Number of rows pulled from the connection so far.
    pub fn rows_seen(&self) -> usize {
        self.position
    }
}

pub(crate) fn at_row(err: ChainError, position: usize) -> ChainError {
    match err {
        ChainError::Decode { column, message } => ChainError::Decode {
            column,
            message: format!("row {position}: {message}"),
        },
        other => other,
    }
}

impl<T: FromRow> Stream for FromRowStream<T> {
    type Item = ChainResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let next = match Pin::new(&mut self.rows).poll_next(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(next) => next,
        };
        let Some(row) = next else {
            return Poll::Ready(None);
        };

        let position = self.position;
        self.position += 1;
        Poll::Ready(Some(
            row.and_then(|row| T::from_row(&row).map_err(|e| at_row(e, position))),
        ))
    }
}
