//! Page fetcher and the storage collaborator it drives.

use std::num::NonZeroUsize;

use async_trait::async_trait;

use super::cursor::{Cursor, Keyed};
use super::Direction;

/// Which side of a bound a range query scans.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scan {
    /// Rows strictly after the bound, ascending.
    Above,
    /// Rows strictly before the bound, descending (nearest first).
    Below,
}

/// Storage collaborator for a sorted collection.
///
/// Orderings are by `(sort_key, id)`. Implementations own their connection
/// handling; the fetcher never retries and passes errors through unchanged.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Row: Keyed + Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// The first `limit` rows, ascending.
    async fn query_first(&self, limit: usize) -> Result<Vec<Self::Row>, Self::Error>;

    /// Up to `limit` rows on the `scan` side of `bound`, in the order
    /// [`Scan`] documents.
    async fn query_range(&self, bound: &Cursor, scan: Scan, limit: usize) -> Result<Vec<Self::Row>, Self::Error>;

    /// Looks a row up by id.
    async fn find(&self, id: u64) -> Result<Option<Self::Row>, Self::Error>;
}

/// Where a page request starts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Position {
    Initial,
    After(Cursor),
    Before(Cursor),
}

impl Position {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Initial => Direction::Initial,
            Self::After(_) => Direction::Forward,
            Self::Before(_) => Direction::Backward,
        }
    }
}

/// Fetches one overshoot page: up to `page_size + 1` rows, always returned in
/// ascending order.
///
/// Backward pages are read descending from the cursor so the limit keeps the
/// rows *nearest* to it, then put back in ascending order.
pub async fn fetch_page<S: Store>(
    store: &S,
    position: &Position,
    page_size: NonZeroUsize,
) -> Result<Vec<S::Row>, S::Error> {
    let limit = page_size.get().saturating_add(1);
    let mut rows = match position {
        Position::Initial => store.query_first(limit).await?,
        Position::After(cursor) => store.query_range(cursor, Scan::Above, limit).await?,
        Position::Before(cursor) => store.query_range(cursor, Scan::Below, limit).await?,
    };
    rows.truncate(limit);
    if matches!(position, Position::Before(_)) {
        rows.sort_by(|a, b| (a.sort_key(), a.id()).cmp(&(b.sort_key(), b.id())));
    }
    Ok(rows)
}
