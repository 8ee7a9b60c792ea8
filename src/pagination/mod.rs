//! Bidirectional keyset pagination.
//!
//! A collection sorted by a string key is listed `page_size` rows at a time.
//! Each query is bounded by the position of a reference row instead of a
//! numeric offset:
//!
//! 1. [`fetch_page`] asks the [`Store`] for `page_size + 1` rows on one side
//!    of the cursor. The extra *overshoot* row only signals that more data
//!    exists in that direction.
//! 2. [`build_links`] trims the overshoot and decides which of the `next` /
//!    `prev` cursors to emit.
//! 3. [`Listing`] turns the result into the JSON envelope, rendering the
//!    cursors as absolute `__next` / `__prev` URLs.
//!
//! Cursors are recomputed on every request, so rows inserted or deleted
//! between two page fetches can be skipped or repeated. That is inherent to
//! keyset pagination.

use std::num::NonZeroUsize;

mod cursor;
mod fetch;
mod links;
mod listing;

pub use cursor::{decode_segment, Cursor, CursorError, Keyed};
pub use fetch::{fetch_page, Position, Scan, Store};
pub use links::{build_links, LinkBase, Window};
pub use listing::Listing;

/// Rows per page unless configured otherwise.
pub const PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Which way a page request moves through the ordering.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// First page, no cursor.
    Initial,
    /// Rows after the cursor.
    Forward,
    /// Rows before the cursor.
    Backward,
}
