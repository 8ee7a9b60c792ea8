//! Cursor codec.
//!
//! A cursor is the position of a reference row in the ordering: its sort key,
//! with the row id breaking ties between equal keys. On the wire only the id
//! travels, as a path segment (`/api/customers/{id}/next`); the handler looks
//! the row up again and rebuilds the cursor from it.

use std::cmp::Ordering;

/// A row that can be placed in the pagination ordering.
pub trait Keyed {
    /// Display name or other sort key. Ascending order is the listing order.
    fn sort_key(&self) -> &str;
    /// Unique identifier.
    fn id(&self) -> u64;
}

/// Position of a reference row. Orders by `(sort_key, id)`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Cursor {
    key: String,
    id: u64,
}

impl Cursor {
    pub fn new(key: impl Into<String>, id: u64) -> Self {
        Self { key: key.into(), id }
    }

    pub fn of<R: Keyed>(row: &R) -> Self {
        Self::new(row.sort_key(), row.id())
    }

    pub fn key(&self) -> &str { &self.key }
    pub fn id(&self) -> u64 { self.id }

    /// Where `row` sits relative to this cursor.
    pub fn cmp_row<R: Keyed>(&self, row: &R) -> Ordering {
        (self.key.as_str(), self.id).cmp(&(row.sort_key(), row.id()))
    }

    /// The path segment that identifies this cursor in a link.
    pub fn encode(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CursorError {
    #[error("invalid id")]
    InvalidId(String),
}

/// Parses the id segment produced by [`Cursor::encode`].
///
/// Only the canonical decimal form is accepted: ASCII digits, no sign, no
/// leading zero.
pub fn decode_segment(segment: &str) -> Result<u64, CursorError> {
    let invalid = || CursorError::InvalidId(segment.to_owned());
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if !canonical {
        return Err(invalid());
    }
    segment.parse().map_err(|_| invalid())
}
