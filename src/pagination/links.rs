//! Link builder.

use std::num::NonZeroUsize;

use serde_json::{Map, Value};

use super::cursor::{Cursor, Keyed};
use super::Direction;

/// One page of rows and the cursors for its neighbours.
#[derive(Debug, PartialEq)]
pub struct Window<R> {
    pub rows: Vec<R>,
    pub prev: Option<Cursor>,
    pub next: Option<Cursor>,
}

/// Trims an overshoot fetch to `page_size` rows and picks the navigation
/// cursors.
///
/// * `Initial` / `Forward` with an overshoot: `next` is the last row kept, the
///   overshoot row is dropped from the back. `Forward` also gets `prev`, the
///   first row of the page, so stepping back shows no overlap.
/// * `Backward` with an overshoot: the overshoot sits at the front; it is
///   dropped and `prev` is the first row kept.
/// * `Backward` always gets `next` when any row is left, overshoot or not.
///   Forward pages only get `next` on overshoot.
/// * No rows: empty page, no cursors.
pub fn build_links<R: Keyed>(mut rows: Vec<R>, direction: Direction, page_size: NonZeroUsize) -> Window<R> {
    let page_size = page_size.get();
    let overshoot = rows.len() > page_size;
    let mut prev = None;
    let mut next = None;

    match direction {
        Direction::Initial | Direction::Forward => {
            if overshoot {
                next = Some(Cursor::of(&rows[page_size - 1]));
                if direction == Direction::Forward {
                    prev = Some(Cursor::of(&rows[0]));
                }
                rows.truncate(page_size);
            }
        }
        Direction::Backward => {
            if overshoot {
                prev = Some(Cursor::of(&rows[1]));
                rows.truncate(page_size + 1);
                rows.remove(0);
            }
            next = rows.last().map(Cursor::of);
        }
    }

    Window { rows, prev, next }
}

/// Renders cursors as absolute links into a collection.
///
/// `LinkBase::new("http://localhost:3000", "/api/customers")` produces
/// `http://localhost:3000/api/customers/{id}/next` and `.../{id}/prev`.
#[derive(Clone, Debug)]
pub struct LinkBase {
    prefix: String,
}

impl LinkBase {
    pub fn new(base_url: &str, collection: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let collection = collection.trim_end_matches('/');
        Self { prefix: format!("{base}{collection}") }
    }

    pub fn next_url(&self, cursor: &Cursor) -> String {
        format!("{}/{}/next", self.prefix, cursor.encode())
    }

    pub fn prev_url(&self, cursor: &Cursor) -> String {
        format!("{}/{}/prev", self.prefix, cursor.encode())
    }
}

impl<R> Window<R> {
    /// `__next` / `__prev` entries for the response `data` object.
    pub fn link_fields(&self, base: &LinkBase) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(next) = &self.next {
            fields.insert("__next".to_owned(), Value::String(base.next_url(next)));
        }
        if let Some(prev) = &self.prev {
            fields.insert("__prev".to_owned(), Value::String(base.prev_url(prev)));
        }
        fields
    }
}
