//! List endpoints over a [`Store`].

use std::num::NonZeroUsize;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use tracing::error;

use super::cursor::{decode_segment, Cursor};
use super::fetch::{fetch_page, Position, Store};
use super::links::{build_links, LinkBase};
use super::Direction;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::{Envelope, Response};

/// Serves one collection as paged JSON.
///
/// Produces three handlers, meant for these routes:
///
/// | Handler | Route |
/// |---|---|
/// | [`first_page`](Self::first_page) | `GET /api/customers` |
/// | [`next_page`](Self::next_page) | `GET /api/customers/:id/next` |
/// | [`prev_page`](Self::prev_page) | `GET /api/customers/:id/prev` |
///
/// The `:id` parameter names the reference row. Responses carry the rows under
/// `data.<field>`, plus `data.__next` / `data.__prev` when there is more to see.
pub struct Listing<S> {
    store: Arc<S>,
    links: LinkBase,
    field: String,
    page_size: NonZeroUsize,
}

impl<S: Store> Listing<S>
where
    S::Row: Serialize,
{
    pub fn new(store: Arc<S>, links: LinkBase, field: impl Into<String>, page_size: NonZeroUsize) -> Arc<Self> {
        Arc::new(Self { store, links, field: field.into(), page_size })
    }

    pub fn first_page(self: &Arc<Self>) -> impl Handler + use<S> {
        self.handler(Direction::Initial)
    }

    pub fn next_page(self: &Arc<Self>) -> impl Handler + use<S> {
        self.handler(Direction::Forward)
    }

    pub fn prev_page(self: &Arc<Self>) -> impl Handler + use<S> {
        self.handler(Direction::Backward)
    }

    fn handler(self: &Arc<Self>, direction: Direction) -> impl Handler + use<S> {
        let listing = Arc::clone(self);
        move |req: Request| {
            let listing = Arc::clone(&listing);
            async move { listing.respond(&req, direction).await }
        }
    }

    /// Answers one list request moving in `direction`.
    pub async fn respond(&self, req: &Request, direction: Direction) -> Response {
        let position = match direction {
            Direction::Initial => Position::Initial,
            Direction::Forward | Direction::Backward => {
                let cursor = match self.reference(req).await {
                    Ok(cursor) => cursor,
                    Err(res) => return res,
                };
                if direction == Direction::Forward {
                    Position::After(cursor)
                } else {
                    Position::Before(cursor)
                }
            }
        };

        let rows = match fetch_page(self.store.as_ref(), &position, self.page_size).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(?position, "page fetch failed: {e}");
                return Response::server_error();
            }
        };

        let window = build_links(rows, direction, self.page_size);
        let rows = match serde_json::to_value(&window.rows) {
            Ok(rows) => rows,
            Err(e) => {
                error!("failed to serialise {}: {e}", self.field);
                return Response::server_error();
            }
        };

        let mut envelope = Envelope::new(format!("success retrieving {} data", self.field));
        envelope.data = window.link_fields(&self.links);
        envelope.data.insert(self.field.clone(), rows);
        Response::envelope(StatusCode::OK, &envelope)
    }

    /// Cursor of the row named by the `id` path parameter.
    async fn reference(&self, req: &Request) -> Result<Cursor, Response> {
        let Some(Ok(id)) = req.param("id").map(decode_segment) else {
            return Err(Response::message(StatusCode::BAD_REQUEST, "invalid id"));
        };

        match self.store.find(id).await {
            Ok(Some(row)) => Ok(Cursor::of(&row)),
            Ok(None) => Err(Response::message(StatusCode::NOT_FOUND, "Not Found")),
            Err(e) => {
                error!(id, "reference row lookup failed: {e}");
                Err(Response::server_error())
            }
        }
    }
}
