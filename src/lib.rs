//! # ferrule
//!
//! Request routing and keyset pagination for small JSON services.
//!
//! Two pieces, usable together or apart:
//!
//! - **Routing with per-route middleware.** [`Router`] keys routes by
//!   `(method, path)` and keeps an ordered middleware list for each one.
//!   Middleware can be attached to every route, every route but one, or a
//!   single route, after the routes exist. Each request gets its chain
//!   composed fresh, first-attached outermost.
//! - **Bidirectional keyset pagination.** [`pagination`] lists a sorted
//!   collection in fixed-size pages with `__next` / `__prev` links, bounded by
//!   the position of a reference row instead of an offset.
//!
//! Every response is a `{ "message": ..., "data": { ... } }` envelope.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ferrule::middleware::{auth::BearerAuth, trace::Trace};
//! use ferrule::pagination::{Keyed, LinkBase, Listing, PAGE_SIZE};
//! use ferrule::store::MemoryStore;
//! use ferrule::{Method, Router, Server};
//!
//! #[derive(Clone, serde::Serialize)]
//! struct Customer { id: u64, fullname: String }
//!
//! impl Keyed for Customer {
//!     fn sort_key(&self) -> &str { &self.fullname }
//!     fn id(&self) -> u64 { self.id }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrule::Error> {
//!     let store = Arc::new(MemoryStore::<Customer>::new());
//!     let links = LinkBase::new("http://localhost:3000", "/api/customers");
//!     let customers = Listing::new(store, links, "customers", PAGE_SIZE);
//!
//!     let mut app = Router::new();
//!     app.register(Method::Get, "/api/customers",          customers.first_page())?;
//!     app.register(Method::Get, "/api/customers/:id/next", customers.next_page())?;
//!     app.register(Method::Get, "/api/customers/:id/prev", customers.prev_page())?;
//!     app.attach_all(Trace)?;
//!     app.attach_all(BearerAuth::new(b"secret"))?;
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//! ```

mod dispatch;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod health;
pub mod middleware;
pub mod pagination;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
pub use method::Method;
pub use request::Request;
pub use response::{Envelope, IntoResponse, Response, ResponseBuilder, NOT_FOUND_MESSAGE, SERVER_ERROR_MESSAGE};
pub use router::{Resolved, RouteKey, Router};
pub use server::{Server, DEFAULT_MAX_BODY};
