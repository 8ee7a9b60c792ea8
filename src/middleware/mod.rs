//! Middleware layer.
//!
//! A middleware is a transformation from "next handler" to "handler". It may
//! act on the request before calling `next`, act on the response after, or
//! answer on its own and never call `next` at all (auth rejection, body
//! validation).
//!
//! Middleware is attached per route in the [`Router`](crate::Router). At
//! request time the route's list is folded around the terminal handler by
//! [`chain`]: the first attached middleware ends up outermost, so it sees the
//! request first and the response last.
//!
//! Built-in middleware:
//! - [`auth::BearerAuth`]: verifies a `Bearer` JWT and stores its [`auth::Claims`] in the request context
//! - [`json::RequireJson`]: rejects bodies that are not `application/json`
//! - [`json::ValidateJson`]: decodes the JSON body into a typed value in the request context
//! - [`trace::Trace`]: per-request span with method, path, status, latency
//!
//! Ad-hoc middleware is easiest to write with [`from_fn`]:
//!
//! ```rust
//! use ferrule::middleware::{self, Next};
//! use ferrule::{Request, Response};
//!
//! let stamp = middleware::from_fn(|req: Request, next: Next| async move {
//!     let mut res = next.run(req).await;
//!     res.push_header("x-served-by", "ferrule");
//!     res
//! });
//! ```

pub mod auth;
pub mod json;
pub mod trace;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

/// The middleware capability: wrap the next handler, return a new one.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// A middleware shared by every route it is attached to.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Composes `middleware` around `terminal`.
///
/// Folds from the last element to the first, so `middleware[0]` is the
/// outermost layer. Pure: the result depends only on the inputs, and building
/// it cannot fail.
pub fn chain(terminal: BoxedHandler, middleware: &[BoxedMiddleware]) -> BoxedHandler {
    middleware.iter().rev().fold(terminal, |next, m| m.wrap(next))
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// The remainder of the chain, handed to [`from_fn`] middleware.
pub struct Next(BoxedHandler);

impl Next {
    pub async fn run(self, req: Request) -> Response {
        self.0.call(req).await
    }
}

/// Middleware built from an async closure `(Request, Next) -> Response`.
pub struct FromFn<F>(Arc<F>);

/// Turns an async closure into [`Middleware`]. See the [module docs](self).
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(Arc::new(f))
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(FromFnHandler { f: Arc::clone(&self.0), next })
    }
}

struct FromFnHandler<F> {
    f: Arc<F>,
    next: BoxedHandler,
}

impl<F, Fut> ErasedHandler for FromFnHandler<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin((self.f)(req, Next(Arc::clone(&self.next))))
    }
}
