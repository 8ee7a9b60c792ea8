//! Terminal handlers and their type-erased form.
//!
//! Route handlers are plain async functions `Request -> impl IntoResponse`.
//! The registry stores them next to each other and middleware has to wrap any
//! of them, so both go through the same trait object, [`ErasedHandler`],
//! behind an `Arc`:
//!
//! ```text
//! async fn list(req: Request) -> Response       written by the user
//!   → router.register(Method::Get, "/c", list)   Handler::into_boxed_handler
//!   → Arc<Terminal<list>>                        stored in the route table
//!   → middleware::chain(handler, &route_layers)  per request, one Arc per layer
//!   → handler.call(req).await                    one virtual call per layer
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// Boxed future resolving to a [`Response`]; `Send` so requests can move
/// between runtime worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe request handler.
///
/// Route handlers get it through [`Handler`]. Middleware implements it on the
/// handler returned from [`Middleware::wrap`](crate::middleware::Middleware::wrap)
/// and continues the chain with `next.call(req)`.
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// Shared, type-erased handler.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Anything that can be registered as a route's terminal handler.
///
/// Implemented for every `Fn(Request) -> impl Future<Output = impl IntoResponse>`
/// that can be shared across threads, which covers `async fn` items and
/// closures returning `async move` blocks.
pub trait Handler: Send + Sync + 'static {
    fn into_boxed_handler(self) -> BoxedHandler;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Terminal(self))
    }
}

struct Terminal<F>(F);

impl<F, Fut> ErasedHandler for Terminal<F>
where
    F: Fn(Request) -> Fut,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture {
        let pending = (self.0)(req);
        Box::pin(async move { pending.await.into_response() })
    }
}
