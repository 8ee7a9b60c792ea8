//! Per-request tracing span.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, Instrument};

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::middleware::Middleware;
use crate::request::Request;

/// Opens a `request` span carrying method and path, and logs status and
/// latency once the inner chain has answered.
///
/// Attach it first so it is the outermost layer and times everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(TraceHandler { next })
    }
}

struct TraceHandler {
    next: BoxedHandler,
}

impl ErasedHandler for TraceHandler {
    fn call(&self, req: Request) -> BoxFuture {
        let span = info_span!("request", method = %req.method(), path = req.path());
        let fut = span.in_scope(|| self.next.call(req));
        Box::pin(
            async move {
                let started = Instant::now();
                let res = fut.await;
                info!(
                    status = res.status_code().as_u16(),
                    latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "request finished",
                );
                res
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::handler::Handler;
    use crate::method::Method;
    use crate::middleware::{chain, BoxedMiddleware};
    use crate::response::Response;

    #[tokio::test]
    async fn response_passes_through_unchanged() {
        let terminal = (|_req: Request| async {
            Response::builder()
                .status(StatusCode::CREATED)
                .header("location", "/api/customers/7")
                .text("created")
        })
        .into_boxed_handler();
        let trace: BoxedMiddleware = Arc::new(Trace);

        let res = chain(terminal, &[trace]).call(Request::new(Method::Post, "/api/customers")).await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.header("location"), Some("/api/customers/7"));
        assert_eq!(res.body(), b"created");
    }
}
