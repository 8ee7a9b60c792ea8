//! Request dispatch.

use std::sync::Arc;

use tracing::debug;

use crate::middleware;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

impl Router {
    /// Routes one request and produces one response.
    ///
    /// Unresolved requests get [`Response::not_found`]. Otherwise the route's
    /// middleware is composed around its handler, fresh for this request, and
    /// the composed handler answers. Dispatch itself never edits the response.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let (handler, params) = match self.resolve(req.method(), req.path()) {
            Some(route) => (
                middleware::chain(Arc::clone(route.handler), route.middleware),
                route.params,
            ),
            None => {
                debug!(method = %req.method(), path = req.path(), "no route");
                return Response::not_found();
            }
        };
        req.params = params;
        handler.call(req).await
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::method::Method;
    use crate::response::NOT_FOUND_MESSAGE;

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or("-").to_owned())
    }

    #[tokio::test]
    async fn params_reach_the_handler() {
        let router = Router::new().get("/customers/:id", echo_id);
        let res = router.dispatch(Request::new(Method::Get, "/customers/7")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"7");
    }

    #[tokio::test]
    async fn unknown_path_and_wrong_method_share_not_found() {
        let router = Router::new().get("/customers/:id", echo_id);
        for req in [
            Request::new(Method::Get, "/nope"),
            Request::new(Method::Delete, "/customers/7"),
        ] {
            let res = router.dispatch(req).await;
            assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
            assert_eq!(res.to_envelope().unwrap().message, NOT_FOUND_MESSAGE);
        }
    }

    #[tokio::test]
    async fn layer_wraps_every_chained_route() {
        let stamp = crate::middleware::from_fn(|req, next: crate::middleware::Next| async move {
            let mut res = next.run(req).await;
            res.push_header("x-layer", "1");
            res
        });
        let router = Router::new()
            .put("/customers/:id", |_req: Request| async { Response::json(br#"{"updated":true}"#.to_vec()) })
            .delete("/customers/:id", |_req: Request| async { StatusCode::NO_CONTENT })
            .layer(stamp);

        let put = router.dispatch(Request::new(Method::Put, "/customers/7")).await;
        assert_eq!(put.status_code(), StatusCode::OK);
        assert_eq!(put.header("content-type"), Some("application/json; charset=utf-8"));
        assert_eq!(put.body(), br#"{"updated":true}"#);
        assert_eq!(put.header("x-layer"), Some("1"));

        let delete = router.dispatch(Request::new(Method::Delete, "/customers/7")).await;
        assert_eq!(delete.status_code(), StatusCode::NO_CONTENT);
        assert_eq!(delete.header("x-layer"), Some("1"));
    }
}
