//! JSON request bodies: a content-type guard and a typed decoder.
//!
//! [`ValidateJson<T>`] decodes the body into `T` and stores it in the request
//! context, so the handler reads `req.context::<T>()` instead of parsing the
//! body again. A body that does not decode is answered with `400`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;

/// Rejects requests whose `Content-Type` is not `application/json` with `415`.
///
/// Parameters such as `; charset=utf-8` are accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireJson;

impl Middleware for RequireJson {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(RequireJsonHandler { next })
    }
}

struct RequireJsonHandler {
    next: BoxedHandler,
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

impl ErasedHandler for RequireJsonHandler {
    fn call(&self, req: Request) -> BoxFuture {
        if is_json(req.header("content-type")) {
            return self.next.call(req);
        }
        Box::pin(async {
            Response::message(StatusCode::UNSUPPORTED_MEDIA_TYPE, "content type must be application/json")
        })
    }
}

/// Decodes the body as JSON into `T` and inserts it into the request context.
pub struct ValidateJson<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> ValidateJson<T> {
    pub fn new() -> Self {
        Self { _target: PhantomData }
    }
}

impl<T> Default for ValidateJson<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ValidateJson<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidateJson<{}>", std::any::type_name::<T>())
    }
}

impl<T> Middleware for ValidateJson<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(ValidateJsonHandler::<T> { next, _target: PhantomData })
    }
}

struct ValidateJsonHandler<T> {
    next: BoxedHandler,
    _target: PhantomData<fn() -> T>,
}

impl<T> ErasedHandler for ValidateJsonHandler<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn call(&self, mut req: Request) -> BoxFuture {
        match serde_json::from_slice::<T>(req.body()) {
            Ok(value) => {
                req.insert_context(value);
                self.next.call(req)
            }
            Err(e) => {
                debug!(path = req.path(), "rejected request body: {e}");
                Box::pin(async { Response::message(StatusCode::BAD_REQUEST, "invalid request body") })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::handler::Handler;
    use crate::method::Method;
    use crate::middleware::{chain, BoxedMiddleware};

    #[derive(Clone, Debug, Deserialize, PartialEq)]
    struct NewCustomer {
        fullname: String,
    }

    fn create() -> BoxedHandler {
        let terminal = (|req: Request| async move {
            match req.context::<NewCustomer>() {
                Ok(customer) => Response::text(customer.fullname.clone()),
                Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
            }
        })
        .into_boxed_handler();
        let validate: BoxedMiddleware = Arc::new(ValidateJson::<NewCustomer>::new());
        chain(terminal, &[validate])
    }

    fn post(body: &'static str) -> Request {
        Request::new(Method::Post, "/api/customers").with_body(body)
    }

    #[tokio::test]
    async fn decoded_body_lands_in_context() {
        let res = create().call(post(r#"{"fullname":"Grace Hopper"}"#)).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"Grace Hopper");
    }

    #[tokio::test]
    async fn undecodable_body_is_bad_request() {
        for body in ["", "not json", r#"{"name":"Grace"}"#, r#"{"fullname":7}"#] {
            let res = create().call(post(body)).await;
            assert_eq!(res.status_code(), StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(res.to_envelope().unwrap().message, "invalid request body");
        }
    }

    #[test]
    fn accepts_json_with_parameters() {
        assert!(is_json(Some("application/json")));
        assert!(is_json(Some("Application/JSON; charset=utf-8")));
        assert!(!is_json(Some("text/plain")));
        assert!(!is_json(Some("application/jsonl")));
        assert!(!is_json(None));
    }
}
