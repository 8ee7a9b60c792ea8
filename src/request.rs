//! Incoming HTTP request type.
//!
//! Besides the usual method/path/headers/body, every request carries a typed
//! context map. Middleware that derives something from the request (decoded
//! auth claims, a request id, ...) stores it there and downstream handlers
//! read it back by type:
//!
//! ```rust
//! use ferrule::{Method, Request};
//!
//! #[derive(Clone)]
//! struct RequestId(u64);
//!
//! let mut req = Request::new(Method::Get, "/");
//! req.insert_context(RequestId(7));
//! assert_eq!(req.context::<RequestId>().unwrap().0, 7);
//! ```

use std::any::type_name;
use std::collections::HashMap;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Extensions;

use crate::error::Error;
use crate::method::Method;

/// An incoming HTTP request.
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
    context: Extensions,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    ///
    /// The server builds requests from the wire; this constructor exists for
    /// driving [`Router::dispatch`](crate::Router::dispatch) directly.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            context: Extensions::new(),
        }
    }

    pub(crate) fn from_parts(method: Method, path: String, headers: HeaderMap, body: Bytes) -> Self {
        Self { headers, body, ..Self::new(method, path) }
    }

    /// Adds a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/customers/:id`, `req.param("id")` on `/customers/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Stores a request-scoped value, replacing any previous value of the same type.
    pub fn insert_context<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.context.insert(value);
    }

    /// Looks up a request-scoped value by type.
    ///
    /// Fails with [`Error::MissingContext`] when no middleware stored one, so a
    /// handler mounted without its middleware errors instead of running
    /// unauthenticated.
    pub fn context<T: Send + Sync + 'static>(&self) -> Result<&T, Error> {
        self.context.get::<T>().ok_or(Error::MissingContext(type_name::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Tag(&'static str);

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(Method::Get, "/").with_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn context_lookup_fails_loudly_when_absent() {
        let mut req = Request::new(Method::Get, "/");
        assert!(matches!(req.context::<Tag>(), Err(Error::MissingContext(_))));

        req.insert_context(Tag("a"));
        req.insert_context(Tag("b"));
        assert_eq!(req.context::<Tag>().unwrap(), &Tag("b"));
    }
}
