//! Unified error type.

use crate::method::Method;

/// The error type returned by ferrule's fallible operations.
///
/// Application-level failures (404, 415, 500, ...) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// route-table misconfiguration, infrastructure failures (binding a port,
/// accepting a connection) and missing request context.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("route `{method} {path}` is already registered")]
    DuplicateRoute { method: Method, path: String },

    #[error("no routes registered; register every route before attaching middleware")]
    NoRoutes,

    #[error("route `{method} {path}` is not registered")]
    UnknownRoute { method: Method, path: String },

    #[error("invalid route `{path}`: {reason}")]
    InvalidTemplate { path: String, reason: &'static str },

    #[error("invalid route `{path}`: {source}")]
    InvalidRoute {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("request context has no `{0}`")]
    MissingContext(&'static str),
}
