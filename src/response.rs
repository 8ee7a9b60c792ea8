//! Outgoing HTTP response type, the JSON envelope, and the [`IntoResponse`]
//! conversion trait.
//!
//! Every JSON response this crate produces has the same shape:
//!
//! ```json
//! { "message": "success retrieving customers data", "data": { ... } }
//! ```
//!
//! Build it with [`Response::envelope`] or [`Response::message`].

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message used when a handler fails for reasons the client cannot fix.
pub const SERVER_ERROR_MESSAGE: &str = "an error occurred on the service provider side";

/// Message of the fixed not-found response.
pub const NOT_FOUND_MESSAGE: &str = "the resource you are looking for was not found";

const JSON: &str = "application/json; charset=utf-8";

// ── Envelope ─────────────────────────────────────────────────────────────────

/// The `{message, data}` body shared by every JSON response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Envelope {
    pub message: String,
    pub data: Map<String, Value>,
}

impl Envelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), data: Map::new() }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use ferrule::{Envelope, Response};
/// use http::StatusCode;
///
/// Response::message(StatusCode::BAD_REQUEST, "invalid id");
/// Response::envelope(StatusCode::OK, &Envelope::new("ok").with("id", 42));
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/customers/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` with a raw JSON body.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with a `text/plain; charset=utf-8` body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Serialises `envelope` as the JSON body.
    pub fn envelope(code: StatusCode, envelope: &Envelope) -> Self {
        match serde_json::to_vec(envelope) {
            Ok(body) => Self::builder().status(code).json(body),
            Err(_) => Self::status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Envelope with `message` and an empty `data` object.
    pub fn message(code: StatusCode, message: impl Into<String>) -> Self {
        Self::envelope(code, &Envelope::new(message))
    }

    /// The fixed `404` returned for every unresolved route.
    pub fn not_found() -> Self {
        Self::message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    /// Generic `500` envelope.
    pub fn server_error() -> Self {
        Self::message(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Appends a header. Middleware uses this on the way out.
    pub fn push_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Parses the body back into an [`Envelope`].
    pub fn to_envelope(&self) -> Option<Envelope> {
        serde_json::from_slice(&self.body).ok()
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| {
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body.
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(JSON, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes())
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a bare status from a handler: `return StatusCode::NO_CONTENT`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// `200 OK` envelope.
impl IntoResponse for Envelope {
    fn into_response(self) -> Response { Response::envelope(StatusCode::OK, &self) }
}
