//! Bearer-token authentication.
//!
//! [`BearerAuth`] expects `Authorization: Bearer <jwt>` signed with HS256.
//! On success the decoded [`Claims`] are stored in the request context and
//! read downstream with `req.context::<Claims>()`. On failure the middleware
//! answers itself and the rest of the chain never runs:
//!
//! | Failure | Status |
//! |---|---|
//! | header missing or not `Bearer <token>` | 400 |
//! | token malformed | 400 |
//! | bad signature or expired | 401 |

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;

/// Lifetime of tokens issued by [`issue_token`] unless told otherwise.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Claims carried by the tokens this crate issues and accepts.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Claims {
    pub email: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Signs an HS256 token for `email`, valid for `ttl`.
pub fn issue_token(email: &str, secret: &[u8], ttl: Duration) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        email: email.to_owned(),
        exp: jsonwebtoken::get_current_timestamp() + ttl.as_secs(),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret))
}

#[derive(Debug, PartialEq)]
enum Rejection {
    MissingHeader,
    MalformedHeader,
    BadToken(String),
    Unauthorized,
}

impl Rejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingHeader => Response::message(StatusCode::BAD_REQUEST, "authorization header not found"),
            Self::MalformedHeader => Response::message(StatusCode::BAD_REQUEST, "invalid authorization header"),
            Self::BadToken(reason) => Response::message(StatusCode::BAD_REQUEST, reason),
            Self::Unauthorized => Response::message(StatusCode::UNAUTHORIZED, "invalid jwt"),
        }
    }
}

/// Extracts the token from an `Authorization` header value.
fn bearer_token(value: Option<&str>) -> Result<&str, Rejection> {
    let value = value.filter(|v| !v.is_empty()).ok_or(Rejection::MissingHeader)?;
    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(Rejection::MalformedHeader),
    }
}

struct Keys {
    decoding: DecodingKey,
    validation: Validation,
}

impl Keys {
    fn verify(&self, req: &Request) -> Result<Claims, Rejection> {
        let token = bearer_token(req.header("authorization"))?;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature | ErrorKind::InvalidSignature => Rejection::Unauthorized,
                _ => Rejection::BadToken(e.to_string()),
            })
    }
}

/// HS256 bearer-token middleware.
pub struct BearerAuth {
    keys: Arc<Keys>,
}

impl BearerAuth {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        Self {
            keys: Arc::new(Keys { decoding: DecodingKey::from_secret(secret), validation }),
        }
    }
}

impl Middleware for BearerAuth {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(AuthHandler { keys: Arc::clone(&self.keys), next })
    }
}

struct AuthHandler {
    keys: Arc<Keys>,
    next: BoxedHandler,
}

impl ErasedHandler for AuthHandler {
    fn call(&self, mut req: Request) -> BoxFuture {
        match self.keys.verify(&req) {
            Ok(claims) => {
                req.insert_context(claims);
                self.next.call(req)
            }
            Err(rejection) => {
                debug!(path = req.path(), ?rejection, "request rejected by auth");
                let res = rejection.into_response();
                Box::pin(async move { res })
            }
        }
    }
}
