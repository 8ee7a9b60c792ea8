//! Liveness and readiness check handlers.
//!
//! ```rust
//! use ferrule::{health, Router};
//!
//! let app = Router::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! ```
//!
//! Replace `readiness` with your own handler when the service must gate on a
//! dependency (storage connection pool, downstream API) before taking traffic.

use http::StatusCode;

use crate::{Request, Response};

/// Always `200` with `{"message":"ok","data":{}}`.
pub async fn liveness(_req: Request) -> Response {
    Response::message(StatusCode::OK, "ok")
}

/// Always `200` with `{"message":"ready","data":{}}`.
pub async fn readiness(_req: Request) -> Response {
    Response::message(StatusCode::OK, "ready")
}
