//! HTTP server and graceful shutdown.
//!
//! On **SIGTERM** or **Ctrl-C** the server stops accepting, lets every
//! in-flight connection finish, and returns from [`Server::serve`].
//!
//! Each request runs as its own task on the tokio runtime. The router is
//! shared read-only behind an `Arc`; nothing else is shared between requests.
//!
//! Request bodies are buffered before routing, up to [`DEFAULT_MAX_BODY`]
//! bytes unless configured otherwise. Larger bodies are answered with `413`
//! without reaching any middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Largest request body accepted unless configured otherwise: 1 MiB.
pub const DEFAULT_MAX_BODY: usize = 1 << 20;

/// Accepts connections and feeds every request to [`Router::dispatch`].
pub struct Server {
    addr: SocketAddr,
    max_body: usize,
}

impl Server {
    /// Server that will listen on `addr` (`host:port`).
    ///
    /// # Panics
    ///
    /// On an unparsable address: a bad listen address is a startup error.
    pub fn bind(addr: &str) -> Self {
        match addr.parse() {
            Ok(addr) => Self { addr, max_body: DEFAULT_MAX_BODY },
            Err(e) => panic!("invalid socket address `{addr}`: {e}"),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self { addr: config.addr, max_body: config.max_body }
    }

    /// Caps buffered request bodies at `bytes`.
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then waits for open
    /// connections to finish.
    ///
    /// The router is frozen from here on: it is moved behind an `Arc` and
    /// only read.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);
        info!(addr = %self.addr, routes = router.len(), max_body = self.max_body, "ferrule listening");

        let mut connections = JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!(open = connections.len(), "shutting down, draining connections");
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(Arc::clone(&router), stream, peer, self.max_body));
                    }
                    Err(e) => warn!("accept failed: {e}"),
                },

                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        while connections.join_next().await.is_some() {}
        info!("ferrule stopped");
        Ok(())
    }
}

/// Drives one connection (HTTP/1.1 or HTTP/2, whichever the client speaks)
/// until the peer closes it.
async fn serve_connection(router: Arc<Router>, stream: TcpStream, peer: SocketAddr, max_body: usize) {
    let service = service_fn(move |req| {
        let router = Arc::clone(&router);
        async move { handle(&router, req, max_body).await }
    });

    let result = ConnBuilder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(stream), service)
        .await;
    if let Err(e) = result {
        debug!(%peer, "connection closed with error: {e}");
    }
}

/// Converts a hyper request, dispatches it, converts the response back.
///
/// Never fails: unknown methods get the not-found response, bodies over
/// `max_body` a 413, unreadable bodies a 400.
async fn handle<B>(
    router: &Router,
    req: hyper::Request<B>,
    max_body: usize,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();

    let Ok(method) = Method::try_from(&parts.method) else {
        return Ok(Response::not_found().into_http());
    };

    let body = match Limited::new(body, max_body).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(path = parts.uri.path(), max_body, "request body too large");
            return Ok(Response::message(StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_http());
        }
        Err(e) => {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(Response::message(StatusCode::BAD_REQUEST, "unreadable request body").into_http());
        }
    };

    let req = Request::from_parts(method, parts.uri.path().to_owned(), parts.headers, body);
    Ok(router.dispatch(req).await.into_http())
}

/// Completes on Ctrl-C, or SIGTERM on Unix. A signal that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}
