//! Route registry.
//!
//! Every route is keyed by `(method, path template)` and owns a terminal
//! handler plus an ordered middleware list. Lookup goes through one radix tree
//! per method (O(path-length) via [`matchit`]); the tree stores an index into
//! the route table, so middleware attached after registration is seen without
//! touching the trees.
//!
//! Build order matters: register every route, then attach middleware. The
//! bulk attachment calls act on the routes registered *so far* and refuse to
//! run on an empty table. Once the router is handed to
//! [`Server::serve`](crate::Server::serve) it is shared immutably.
//!
//! ```rust
//! use ferrule::middleware::{auth::BearerAuth, trace::Trace};
//! use ferrule::{Method, Request, Response, Router};
//!
//! # async fn list(_: Request) -> Response { Response::text("") }
//! # async fn token(_: Request) -> Response { Response::text("") }
//! let mut router = Router::new();
//! router.register(Method::Get,  "/api/customers",   list)?;
//! router.register(Method::Post, "/api/auth/token",  token)?;
//! router.attach_all(Trace)?;
//! router.attach_all_except(BearerAuth::new(b"secret"), (Method::Post, "/api/auth/token"))?;
//! # Ok::<(), ferrule::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Middleware};

/// Identity of a route: method plus path template exactly as registered.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into() }
    }
}

impl From<(Method, &str)> for RouteKey {
    fn from((method, path): (Method, &str)) -> Self {
        Self::new(method, path)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

struct Route {
    key: RouteKey,
    handler: BoxedHandler,
    middleware: Vec<BoxedMiddleware>,
}

/// A route matched against a concrete request path.
pub struct Resolved<'r> {
    pub key: &'r RouteKey,
    pub handler: &'r BoxedHandler,
    pub middleware: &'r [BoxedMiddleware],
    pub params: HashMap<String, String>,
}

/// The application router.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    index: HashMap<RouteKey, usize>,
    trees: HashMap<Method, MatchitRouter<usize>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under `(method, path)` with an empty middleware list.
    ///
    /// Path templates are literal segments plus named parameters written
    /// `:name`, at most one parameter per segment:
    /// `/api/customers/:id/next`.
    pub fn register(&mut self, method: Method, path: &str, handler: impl Handler) -> Result<(), Error> {
        let key = RouteKey::new(method, path);
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateRoute { method, path: path.to_owned() });
        }

        let pattern = matchit_pattern(path)?;
        let slot = self.routes.len();
        self.trees
            .entry(method)
            .or_default()
            .insert(pattern, slot)
            .map_err(|source| Error::InvalidRoute { path: path.to_owned(), source })?;

        debug!(route = %key, "route registered");
        self.index.insert(key.clone(), slot);
        self.routes.push(Route { key, handler: handler.into_boxed_handler(), middleware: Vec::new() });
        Ok(())
    }

    /// Appends `middleware` to every registered route.
    pub fn attach_all(&mut self, middleware: impl Middleware) -> Result<(), Error> {
        self.attach_where(Arc::new(middleware), |_| true)
    }

    /// Appends `middleware` to every registered route except `excluded`.
    pub fn attach_all_except(
        &mut self,
        middleware: impl Middleware,
        excluded: impl Into<RouteKey>,
    ) -> Result<(), Error> {
        let excluded = self.slot(excluded.into())?;
        self.attach_where(Arc::new(middleware), |slot| slot != excluded)
    }

    /// Appends `middleware` to the single route `target`.
    pub fn attach_only(&mut self, middleware: impl Middleware, target: impl Into<RouteKey>) -> Result<(), Error> {
        let target = self.slot(target.into())?;
        self.routes[target].middleware.push(Arc::new(middleware));
        Ok(())
    }

    fn attach_where(&mut self, middleware: BoxedMiddleware, include: impl Fn(usize) -> bool) -> Result<(), Error> {
        if self.routes.is_empty() {
            return Err(Error::NoRoutes);
        }
        for (slot, route) in self.routes.iter_mut().enumerate() {
            if include(slot) {
                route.middleware.push(Arc::clone(&middleware));
            }
        }
        Ok(())
    }

    fn slot(&self, key: RouteKey) -> Result<usize, Error> {
        if self.routes.is_empty() {
            return Err(Error::NoRoutes);
        }
        self.index
            .get(&key)
            .copied()
            .ok_or(Error::UnknownRoute { method: key.method, path: key.path })
    }

    /// Finds the route for a concrete request path and extracts its parameters.
    ///
    /// A known path requested with an unregistered method is a miss, same as
    /// an unknown path.
    pub fn resolve(&self, method: Method, path: &str) -> Option<Resolved<'_>> {
        let matched = self.trees.get(&method)?.at(path).ok()?;
        let route = &self.routes[*matched.value];
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some(Resolved {
            key: &route.key,
            handler: &route.handler,
            middleware: &route.middleware,
            params,
        })
    }

    /// Registered route keys, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteKey> {
        self.routes.iter().map(|r| &r.key)
    }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }

    // ── Chaining helpers ──────────────────────────────────────────────────────
    //
    // Startup-only conveniences: a bad route table is a programming error, so
    // these panic instead of returning `Error`.

    /// Chainable [`register`](Self::register). Panics on a configuration error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        if let Err(e) = self.register(method, path, handler) {
            panic!("{e}");
        }
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Get, path, handler) }
    pub fn post(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Post, path, handler) }
    pub fn put(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Put, path, handler) }
    pub fn delete(self, path: &str, handler: impl Handler) -> Self { self.on(Method::Delete, path, handler) }

    /// Chainable [`attach_all`](Self::attach_all). Panics on a configuration error.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        if let Err(e) = self.attach_all(middleware) {
            panic!("{e}");
        }
        self
    }
}

/// Rewrites `:name` segments into matchit's `{name}` syntax.
fn matchit_pattern(path: &str) -> Result<String, Error> {
    let invalid = |reason| Error::InvalidTemplate { path: path.to_owned(), reason };

    if !path.starts_with('/') {
        return Err(invalid("must start with `/`"));
    }
    let mut out = String::with_capacity(path.len() + 2);
    for segment in path.split('/').skip(1) {
        out.push('/');
        if segment.contains(['{', '}', '*']) {
            return Err(invalid("wildcards and braces are not supported"));
        }
        match segment.strip_prefix(':') {
            Some("") => return Err(invalid("empty parameter name")),
            Some(name) if name.contains(':') => return Err(invalid("one parameter per segment")),
            Some(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            None if segment.contains(':') => return Err(invalid("parameters must span the whole segment")),
            None => out.push_str(segment),
        }
    }
    Ok(out)
}
