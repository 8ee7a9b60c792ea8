//! Customer directory demo: paged listing behind bearer auth.
//!
//! Run with:
//!   JWT_SECRET_KEY=dev RUST_LOG=info cargo run --example customers
//!
//! Try:
//!   TOKEN=$(curl -s -X POST http://localhost:3000/api/auth/token \
//!        -H 'content-type: application/json' \
//!        -d '{"email":"ana@example.com","password":"x"}' | jq -r .data.token)
//!   curl -H "authorization: Bearer $TOKEN" http://localhost:3000/api/customers
//!   curl -H "authorization: Bearer $TOKEN" http://localhost:3000/api/customers/10/next
//!   curl -X POST -H "authorization: Bearer $TOKEN" http://localhost:3000/api/customers \
//!        -d '{"fullname":"Katherine Johnson","email":"katherine@example.com"}'

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clap::Parser;
use ferrule::middleware::auth::{self, BearerAuth, Claims};
use ferrule::middleware::json::{RequireJson, ValidateJson};
use ferrule::middleware::trace::Trace;
use ferrule::pagination::{decode_segment, Keyed, LinkBase, Listing, Store};
use ferrule::store::MemoryStore;
use ferrule::{health, Config, Envelope, Method, Request, Response, Router, Server};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize)]
struct Customer {
    id: u64,
    fullname: String,
    email: String,
}

impl Keyed for Customer {
    fn sort_key(&self) -> &str { &self.fullname }
    fn id(&self) -> u64 { self.id }
}

const NAMES: [&str; 24] = [
    "Ada Lovelace", "Alan Turing", "Barbara Liskov", "Bjarne Stroustrup", "Claude Shannon",
    "Dennis Ritchie", "Donald Knuth", "Edsger Dijkstra", "Frances Allen", "Grace Hopper",
    "Guido van Rossum", "Hedy Lamarr", "John Backus", "John McCarthy", "Ken Thompson",
    "Leslie Lamport", "Linus Torvalds", "Margaret Hamilton", "Niklaus Wirth", "Radia Perlman",
    "Rob Pike", "Sophie Wilson", "Tony Hoare", "Yukihiro Matsumoto",
];

fn seed() -> MemoryStore<Customer> {
    NAMES.iter()
        .zip(1..)
        .map(|(name, id)| Customer {
            id,
            fullname: (*name).to_owned(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        })
        .collect()
}

/// Credentials are not checked; any well-formed body gets a token.
#[derive(Clone, Deserialize)]
struct SignIn {
    email: String,
}

#[derive(Clone, Deserialize)]
struct NewCustomer {
    fullname: String,
    email: String,
}

#[tokio::main]
async fn main() -> Result<(), ferrule::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::parse();
    let secret: Arc<[u8]> = config.jwt_secret.as_bytes().into();
    let store = Arc::new(seed());

    let links = LinkBase::new(&config.base_url, "/api/customers");
    let customers = Listing::new(Arc::clone(&store), links, "customers", config.page_size());

    let mut app = Router::new();
    app.register(Method::Get, "/healthz", health::liveness)?;
    app.register(Method::Get, "/readyz", health::readiness)?;
    app.register(Method::Post, "/api/auth/token", {
        let secret = Arc::clone(&secret);
        move |req: Request| {
            let secret = Arc::clone(&secret);
            async move { token(&req, &secret) }
        }
    })?;
    app.register(Method::Get, "/api/customers", customers.first_page())?;
    app.register(Method::Post, "/api/customers", {
        let store = Arc::clone(&store);
        let next_id = Arc::new(AtomicU64::new(NAMES.len() as u64 + 1));
        move |req: Request| {
            let store = Arc::clone(&store);
            let next_id = Arc::clone(&next_id);
            async move { create_customer(&req, &store, &next_id).await }
        }
    })?;
    app.register(Method::Get, "/api/customers/:id", {
        let store = Arc::clone(&store);
        move |req: Request| {
            let store = Arc::clone(&store);
            async move { find_customer(&req, &store).await }
        }
    })?;
    app.register(Method::Get, "/api/customers/:id/next", customers.next_page())?;
    app.register(Method::Get, "/api/customers/:id/prev", customers.prev_page())?;

    app.attach_all(Trace)?;
    app.attach_only(RequireJson, (Method::Post, "/api/auth/token"))?;
    app.attach_only(ValidateJson::<SignIn>::new(), (Method::Post, "/api/auth/token"))?;
    for path in ["/api/customers", "/api/customers/:id", "/api/customers/:id/next", "/api/customers/:id/prev"] {
        app.attach_only(BearerAuth::new(&secret), (Method::Get, path))?;
    }
    app.attach_only(BearerAuth::new(&secret), (Method::Post, "/api/customers"))?;
    app.attach_only(ValidateJson::<NewCustomer>::new(), (Method::Post, "/api/customers"))?;

    info!(customers = store.len().await, "store seeded");
    Server::from_config(&config).serve(app).await
}

// POST /api/auth/token
fn token(req: &Request, secret: &[u8]) -> Response {
    let payload = match req.context::<SignIn>() {
        Ok(payload) => payload,
        Err(e) => {
            warn!("{e}");
            return Response::server_error();
        }
    };
    match auth::issue_token(&payload.email, secret, auth::DEFAULT_TOKEN_TTL) {
        Ok(token) => Response::envelope(
            StatusCode::OK,
            &Envelope::new("token generated").with("token", token),
        ),
        Err(e) => {
            warn!("token signing failed: {e}");
            Response::server_error()
        }
    }
}

// POST /api/customers
async fn create_customer(req: &Request, store: &MemoryStore<Customer>, next_id: &AtomicU64) -> Response {
    let new = match req.context::<NewCustomer>() {
        Ok(new) => new.clone(),
        Err(e) => {
            warn!("{e}");
            return Response::server_error();
        }
    };
    let customer = Customer {
        id: next_id.fetch_add(1, Ordering::Relaxed),
        fullname: new.fullname,
        email: new.email,
    };
    let id = customer.id;
    match serde_json::to_value(&customer) {
        Ok(value) => {
            store.insert(customer).await;
            info!(id, "customer created");
            Response::envelope(
                StatusCode::CREATED,
                &Envelope::new("success creating customer").with("customer", value),
            )
        }
        Err(_) => Response::server_error(),
    }
}

// GET /api/customers/:id
async fn find_customer(req: &Request, store: &MemoryStore<Customer>) -> Response {
    let caller = match req.context::<Claims>() {
        Ok(claims) => claims.email.clone(),
        Err(e) => {
            warn!("{e}");
            return Response::server_error();
        }
    };
    let Some(Ok(id)) = req.param("id").map(decode_segment) else {
        return Response::message(StatusCode::BAD_REQUEST, "invalid id");
    };

    match store.find(id).await {
        Ok(Some(customer)) => {
            info!(%caller, id, "customer read");
            match serde_json::to_value(&customer) {
                Ok(value) => Response::envelope(
                    StatusCode::OK,
                    &Envelope::new("success retrieve customer data").with("customer", value),
                ),
                Err(_) => Response::server_error(),
            }
        }
        Ok(None) => Response::message(StatusCode::NOT_FOUND, format!("customer with id: {id} not found")),
        Err(never) => match never {},
    }
}
