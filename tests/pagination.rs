//! Keyset pagination end to end: store → fetcher → link builder → envelope.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use ferrule::pagination::{
    fetch_page, Cursor, Direction, Keyed, LinkBase, Listing, Position, Scan, Store, PAGE_SIZE,
};
use ferrule::store::MemoryStore;
use ferrule::{Envelope, Method, Request, Router, SERVER_ERROR_MESSAGE};
use http::StatusCode;
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::Value;

const BASE: &str = "http://test";
const PAGE: usize = PAGE_SIZE.get();

#[derive(Clone, Debug, Serialize)]
struct Customer {
    id: u64,
    fullname: String,
}

impl Keyed for Customer {
    fn sort_key(&self) -> &str { &self.fullname }
    fn id(&self) -> u64 { self.id }
}

/// `count` customers named `A`, `B`, ... with ids 1, 2, ..., inserted in reverse.
fn customers(count: usize) -> MemoryStore<Customer> {
    (0..count)
        .rev()
        .map(|i| Customer { id: i as u64 + 1, fullname: name(i) })
        .collect()
}

/// `A`..`Z`, then `ZA`, `ZB`, ... so names sort in index order.
fn name(i: usize) -> String {
    let letter = |n: usize| char::from(b'A' + n as u8);
    if i < 26 { letter(i).to_string() } else { format!("Z{}", letter(i - 26)) }
}

fn app<S: Store>(store: S) -> Router
where
    S::Row: Serialize,
{
    app_paged(store, PAGE_SIZE)
}

fn app_paged<S: Store>(store: S, page_size: NonZeroUsize) -> Router
where
    S::Row: Serialize,
{
    let listing = Listing::new(Arc::new(store), LinkBase::new(BASE, "/api/customers"), "customers", page_size);
    Router::new()
        .get("/api/customers", listing.first_page())
        .get("/api/customers/:id/next", listing.next_page())
        .get("/api/customers/:id/prev", listing.prev_page())
}

struct Page {
    status: StatusCode,
    envelope: Envelope,
}

impl Page {
    fn names(&self) -> String {
        self.rows().iter().map(|c| c["fullname"].as_str().unwrap()).collect::<Vec<_>>().join("")
    }

    fn rows(&self) -> &Vec<Value> {
        self.envelope.data["customers"].as_array().unwrap()
    }

    fn link(&self, field: &str) -> Option<&str> {
        self.envelope.data.get(field).map(|v| v.as_str().unwrap())
    }

    fn next(&self) -> Option<&str> { self.link("__next") }
    fn prev(&self) -> Option<&str> { self.link("__prev") }
}

async fn get(router: &Router, url: &str) -> Page {
    let path = url.strip_prefix(BASE).unwrap_or(url);
    let res = router.dispatch(Request::new(Method::Get, path)).await;
    Page { status: res.status_code(), envelope: res.to_envelope().expect("json envelope") }
}

#[tokio::test]
async fn twenty_five_rows_walk_forward_and_back() {
    let router = app(customers(25));

    let first = get(&router, "/api/customers").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.envelope.message, "success retrieving customers data");
    assert_eq!(first.names(), "ABCDEFGHIJ");
    assert_eq!(first.next(), Some("http://test/api/customers/10/next"));
    assert_eq!(first.prev(), None);

    let second = get(&router, first.next().unwrap()).await;
    assert_eq!(second.names(), "KLMNOPQRST");
    assert_eq!(second.prev(), Some("http://test/api/customers/11/prev"));
    assert_eq!(second.next(), Some("http://test/api/customers/20/next"));

    let back = get(&router, second.prev().unwrap()).await;
    assert_eq!(back.rows(), first.rows());
    assert_eq!(back.prev(), None);
    assert_eq!(back.next(), Some("http://test/api/customers/10/next"));

    let third = get(&router, second.next().unwrap()).await;
    assert_eq!(third.names(), "UVWXY");
    assert_eq!((third.prev(), third.next()), (None, None));
}

#[tokio::test]
async fn round_trip_reproduces_the_first_page_for_any_size() {
    for size in 0..=40 {
        let router = app(customers(size));
        let first = get(&router, "/api/customers").await;

        let Some(next) = first.next() else {
            assert_eq!(first.rows().len(), size, "size {size}");
            continue;
        };
        let second = get(&router, next).await;
        let Some(prev) = second.prev() else {
            // Forward pages only link back when they themselves overshoot.
            assert!(second.rows().len() <= PAGE, "size {size}");
            continue;
        };
        let back = get(&router, prev).await;
        assert_eq!(back.rows(), first.rows(), "size {size}");
    }
}

#[tokio::test]
async fn exactly_one_page_has_no_links() {
    let router = app(customers(PAGE));

    let first = get(&router, "/api/customers").await;
    assert_eq!(first.rows().len(), PAGE);
    assert_eq!((first.prev(), first.next()), (None, None));

    let forward = get(&router, "/api/customers/3/next").await;
    assert_eq!(forward.names(), "DEFGHIJ");
    assert_eq!((forward.prev(), forward.next()), (None, None));
}

#[tokio::test]
async fn one_overshoot_row_yields_next_only() {
    let router = app(customers(PAGE + 1));
    let first = get(&router, "/api/customers").await;
    assert_eq!(first.names(), "ABCDEFGHIJ");
    assert_eq!(first.next(), Some("http://test/api/customers/10/next"));
    assert_eq!(first.prev(), None);
}

#[tokio::test]
async fn stepping_past_either_end_is_an_empty_page() {
    let router = app(customers(25));

    for url in ["/api/customers/1/prev", "/api/customers/25/next"] {
        let page = get(&router, url).await;
        assert_eq!(page.status, StatusCode::OK, "{url}");
        assert!(page.rows().is_empty(), "{url}");
        assert_eq!((page.prev(), page.next()), (None, None), "{url}");
    }
}

#[tokio::test]
async fn backward_page_without_overshoot_still_links_next() {
    let router = app(customers(25));
    let page = get(&router, "/api/customers/4/prev").await;
    assert_eq!(page.names(), "ABC");
    assert_eq!(page.prev(), None);
    assert_eq!(page.next(), Some("http://test/api/customers/3/next"));
}

#[tokio::test]
async fn backward_overshoot_links_prev_from_first_shown_row() {
    let router = app(customers(25));
    let page = get(&router, "/api/customers/20/prev").await;
    assert_eq!(page.names(), "JKLMNOPQRS");
    assert_eq!(page.prev(), Some("http://test/api/customers/10/prev"));
    assert_eq!(page.next(), Some("http://test/api/customers/19/next"));
}

#[tokio::test]
async fn bad_references() {
    let router = app(customers(5));

    let invalid = get(&router, "/api/customers/abc/next").await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.envelope.message, "invalid id");

    let missing = get(&router, "/api/customers/999/prev").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    for url in ["/api/customers/+3/next", "/api/customers/03/prev", "/api/customers/%33/next"] {
        let page = get(&router, url).await;
        assert_eq!(page.status, StatusCode::BAD_REQUEST, "{url}");
    }
}

#[tokio::test]
async fn single_row_pages_never_show_the_overshoot() {
    let router = app_paged(customers(5), NonZeroUsize::MIN);

    let first = get(&router, "/api/customers").await;
    assert_eq!(first.names(), "A");
    assert_eq!(first.next(), Some("http://test/api/customers/1/next"));

    let second = get(&router, first.next().unwrap()).await;
    assert_eq!(second.names(), "B");
    assert_eq!(second.prev(), Some("http://test/api/customers/2/prev"));
    assert_eq!(second.next(), Some("http://test/api/customers/2/next"));

    let back = get(&router, second.prev().unwrap()).await;
    assert_eq!(back.names(), "A");
}

#[tokio::test]
async fn fetch_page_reads_one_row_past_the_page() {
    let store = customers(5);
    let rows = fetch_page(&store, &Position::Initial, NonZeroUsize::MIN).await.unwrap();
    assert_eq!(rows.iter().map(|c| c.fullname.as_str()).collect::<String>(), "AB");

    let before = Position::Before(Cursor::new("E", 5));
    assert_eq!(before.direction(), Direction::Backward);
    let rows = fetch_page(&store, &before, NonZeroUsize::new(2).unwrap()).await.unwrap();
    assert_eq!(rows.iter().map(|c| c.fullname.as_str()).collect::<String>(), "BCD");
}

// ── Storage failures ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("storage unavailable")]
struct Unavailable;

/// Finds every row but fails every scan.
struct BrokenScans;

#[async_trait]
impl Store for BrokenScans {
    type Row = Customer;
    type Error = Unavailable;

    async fn query_first(&self, _limit: usize) -> Result<Vec<Customer>, Unavailable> {
        Err(Unavailable)
    }

    async fn query_range(&self, _bound: &Cursor, _scan: Scan, _limit: usize) -> Result<Vec<Customer>, Unavailable> {
        Err(Unavailable)
    }

    async fn find(&self, id: u64) -> Result<Option<Customer>, Unavailable> {
        Ok(Some(Customer { id, fullname: "X".to_owned() }))
    }
}

#[tokio::test]
async fn storage_errors_become_server_errors() {
    let router = app(BrokenScans);
    for url in ["/api/customers", "/api/customers/1/next", "/api/customers/1/prev"] {
        let page = get(&router, url).await;
        assert_eq!(page.status, StatusCode::INTERNAL_SERVER_ERROR, "{url}");
        assert_eq!(page.envelope.message, SERVER_ERROR_MESSAGE, "{url}");
    }
}

#[tokio::test]
async fn fetch_page_propagates_store_errors() {
    let result = fetch_page(&BrokenScans, &Position::Before(Cursor::new("X", 1)), PAGE_SIZE).await;
    assert!(matches!(result, Err(Unavailable)));
}
