//! Integration-test support: an in-process mock of the bookstore API.
//!
//! Stands up an axum router on an ephemeral port with an in-memory
//! catalog/cart/order state, cookie-session auth, CSRF enforcement,
//! per-route hit counters, and switchable book-list response shapes, so
//! the real client and stores are driven over real HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p paperback-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `book_search` - Catalog queries, shape normalization, debounce
//! - `cart_flow` - Cart mutations, checkout, re-fetch-over-patch
//! - `session_transitions` - Auth state machine and cross-store causality

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support code: unwrap freely, a panic here is a failing test.
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, patch, post};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::sleep;
use url::Url;

use paperback_core::{
    Book, BookId, Cart, CartId, CartItem, CartItemId, Order, OrderId, OrderItem, OrderStatus,
    User, UserId,
};

/// Session cookie name and fixed value handed out on login.
pub const SESSION_COOKIE: &str = "sessionid";
pub const SESSION_VALUE: &str = "test-session";
/// CSRF token value handed out alongside the session.
pub const CSRF_TOKEN: &str = "csrf-test-token";

/// The one account the mock server knows.
pub const USERNAME: &str = "reader";
pub const PASSWORD: &str = "correct horse";

/// Response shape served by the book-list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooksShape {
    /// Bare JSON array.
    Plain,
    /// DRF-style `{count, next, previous, results}` wrapper.
    Paginated,
    /// Map keyed by book id.
    Keyed,
    /// A JSON string; matches no known shape.
    Junk,
}

/// Per-route request counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hits {
    pub books: usize,
    pub cart_get: usize,
    pub cart_items: usize,
    pub orders_list: usize,
    pub orders_create: usize,
}

/// Mutable server-side world, behind the handle's mutex.
pub struct MockState {
    pub books: Vec<Book>,
    pub items: Vec<CartItem>,
    pub next_item_id: i64,
    pub orders: Vec<Order>,
    pub next_order_id: i64,
    /// When false, `GET /carts/` answers 404 ("no cart yet").
    pub cart_exists: bool,
    pub logged_in: bool,
    pub books_shape: BooksShape,
    pub hits: Hits,
    /// Query params of every `/books/` request, in arrival order.
    pub books_queries: Vec<HashMap<String, String>>,
    // Failure injection
    pub fail_books: bool,
    pub fail_cart_status: Option<u16>,
    pub fail_order_create: bool,
    pub fail_logout: bool,
    pub reject_csrf: bool,
    /// When true every endpoint answers 401, as an expired session would.
    pub force_unauthorized: bool,
}

impl MockState {
    fn user() -> User {
        User {
            id: UserId::new(1),
            username: USERNAME.to_string(),
            email: Some("reader@example.com".to_string()),
        }
    }

    fn cart(&self) -> Cart {
        Cart {
            id: Some(CartId::new(1)),
            items: self.items.clone(),
            total_price: self.items.iter().map(|i| i.total_price).sum::<Decimal>()
                + Decimal::new(0, 2),
            total_items: self.items.iter().map(|i| i.quantity).sum(),
        }
    }
}

/// Handle to a spawned mock server.
pub struct MockBookstore {
    state: Arc<Mutex<MockState>>,
    pub base_url: Url,
}

impl MockBookstore {
    /// Bind an ephemeral port, seed the default catalog, and serve.
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            books: default_catalog(),
            items: Vec::new(),
            next_item_id: 1,
            orders: Vec::new(),
            next_order_id: 1,
            cart_exists: true,
            logged_in: false,
            books_shape: BooksShape::Plain,
            hits: Hits::default(),
            books_queries: Vec::new(),
            fail_books: false,
            fail_cart_status: None,
            fail_order_create: false,
            fail_logout: false,
            reject_csrf: false,
            force_unauthorized: false,
        }));

        let router = axum::Router::new()
            .route("/api/auth/register/", post(register))
            .route("/api/auth/login/", post(login))
            .route("/api/auth/logout/", post(logout))
            .route("/api/auth/current-user/", get(current_user))
            .route("/api/books/", get(list_books))
            .route("/api/books/{id}/", get(get_book))
            .route("/api/carts/", get(get_cart))
            .route("/api/cart-items/", post(add_item))
            .route("/api/cart-items/clear_cart/", post(clear_cart))
            .route("/api/cart-items/{id}/", patch(update_item).delete(delete_item))
            .route("/api/orders/", get(list_orders).post(create_order))
            .route("/api/orders/{id}/cancel_order/", post(cancel_order))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            state,
            base_url: Url::parse(&format!("http://{addr}/api/")).unwrap(),
        }
    }

    /// Client configuration pointed at this server.
    #[must_use]
    pub fn client_config(&self) -> paperback_client::Config {
        paperback_client::Config::new(self.base_url.clone())
    }

    /// Run a closure against the locked server state.
    pub fn with<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Snapshot of the hit counters.
    #[must_use]
    pub fn hits(&self) -> Hits {
        self.state.lock().unwrap().hits
    }

    /// Query params of the most recent `/books/` request.
    #[must_use]
    pub fn last_books_query(&self) -> Option<HashMap<String, String>> {
        self.state.lock().unwrap().books_queries.last().cloned()
    }
}

/// A mock server wired to a real client and real stores.
pub struct Harness {
    pub server: MockBookstore,
    pub api: paperback_client::ApiClient,
    pub session: paperback_client::SessionStore,
    pub shop: paperback_client::ShopStore,
}

impl Harness {
    /// Spawn a mock server and point a fresh client and stores at it.
    pub async fn start() -> Self {
        let server = MockBookstore::spawn().await;
        let api = paperback_client::ApiClient::new(&server.client_config()).unwrap();
        let session = paperback_client::SessionStore::new(api.clone());
        let shop = paperback_client::ShopStore::new(api.clone(), &session);
        Self {
            server,
            api,
            session,
            shop,
        }
    }

    /// Log in as the known account.
    pub async fn login(&self) -> User {
        self.session.login(USERNAME, PASSWORD).await.unwrap()
    }

    /// Log in and wait until the session listener has loaded the cart.
    pub async fn login_and_wait_cart(&self) {
        self.login().await;
        let shop = self.shop.clone();
        eventually(
            move || shop.state().cart.is_some(),
            "cart loaded after sign-in",
        )
        .await;
    }
}

/// Default three-book catalog.
fn default_catalog() -> Vec<Book> {
    vec![
        book(1, "The Dispossessed", "Ursula K. Le Guin", "10.00", 5),
        book(2, "A Wizard of Earthsea", "Ursula K. Le Guin", "8.50", 0),
        book(3, "Dune", "Frank Herbert", "12.00", 2),
    ]
}

/// Build a catalog book.
#[must_use]
pub fn book(id: i64, title: &str, author: &str, price: &str, stock: u32) -> Book {
    Book {
        id: BookId::new(id),
        title: title.to_string(),
        author: author.to_string(),
        description: String::new(),
        price: price.parse().unwrap(),
        stock,
        isbn: None,
        published_date: None,
    }
}

/// Poll until `f` holds, panicking after five seconds.
pub async fn eventually(f: impl Fn() -> bool, what: &str) {
    for _ in 0..200 {
        if f() {
            return;
        }
        sleep(Duration::from_millis(25)).await;
    }
    panic!("timed out waiting for {what}");
}

// =============================================================================
// Handlers
// =============================================================================

type ServerState = State<Arc<Mutex<MockState>>>;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').map(str::trim).find_map(|pair| {
        let (cookie_name, value) = pair.split_once('=')?;
        (cookie_name == name).then(|| value.to_string())
    })
}

fn session_ok(state: &MockState, headers: &HeaderMap) -> bool {
    !state.force_unauthorized
        && state.logged_in
        && cookie_value(headers, SESSION_COOKIE).as_deref() == Some(SESSION_VALUE)
}

/// CSRF rule for mutating requests: enforced once a session exists,
/// matching the soft contract the client implements.
fn csrf_ok(state: &MockState, headers: &HeaderMap) -> bool {
    if state.reject_csrf {
        return false;
    }
    headers
        .get("X-CSRFToken")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| token == CSRF_TOKEN)
}

fn login_response(user: &User) -> Response {
    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={SESSION_VALUE}; Path=/"),
        ),
        (header::SET_COOKIE, format!("csrftoken={CSRF_TOKEN}; Path=/")),
    ]);
    (cookies, Json(json!({ "user": user }))).into_response()
}

async fn register(state: ServerState, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let username = body.get("username").and_then(Value::as_str).unwrap_or("");
    if username == USERNAME {
        return error_response(StatusCode::BAD_REQUEST, "Username already taken");
    }
    state.logged_in = true;
    let user = User {
        id: UserId::new(2),
        username: username.to_string(),
        email: body
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string),
    };
    login_response(&user)
}

async fn login(state: ServerState, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    let username = body.get("username").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");
    if username != USERNAME || password != PASSWORD {
        return error_response(StatusCode::BAD_REQUEST, "Invalid credentials");
    }
    state.logged_in = true;
    login_response(&MockState::user())
}

async fn logout(state: ServerState) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_logout {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "logout exploded");
    }
    state.logged_in = false;
    Json(json!({ "detail": "logged out" })).into_response()
}

async fn current_user(state: ServerState, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    if !session_ok(&state, &headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    Json(json!({ "user": MockState::user() })).into_response()
}

async fn list_books(
    state: ServerState,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.books += 1;
    state.books_queries.push(params.clone());

    if state.fail_books {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "catalog offline");
    }

    let search = params.get("search").cloned().unwrap_or_default();
    let author = params.get("author").cloned().unwrap_or_default();
    let in_stock = params.get("in_stock").is_some_and(|v| v == "true");

    let filtered: Vec<&Book> = state
        .books
        .iter()
        .filter(|b| search.is_empty() || b.title.to_lowercase().contains(&search.to_lowercase()))
        .filter(|b| author.is_empty() || b.author.to_lowercase().contains(&author.to_lowercase()))
        .filter(|b| !in_stock || b.stock > 0)
        .collect();

    match state.books_shape {
        BooksShape::Plain => Json(json!(filtered)).into_response(),
        BooksShape::Paginated => Json(json!({
            "count": filtered.len(),
            "next": null,
            "previous": null,
            "results": filtered,
        }))
        .into_response(),
        BooksShape::Keyed => {
            let map: serde_json::Map<String, Value> = filtered
                .iter()
                .map(|b| (b.id.to_string(), json!(b)))
                .collect();
            Json(Value::Object(map)).into_response()
        }
        BooksShape::Junk => Json(json!("service temporarily confused")).into_response(),
    }
}

async fn get_book(state: ServerState, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    state
        .books
        .iter()
        .find(|b| b.id == BookId::new(id))
        .map_or_else(not_found, |b| Json(json!(b)).into_response())
}

async fn get_cart(state: ServerState, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.cart_get += 1;

    if !session_ok(&state, &headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    if let Some(status) = state.fail_cart_status {
        let status = StatusCode::from_u16(status).unwrap();
        return error_response(status, "cart backend unavailable");
    }
    if !state.cart_exists {
        return not_found();
    }
    Json(json!(state.cart())).into_response()
}

fn guard_mutation(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    if !session_ok(state, headers) {
        return Some(error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication required",
        ));
    }
    if !csrf_ok(state, headers) {
        return Some((
            StatusCode::FORBIDDEN,
            Json(json!({ "detail": "CSRF token missing or incorrect." })),
        )
            .into_response());
    }
    None
}

async fn add_item(state: ServerState, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.cart_items += 1;

    if let Some(denied) = guard_mutation(&state, &headers) {
        return denied;
    }

    let book_id = body.get("book_id").and_then(Value::as_i64).unwrap_or(0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let quantity = body.get("quantity").and_then(Value::as_i64).unwrap_or(0) as u32;

    let Some(book) = state
        .books
        .iter()
        .find(|b| b.id == BookId::new(book_id))
        .cloned()
    else {
        return not_found();
    };
    if quantity > book.stock {
        return error_response(StatusCode::BAD_REQUEST, "Not enough stock");
    }

    let item = CartItem {
        id: CartItemId::new(state.next_item_id),
        total_price: book.price * Decimal::from(quantity),
        book,
        quantity,
    };
    state.next_item_id += 1;
    state.items.push(item.clone());
    state.cart_exists = true;

    (StatusCode::CREATED, Json(json!(item))).into_response()
}

async fn update_item(
    state: ServerState,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.cart_items += 1;

    if let Some(denied) = guard_mutation(&state, &headers) {
        return denied;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let quantity = body.get("quantity").and_then(Value::as_i64).unwrap_or(0) as u32;
    if quantity == 0 {
        return error_response(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let Some(item) = state
        .items
        .iter_mut()
        .find(|item| item.id == CartItemId::new(id))
    else {
        return not_found();
    };
    item.quantity = quantity;
    item.total_price = item.book.price * Decimal::from(quantity);
    let item = item.clone();

    Json(json!(item)).into_response()
}

async fn delete_item(state: ServerState, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.cart_items += 1;

    if let Some(denied) = guard_mutation(&state, &headers) {
        return denied;
    }

    let before = state.items.len();
    state.items.retain(|item| item.id != CartItemId::new(id));
    if state.items.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn clear_cart(state: ServerState, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.cart_items += 1;

    if let Some(denied) = guard_mutation(&state, &headers) {
        return denied;
    }

    state.items.clear();
    Json(json!({ "status": "cart cleared" })).into_response()
}

async fn list_orders(state: ServerState, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.orders_list += 1;

    if !session_ok(&state, &headers) {
        return error_response(StatusCode::UNAUTHORIZED, "Authentication required");
    }
    Json(json!(state.orders)).into_response()
}

async fn create_order(state: ServerState, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.hits.orders_create += 1;

    if let Some(denied) = guard_mutation(&state, &headers) {
        return denied;
    }
    if state.fail_order_create {
        return error_response(StatusCode::BAD_REQUEST, "Not enough stock");
    }
    if state.items.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let order = Order {
        id: OrderId::new(state.next_order_id),
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        items: state
            .items
            .iter()
            .map(|item| OrderItem {
                book: item.book.clone(),
                quantity: item.quantity,
                price: item.book.price,
            })
            .collect(),
        total_price: state.cart().total_price,
    };
    state.next_order_id += 1;
    state.items.clear();
    state.orders.push(order.clone());

    (StatusCode::CREATED, Json(json!(order))).into_response()
}

async fn cancel_order(state: ServerState, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();

    if let Some(denied) = guard_mutation(&state, &headers) {
        return denied;
    }

    let Some(order) = state
        .orders
        .iter_mut()
        .find(|order| order.id == OrderId::new(id))
    else {
        return not_found();
    };
    if order.status.is_terminal() {
        return error_response(StatusCode::BAD_REQUEST, "Order can no longer be cancelled");
    }
    order.status = OrderStatus::Cancelled;
    let order = order.clone();

    Json(json!(order)).into_response()
}
