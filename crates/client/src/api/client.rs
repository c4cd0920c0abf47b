//! HTTP plumbing and resource methods for the bookstore API.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, instrument};
use url::Url;

use paperback_core::{Book, BookId, BookQuery, Cart, CartItem, CartItemId, Order, OrderId, User};

use crate::config::Config;

use super::ApiError;
use super::types::{
    AddCartItemRequest, AuthPayload, LoginRequest, RegisterRequest, UpdateCartItemRequest,
    books_from_response,
};

/// Cookie the server uses to hand out CSRF tokens.
const CSRF_COOKIE: &str = "csrftoken";
/// Header mutating requests echo the token back in.
const CSRF_HEADER: &str = "X-CSRFToken";

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the bookstore REST API.
///
/// Cheap to clone; all clones share one connection pool and one cookie jar,
/// so a login performed through any clone authenticates them all.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
    unauthorized: broadcast::Sender<()>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .build()?;
        let (unauthorized, _) = broadcast::channel(8);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                jar,
                unauthorized,
            }),
        })
    }

    /// Subscribe to process-wide session-invalidation events.
    ///
    /// A message is broadcast whenever any request observes a 401.
    #[must_use]
    pub fn subscribe_unauthorized(&self) -> broadcast::Receiver<()> {
        self.inner.unauthorized.subscribe()
    }

    /// Export the session cookies for the API origin as a `Cookie` header
    /// string, for consumers that persist a session across processes.
    #[must_use]
    pub fn export_cookies(&self) -> Option<String> {
        let header = self.inner.jar.cookies(&self.inner.base_url)?;
        header.to_str().ok().map(str::to_owned)
    }

    /// Import session cookies previously returned by
    /// [`export_cookies`](Self::export_cookies).
    pub fn import_cookies(&self, cookies: &str) {
        for pair in cookies.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.inner
                .jar
                .add_cookie_str(&format!("{pair}; Path=/"), &self.inner.base_url);
        }
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// The CSRF token from the cookie jar, if the server has issued one.
    fn csrf_token(&self) -> Option<String> {
        let header = self.inner.jar.cookies(&self.inner.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').map(str::trim).find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == CSRF_COOKIE).then(|| value.to_string())
        })
    }

    /// Build a mutating request with the CSRF header attached.
    ///
    /// A missing token is not fatal: the request goes out bare and the
    /// server decides. Soft contract inherited from the upstream API;
    /// tightening it would break first-ever requests that predate the
    /// cookie.
    fn mutating(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut request = self.inner.http.request(method, self.url(path)?);
        if let Some(token) = self.csrf_token() {
            request = request.header(CSRF_HEADER, token);
        } else {
            debug!(path, "no csrf cookie, sending mutating request without token");
        }
        Ok(request)
    }

    /// Send a request and map the response status onto the error taxonomy.
    ///
    /// Returns the raw body on success. A 401 is announced on the
    /// invalidation channel before the error is returned.
    async fn run(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            let _ = self.inner.unauthorized.send(());
            return Err(ApiError::Unauthorized);
        }
        if status == StatusCode::FORBIDDEN {
            return Err(ApiError::Forbidden(error_message(
                &body,
                "request forbidden",
            )));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if status.is_client_error() {
            return Err(ApiError::Validation(error_message(
                &body,
                "request rejected",
            )));
        }
        if status.is_server_error() {
            return Err(ApiError::Server(status.as_u16()));
        }

        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.run(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register a new account. A successful registration is also a login:
    /// the server sets the session cookie on this response.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's message for
    /// rejected input (taken username, weak password, ...).
    #[instrument(skip(self, email, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let request = self.mutating(Method::POST, "auth/register/")?.json(
            &RegisterRequest {
                username,
                email,
                password,
            },
        );
        let payload: AuthPayload = self.fetch(request).await?;
        Ok(payload.user)
    }

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's message when the
    /// credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let request = self
            .mutating(Method::POST, "auth/login/")?
            .json(&LoginRequest { username, password });
        let payload: AuthPayload = self.fetch(request).await?;
        Ok(payload.user)
    }

    /// Log out, invalidating the server-side session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; callers treat this as
    /// best-effort.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = self.mutating(Method::POST, "auth/logout/")?;
        self.run(request).await.map(drop)
    }

    /// Who the session cookie says we are.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for an anonymous session.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let request = self.inner.http.get(self.url("auth/current-user/")?);
        let payload: AuthPayload = self.fetch(request).await?;
        Ok(payload.user)
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// List books matching the query.
    ///
    /// The response shape is normalized to an ordered sequence whatever the
    /// server chose to answer with; a payload matching no known shape is an
    /// empty sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    #[instrument(skip(self, query))]
    pub async fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>, ApiError> {
        let request = self
            .inner
            .http
            .get(self.url("books/")?)
            .query(&query.to_params());
        let body = self.run(request).await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(books_from_response(value))
    }

    /// Get a single book by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self))]
    pub async fn get_book(&self, id: BookId) -> Result<Book, ApiError> {
        let request = self.inner.http.get(self.url(&format!("books/{id}/"))?);
        self.fetch(request).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Get the current user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when no cart has been materialized yet;
    /// the shop store maps that to the empty-cart shell.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        let request = self.inner.http.get(self.url("carts/")?);
        self.fetch(request).await
    }

    /// Add a book to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's message when stock
    /// is insufficient.
    #[instrument(skip(self))]
    pub async fn add_cart_item(&self, book_id: BookId, quantity: u32) -> Result<CartItem, ApiError> {
        let request = self
            .mutating(Method::POST, "cart-items/")?
            .json(&AddCartItemRequest { book_id, quantity });
        self.fetch(request).await
    }

    /// Set the quantity of a cart item. Returns the updated item as the
    /// server recomputed it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown item id.
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItem, ApiError> {
        let request = self
            .mutating(Method::PATCH, &format!("cart-items/{item_id}/"))?
            .json(&UpdateCartItemRequest { quantity });
        self.fetch(request).await
    }

    /// Remove an item from the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown item id.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        let request = self.mutating(Method::DELETE, &format!("cart-items/{item_id}/"))?;
        self.run(request).await.map(drop)
    }

    /// Remove every item from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        let request = self.mutating(Method::POST, "cart-items/clear_cart/")?;
        self.run(request).await.map(drop)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// List the current user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let request = self.inner.http.get(self.url("orders/")?);
        self.fetch(request).await
    }

    /// Create an order from the current cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's message when the
    /// cart cannot be ordered (empty, stock gone, ...).
    #[instrument(skip(self))]
    pub async fn create_order(&self) -> Result<Order, ApiError> {
        let request = self.mutating(Method::POST, "orders/")?;
        self.fetch(request).await
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's message when the
    /// order can no longer be cancelled.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, ApiError> {
        let request = self.mutating(Method::POST, &format!("orders/{id}/cancel_order/"))?;
        self.fetch(request).await
    }
}

/// Pull a human-readable message out of an error body.
///
/// The server answers 4xx with `{"error": "..."}`; DRF-style endpoints use
/// `{"detail": "..."}`. Fall back to a generic message for anything else.
fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "detail"].iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            })
        })
        .unwrap_or_else(|| fallback.to_string())
}
