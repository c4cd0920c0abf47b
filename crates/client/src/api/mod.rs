//! Bookstore REST API client.
//!
//! # Architecture
//!
//! - Single `reqwest` client with a shared cookie jar; authentication is
//!   cookie/session based, so the jar *is* the session
//! - The `csrftoken` cookie is mirrored into an `X-CSRFToken` header on
//!   every mutating request
//! - A 401 from any endpoint is broadcast process-wide as a
//!   session-invalidation signal; the session store subscribes to it
//! - The book-list endpoint's response shape is not uniform; an explicit
//!   union parser normalizes it (see [`types`] internals)
//!
//! # Example
//!
//! ```rust,ignore
//! use paperback_client::{ApiClient, Config};
//! use paperback_core::BookQuery;
//!
//! let client = ApiClient::new(&Config::from_env()?)?;
//!
//! let books = client.list_books(&BookQuery::default()).await?;
//! client.login("reader", "hunter2").await?;
//! client.add_cart_item(books[0].id, 1).await?;
//! ```

mod client;
mod types;

pub use client::ApiClient;

use thiserror::Error;

/// Errors that can occur when talking to the bookstore API.
///
/// Callers distinguish these to decide retry vs. surface-to-user; the
/// stores additionally treat `NotFound` from the cart endpoint as "no cart
/// yet" rather than a failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 from the server. Also announced on the process-wide
    /// invalidation channel before this error is returned.
    #[error("unauthorized")]
    Unauthorized,

    /// 403 from the server; in practice a missing or rejected CSRF token.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 404 from the server.
    #[error("not found")]
    NotFound,

    /// Any other 4xx; carries the server-supplied message verbatim.
    #[error("{0}")]
    Validation(String),

    /// 5xx from the server.
    #[error("server error (HTTP {0})")]
    Server(u16),

    /// Transport failure (connection refused, timeout, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not parse as the expected payload.
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint path did not join onto the configured base URL.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        assert_eq!(ApiError::Unauthorized.to_string(), "unauthorized");
        assert_eq!(ApiError::NotFound.to_string(), "not found");
        assert_eq!(ApiError::Server(502).to_string(), "server error (HTTP 502)");
        assert_eq!(
            ApiError::Validation("Not enough stock".to_string()).to_string(),
            "Not enough stock"
        );
        assert_eq!(
            ApiError::Forbidden("CSRF token missing".to_string()).to_string(),
            "forbidden: CSRF token missing"
        );
    }
}
