//! Paperback Client library.
//!
//! A typed client for the Paperback bookstore REST API: one HTTP client
//! plus the two state stores that keep a local cache consistent with
//! server-confirmed state.
//!
//! # Architecture
//!
//! - [`api::ApiClient`] is the single point of outbound HTTP. It owns the
//!   session cookie jar, mirrors the CSRF cookie into mutating requests,
//!   and broadcasts a process-wide signal whenever the server answers 401.
//! - [`session::SessionStore`] owns the authentication state machine and
//!   publishes every transition on a watch channel.
//! - [`shop::ShopStore`] owns the catalog query, book-list results, and
//!   the cart. It subscribes to session transitions: gaining a session
//!   loads the cart, losing one clears it locally without a network call.
//!
//! # Example
//!
//! ```rust,ignore
//! use paperback_client::{ApiClient, Config, SessionStore, ShopStore};
//!
//! let config = Config::from_env()?;
//! let api = ApiClient::new(&config)?;
//! let session = SessionStore::new(api.clone());
//! let shop = ShopStore::new(api, &session);
//!
//! session.login("reader", "hunter2").await?;
//! shop.search_books("le guin").await?;
//! shop.add_to_cart(shop.state().books[0].id, 1).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod shop;

pub use api::{ApiClient, ApiError};
pub use config::{Config, ConfigError};
pub use error::ShopError;
pub use session::{Session, SessionStore};
pub use shop::{ShopState, ShopStore};
