//! Store-level error type.
//!
//! Transport and protocol failures live in [`crate::api::ApiError`]; this
//! type adds the local preconditions the stores enforce before any network
//! call is made. Every variant renders to a message a UI can show inline.

use thiserror::Error;

use paperback_core::OrderStatus;

use crate::api::ApiError;

/// Errors returned by the state stores.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Operation requires a signed-in session; no request was made.
    #[error("not signed in")]
    Unauthenticated,

    /// Quantity must be at least 1; no request was made.
    #[error("invalid quantity {0}: must be at least 1")]
    InvalidQuantity(u32),

    /// Checkout requires a non-empty cart; no request was made.
    #[error("cart is empty")]
    EmptyCart,

    /// The order is in a terminal status; no request was made.
    #[error("order is already {0}")]
    OrderClosed(OrderStatus),

    /// The underlying API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}
