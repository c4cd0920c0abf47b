//! Cart and cart item entities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Book, CartId, CartItemId};

/// A single book/quantity line in the cart.
///
/// `total_price` is computed by the server (`price * quantity`); the client
/// stores it verbatim rather than re-deriving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub book: Book,
    /// Always >= 1; removal is the only way to eliminate an item.
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
}

/// The authenticated user's cart.
///
/// `id` is `None` until the server has materialized a cart ("no cart yet"
/// is a valid empty state, not a failure). Item order is whatever the
/// server returned. Totals are server-authoritative; the `computed_*`
/// methods recompute them locally as a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Option<CartId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    #[serde(default)]
    pub total_items: u32,
}

impl Cart {
    /// The local empty cart shell used when the server has no cart yet.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: None,
            items: Vec::new(),
            total_price: Decimal::new(0, 2),
            total_items: 0,
        }
    }

    /// Sum of item totals, recomputed locally.
    #[must_use]
    pub fn computed_total_price(&self) -> Decimal {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Sum of item quantities, recomputed locally.
    #[must_use]
    pub fn computed_total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the cart has no items (including the "no cart yet" shell).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookId;

    fn item(id: i64, price: &str, quantity: u32, total: &str) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            book: Book {
                id: BookId::new(id),
                title: format!("Book {id}"),
                author: "Author".to_string(),
                description: String::new(),
                price: price.parse().expect("valid decimal"),
                stock: 10,
                isbn: None,
                published_date: None,
            },
            quantity,
            total_price: total.parse().expect("valid decimal"),
        }
    }

    #[test]
    fn test_empty_shell_shape() {
        let cart = Cart::empty();
        assert_eq!(cart.id, None);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items, 0);
        assert_eq!(cart.total_price.to_string(), "0.00");
    }

    #[test]
    fn test_empty_shell_serializes_with_null_id() {
        let json = serde_json::to_value(Cart::empty()).expect("serializable");
        assert!(json["id"].is_null());
        assert_eq!(json["total_price"], "0.00");
        assert_eq!(json["total_items"], 0);
    }

    #[test]
    fn test_computed_totals_fall_back_from_items() {
        let cart = Cart {
            id: Some(CartId::new(4)),
            items: vec![item(1, "10.00", 2, "20.00"), item(2, "5.25", 1, "5.25")],
            total_price: Decimal::new(2525, 2),
            total_items: 3,
        };
        assert_eq!(cart.computed_total_price(), cart.total_price);
        assert_eq!(cart.computed_total_items(), cart.total_items);
    }

    #[test]
    fn test_cart_deserializes_wire_shape() {
        let json = r#"{
            "id": 12,
            "items": [{
                "id": 1,
                "book": {"id": 9, "title": "T", "author": "A", "price": "10.00", "stock": 5},
                "quantity": 2,
                "total_price": "20.00"
            }],
            "total_price": "20.00",
            "total_items": 2
        }"#;

        let cart: Cart = serde_json::from_str(json).expect("valid cart payload");
        assert_eq!(cart.id, Some(CartId::new(12)));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }
}
