//! Order history entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Book, OrderId};

/// Order lifecycle status.
///
/// `Delivered` and `Cancelled` are terminal; the server rejects further
/// transitions and the client refuses to even ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether no further status transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A book/quantity line in a placed order, with the unit price captured at
/// order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub book: Book,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_values() {
        for (status, wire) in [
            (OrderStatus::Pending, "\"pending\""),
            (OrderStatus::Confirmed, "\"confirmed\""),
            (OrderStatus::Shipped, "\"shipped\""),
            (OrderStatus::Delivered, "\"delivered\""),
            (OrderStatus::Cancelled, "\"cancelled\""),
        ] {
            assert_eq!(serde_json::to_string(&status).expect("serializable"), wire);
            let parsed: OrderStatus = serde_json::from_str(wire).expect("parsable");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_order_deserializes_wire_shape() {
        let json = r#"{
            "id": 3,
            "status": "pending",
            "created_at": "2025-11-02T14:30:00Z",
            "items": [{
                "book": {"id": 1, "title": "T", "author": "A", "price": "10.00", "stock": 5},
                "quantity": 1,
                "price": "10.00"
            }],
            "total_price": "10.00"
        }"#;

        let order: Order = serde_json::from_str(json).expect("valid order payload");
        assert_eq!(order.id, OrderId::new(3));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
    }
}
