//! Catalog book entity.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BookId;

/// A book in the catalog.
///
/// Books are immutable from the client's perspective; only the server
/// mutates stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Unit price as a decimal string on the wire (e.g., "19.99").
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Units available. Zero means out of stock.
    pub stock: u32,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
}

impl Book {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_deserializes_wire_shape() {
        let json = r#"{
            "id": 7,
            "title": "The Left Hand of Darkness",
            "author": "Ursula K. Le Guin",
            "description": "",
            "price": "12.50",
            "stock": 3,
            "isbn": "9780441478125",
            "published_date": "1969-03-01"
        }"#;

        let book: Book = serde_json::from_str(json).expect("valid book payload");
        assert_eq!(book.id, BookId::new(7));
        assert_eq!(book.price, Decimal::new(1250, 2));
        assert!(book.in_stock());
        assert_eq!(book.published_date, NaiveDate::from_ymd_opt(1969, 3, 1));
    }

    #[test]
    fn test_book_optional_fields_default() {
        // Minimal payload without isbn/published_date/description
        let json = r#"{"id": 1, "title": "T", "author": "A", "price": "0.99", "stock": 0}"#;

        let book: Book = serde_json::from_str(json).expect("valid book payload");
        assert!(book.description.is_empty());
        assert!(book.isbn.is_none());
        assert!(!book.in_stock());
    }
}
