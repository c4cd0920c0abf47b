//! Wire payload types for the bookstore API.
//!
//! Request bodies are client-specific and stay private to this module;
//! domain entities come from `paperback-core`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use paperback_core::{Book, BookId, User};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddCartItemRequest {
    pub book_id: BookId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateCartItemRequest {
    pub quantity: u32,
}

// =============================================================================
// Responses
// =============================================================================

/// Auth endpoints wrap the user in a `{"user": ...}` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthPayload {
    pub user: User,
}

/// Union of the shapes the book-list endpoint is known to return.
///
/// The upstream API is not consistent: depending on pagination settings it
/// answers with a bare array, a `{"results": [...]}` wrapper, a map keyed
/// by id, or (for degenerate queries) a single object. Parse the union
/// explicitly instead of sniffing `Value` variants at runtime.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BookListResponse {
    List(Vec<Book>),
    Paginated { results: Vec<Book> },
    Single(Book),
    Keyed(BTreeMap<String, Book>),
}

impl BookListResponse {
    fn into_books(self) -> Vec<Book> {
        match self {
            Self::List(books) => books,
            Self::Paginated { results } => results,
            Self::Single(book) => vec![book],
            Self::Keyed(map) => map.into_values().collect(),
        }
    }
}

/// Normalize a book-list payload to an ordered sequence.
///
/// Payloads matching none of the known shapes normalize to the empty
/// sequence; a junk body is empty results, not a crash.
pub(crate) fn books_from_response(value: Value) -> Vec<Book> {
    serde_json::from_value::<BookListResponse>(value)
        .map(BookListResponse::into_books)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book_json(id: i64, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "author": "Author",
            "description": "",
            "price": "9.99",
            "stock": 4
        })
    }

    #[test]
    fn test_normalizes_bare_list() {
        let value = json!([book_json(1, "A"), book_json(2, "B")]);
        let books = books_from_response(value);
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].id, BookId::new(1));
        assert_eq!(books[1].id, BookId::new(2));
    }

    #[test]
    fn test_normalizes_paginated_wrapper() {
        let value = json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [book_json(1, "A"), book_json(2, "B")]
        });
        assert_eq!(books_from_response(value).len(), 2);
    }

    #[test]
    fn test_normalizes_single_object() {
        let books = books_from_response(book_json(7, "Solo"));
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Solo");
    }

    #[test]
    fn test_normalizes_keyed_map() {
        let value = json!({
            "1": book_json(1, "A"),
            "2": book_json(2, "B")
        });
        let books = books_from_response(value);
        assert_eq!(books.len(), 2);
    }

    #[test]
    fn test_junk_payloads_normalize_to_empty() {
        for value in [
            json!("unexpected"),
            json!(42),
            json!(null),
            json!(true),
            json!({"detail": "something went sideways"}),
            json!([{"not": "a book"}]),
        ] {
            assert!(books_from_response(value).is_empty());
        }
    }

    #[test]
    fn test_empty_paginated_results() {
        let value = json!({"count": 0, "results": []});
        assert!(books_from_response(value).is_empty());
    }
}
