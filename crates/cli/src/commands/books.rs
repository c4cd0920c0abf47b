//! Catalog browsing commands.

use paperback_core::{Book, BookId, FilterPatch, SortKey};

use super::Stores;

/// List books with optional filters and sort order.
#[allow(clippy::print_stdout)]
pub async fn list(
    stores: &Stores,
    author: Option<String>,
    in_stock: bool,
    sort: SortKey,
) -> Result<(), Box<dyn std::error::Error>> {
    stores.shop.sort_books(sort).await?;
    stores
        .shop
        .apply_filters(FilterPatch {
            author,
            in_stock_only: Some(in_stock),
        })
        .await?;

    print_books(&stores.shop.state().books);
    Ok(())
}

/// Search books by free text.
#[allow(clippy::print_stdout)]
pub async fn search(stores: &Stores, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    stores.shop.search_books(text).await?;
    print_books(&stores.shop.state().books);
    Ok(())
}

/// Show a single book.
#[allow(clippy::print_stdout)]
pub async fn show(stores: &Stores, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let book = stores.api.get_book(BookId::new(id)).await?;

    println!("#{} {} — {}", book.id, book.title, book.author);
    println!("  ${}  ({} in stock)", book.price, book.stock);
    if let Some(isbn) = &book.isbn {
        println!("  ISBN {isbn}");
    }
    if let Some(date) = book.published_date {
        println!("  Published {date}");
    }
    if !book.description.is_empty() {
        println!("\n{}", book.description);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }
    for book in books {
        println!(
            "#{:<4} {:<40} {:<24} ${:>8}  stock {}",
            book.id, book.title, book.author, book.price, book.stock
        );
    }
}
