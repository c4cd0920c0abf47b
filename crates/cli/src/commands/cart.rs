//! Cart commands.

use paperback_core::{BookId, Cart, CartItemId};

use super::{Stores, require_login};

/// Show the cart.
#[allow(clippy::print_stdout)]
pub async fn show(stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    stores.shop.load_cart().await?;

    match stores.shop.state().cart {
        Some(cart) => print_cart(&cart),
        None => println!("No cart."),
    }
    Ok(())
}

/// Add a book to the cart.
#[allow(clippy::print_stdout)]
pub async fn add(
    stores: &Stores,
    book_id: i64,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    stores
        .shop
        .add_to_cart(BookId::new(book_id), quantity)
        .await?;

    println!("Added book #{book_id} (x{quantity}).");
    if let Some(cart) = stores.shop.state().cart {
        print_cart(&cart);
    }
    Ok(())
}

/// Change an item's quantity.
#[allow(clippy::print_stdout)]
pub async fn update(
    stores: &Stores,
    item_id: i64,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    stores.shop.load_cart().await?;
    stores
        .shop
        .update_cart_item(CartItemId::new(item_id), quantity)
        .await?;

    println!("Updated item #{item_id} to x{quantity}.");
    Ok(())
}

/// Remove an item from the cart.
#[allow(clippy::print_stdout)]
pub async fn remove(stores: &Stores, item_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    stores.shop.load_cart().await?;
    stores
        .shop
        .remove_cart_item(CartItemId::new(item_id))
        .await?;

    println!("Removed item #{item_id}.");
    Ok(())
}

/// Remove every item from the cart.
#[allow(clippy::print_stdout)]
pub async fn clear(stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    stores.shop.load_cart().await?;
    stores.shop.clear_cart().await?;

    println!("Cart cleared.");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.items.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in &cart.items {
        println!(
            "item #{:<4} {:<40} x{:<3} ${:>8}",
            item.id, item.book.title, item.quantity, item.total_price
        );
    }
    println!("total: ${} ({} items)", cart.total_price, cart.total_items);
}
