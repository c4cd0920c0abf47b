//! Order history and checkout commands.

use paperback_core::{Order, OrderId};

use super::{Stores, require_login};

/// List past orders.
#[allow(clippy::print_stdout)]
pub async fn list(stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    let orders = stores.shop.orders().await?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }
    for order in &orders {
        print_order(order);
    }
    Ok(())
}

/// Place an order from the current cart.
#[allow(clippy::print_stdout)]
pub async fn place(stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    stores.shop.load_cart().await?;
    let order = stores.shop.checkout().await?;

    println!("Order placed:");
    print_order(&order);
    Ok(())
}

/// Cancel an order by id.
#[allow(clippy::print_stdout)]
pub async fn cancel(stores: &Stores, order_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    require_login(stores).await?;
    let order_id = OrderId::new(order_id);
    let orders = stores.shop.orders().await?;
    let order = orders
        .iter()
        .find(|order| order.id == order_id)
        .ok_or_else(|| format!("no order #{order_id}"))?;

    let cancelled = stores.shop.cancel_order(order).await?;
    println!("Cancelled:");
    print_order(&cancelled);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_order(order: &Order) {
    println!(
        "order #{:<4} {:<10} ${:>8}  placed {}",
        order.id,
        order.status,
        order.total_price,
        order.created_at.format("%Y-%m-%d %H:%M")
    );
    for item in &order.items {
        println!("  {:<40} x{:<3} @ ${}", item.book.title, item.quantity, item.price);
    }
}
