//! Cart mutation contracts, driven over real HTTP against the mock server.

use paperback_client::{ApiError, ShopError};
use paperback_core::{BookId, CartItemId, OrderStatus};
use paperback_integration_tests::{Harness, eventually};

#[tokio::test]
async fn test_add_to_cart_anonymous_never_touches_network() {
    let harness = Harness::start().await;

    let result = harness.shop.add_to_cart(BookId::new(1), 1).await;

    assert!(matches!(result, Err(ShopError::Unauthenticated)));
    let hits = harness.server.hits();
    assert_eq!(hits.cart_items, 0);
    assert_eq!(hits.cart_get, 0);
}

#[tokio::test]
async fn test_zero_quantity_rejected_locally() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    let baseline = harness.server.hits().cart_items;

    let add = harness.shop.add_to_cart(BookId::new(1), 0).await;
    let update = harness.shop.update_cart_item(CartItemId::new(1), 0).await;

    // InvalidQuantity, not NotFound: the server was never asked.
    assert!(matches!(add, Err(ShopError::InvalidQuantity(0))));
    assert!(matches!(update, Err(ShopError::InvalidQuantity(0))));
    assert_eq!(harness.server.hits().cart_items, baseline);
}

#[tokio::test]
async fn test_add_to_cart_refetches_full_cart() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    let gets_before = harness.server.hits().cart_get;

    harness.shop.add_to_cart(BookId::new(1), 2).await.unwrap();

    let cart = harness.shop.state().cart.expect("cart present");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    // Server-computed totals, not a local splice.
    assert_eq!(cart.total_price.to_string(), "20.00");
    assert_eq!(cart.total_items, 2);
    assert_eq!(harness.server.hits().cart_get, gets_before + 1);
}

#[tokio::test]
async fn test_add_to_cart_surfaces_stock_rejection() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;

    // Book 3 has stock 2.
    let result = harness.shop.add_to_cart(BookId::new(3), 5).await;

    let Err(ShopError::Api(ApiError::Validation(message))) = result else {
        panic!("expected validation rejection");
    };
    assert_eq!(message, "Not enough stock");
}

#[tokio::test]
async fn test_update_replaces_only_the_matching_item() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    harness.shop.add_to_cart(BookId::new(1), 2).await.unwrap();
    harness.shop.add_to_cart(BookId::new(3), 1).await.unwrap();

    let cart = harness.shop.state().cart.expect("cart present");
    let first = cart.items[0].id;
    let gets_before = harness.server.hits().cart_get;

    harness.shop.update_cart_item(first, 3).await.unwrap();

    let cart = harness.shop.state().cart.expect("cart present");
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[0].total_price.to_string(), "30.00");
    // The other item is untouched.
    assert_eq!(cart.items[1].quantity, 1);
    // Confirmed update splices the returned item; no full reload.
    assert_eq!(harness.server.hits().cart_get, gets_before);
}

#[tokio::test]
async fn test_remove_drops_the_matching_item() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    harness.shop.add_to_cart(BookId::new(1), 1).await.unwrap();
    harness.shop.add_to_cart(BookId::new(3), 1).await.unwrap();

    let removed = harness.shop.state().cart.expect("cart present").items[0].id;
    harness.shop.remove_cart_item(removed).await.unwrap();

    let cart = harness.shop.state().cart.expect("cart present");
    assert!(cart.items.iter().all(|item| item.id != removed));
    assert_eq!(cart.items.len(), 1);
}

#[tokio::test]
async fn test_clear_cart_preserves_cart_id() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    harness.shop.add_to_cart(BookId::new(1), 1).await.unwrap();

    let id_before = harness.shop.state().cart.expect("cart present").id;
    harness.shop.clear_cart().await.unwrap();

    let cart = harness.shop.state().cart.expect("cart present");
    assert!(cart.items.is_empty());
    assert_eq!(cart.id, id_before);
}

#[tokio::test]
async fn test_missing_cart_becomes_empty_shell() {
    let harness = Harness::start().await;
    harness.server.with(|state| state.cart_exists = false);
    harness.login().await;

    let shop = harness.shop.clone();
    eventually(
        move || shop.state().cart.is_some(),
        "empty shell synthesized",
    )
    .await;

    let cart = harness.shop.state().cart.expect("cart present");
    assert_eq!(cart.id, None);
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price.to_string(), "0.00");
    assert_eq!(cart.total_items, 0);
}

#[tokio::test]
async fn test_cart_read_failure_nulls_cart() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;

    harness.server.with(|state| state.fail_cart_status = Some(500));
    let result = harness.shop.load_cart().await;

    assert!(matches!(
        result,
        Err(ShopError::Api(ApiError::Server(500)))
    ));
    assert!(harness.shop.state().cart.is_none());
}

#[tokio::test]
async fn test_csrf_rejection_surfaces_as_forbidden() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;

    harness.server.with(|state| state.reject_csrf = true);
    let result = harness.shop.add_to_cart(BookId::new(1), 1).await;

    let Err(ShopError::Api(ApiError::Forbidden(message))) = result else {
        panic!("expected CSRF rejection");
    };
    assert_eq!(message, "CSRF token missing or incorrect.");
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    harness.shop.add_to_cart(BookId::new(1), 2).await.unwrap();

    let order = harness.shop.checkout().await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price.to_string(), "20.00");
    let cart = harness.shop.state().cart.expect("cart present");
    assert!(cart.items.is_empty());

    let orders = harness.shop.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order.id);
}

#[tokio::test]
async fn test_checkout_failure_leaves_cart_untouched() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    harness.shop.add_to_cart(BookId::new(1), 2).await.unwrap();
    let cart_before = harness.shop.state().cart;

    harness.server.with(|state| state.fail_order_create = true);
    let result = harness.shop.checkout().await;

    assert!(matches!(
        result,
        Err(ShopError::Api(ApiError::Validation(_)))
    ));
    assert_eq!(harness.shop.state().cart, cart_before);
}

#[tokio::test]
async fn test_checkout_empty_cart_rejected_locally() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;

    let result = harness.shop.checkout().await;

    assert!(matches!(result, Err(ShopError::EmptyCart)));
    assert_eq!(harness.server.hits().orders_create, 0);
}

#[tokio::test]
async fn test_cancel_order_round_trip() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    harness.shop.add_to_cart(BookId::new(1), 1).await.unwrap();
    let order = harness.shop.checkout().await.unwrap();

    let cancelled = harness.shop.cancel_order(&order).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // A cancelled order is terminal; the second attempt never leaves the
    // client (a network attempt would answer 400, not OrderClosed).
    let again = harness.shop.cancel_order(&cancelled).await;
    assert!(matches!(
        again,
        Err(ShopError::OrderClosed(OrderStatus::Cancelled))
    ));
}
