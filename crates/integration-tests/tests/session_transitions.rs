//! Auth state machine and the session→cart causality contract.

use paperback_client::{ApiError, Session, ShopError};
use paperback_core::BookId;
use paperback_integration_tests::{Harness, PASSWORD, USERNAME, eventually};

#[tokio::test]
async fn test_check_resolves_to_anonymous_without_session() {
    let harness = Harness::start().await;

    assert_eq!(harness.session.current(), Session::Unchecked);
    let resolved = harness.session.check().await;

    assert_eq!(resolved, Session::Anonymous);
    assert_eq!(harness.session.current(), Session::Anonymous);
}

#[tokio::test]
async fn test_check_resolves_to_authenticated_with_session() {
    let harness = Harness::start().await;
    harness.login().await;

    let resolved = harness.session.check().await;

    assert!(resolved.is_authenticated());
    assert_eq!(
        resolved.user().map(|user| user.username.as_str()),
        Some(USERNAME)
    );
}

#[tokio::test]
async fn test_login_failure_returns_reason_and_keeps_state() {
    let harness = Harness::start().await;
    harness.session.check().await;

    let result = harness.session.login(USERNAME, "wrong password").await;

    let Err(ApiError::Validation(message)) = result else {
        panic!("expected inline-renderable failure");
    };
    assert_eq!(message, "Invalid credentials");
    // Prior state is untouched.
    assert_eq!(harness.session.current(), Session::Anonymous);
}

#[tokio::test]
async fn test_register_signs_in() {
    let harness = Harness::start().await;

    let user = harness
        .session
        .register("newcomer", "newcomer@example.com", PASSWORD)
        .await
        .unwrap();

    assert_eq!(user.username, "newcomer");
    assert!(harness.session.current().is_authenticated());
}

#[tokio::test]
async fn test_register_failure_surfaces_server_message() {
    let harness = Harness::start().await;

    let result = harness
        .session
        .register(USERNAME, "reader@example.com", PASSWORD)
        .await;

    let Err(ApiError::Validation(message)) = result else {
        panic!("expected validation rejection");
    };
    assert_eq!(message, "Username already taken");
    assert!(!harness.session.current().is_authenticated());
}

#[tokio::test]
async fn test_logout_is_best_effort() {
    let harness = Harness::start().await;
    harness.login().await;

    harness.server.with(|state| state.fail_logout = true);
    harness.session.logout().await;

    // Local state is authoritative after an explicit logout request.
    assert_eq!(harness.session.current(), Session::Anonymous);
}

#[tokio::test]
async fn test_sign_in_triggers_cart_load() {
    let harness = Harness::start().await;
    assert!(harness.shop.state().cart.is_none());

    harness.login().await;

    let shop = harness.shop.clone();
    eventually(move || shop.state().cart.is_some(), "cart loaded").await;
    assert_eq!(harness.server.hits().cart_get, 1);
}

#[tokio::test]
async fn test_sign_out_clears_cart_without_network() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;
    harness.shop.add_to_cart(BookId::new(1), 1).await.unwrap();
    let gets_before = harness.server.hits().cart_get;

    harness.session.logout().await;

    let shop = harness.shop.clone();
    eventually(move || shop.state().cart.is_none(), "cart cleared").await;
    // The transition to Anonymous issued no cart request.
    assert_eq!(harness.server.hits().cart_get, gets_before);
}

#[tokio::test]
async fn test_observed_401_invalidates_session_and_cart() {
    let harness = Harness::start().await;
    harness.login_and_wait_cart().await;

    // The session expires server-side; the next call anywhere observes 401.
    harness.server.with(|state| state.force_unauthorized = true);
    let result = harness.shop.orders().await;

    assert!(matches!(
        result,
        Err(ShopError::Api(ApiError::Unauthorized))
    ));

    let session = harness.session.clone();
    eventually(
        move || session.current() == Session::Anonymous,
        "session invalidated",
    )
    .await;
    let shop = harness.shop.clone();
    eventually(move || shop.state().cart.is_none(), "cart cleared").await;
}
