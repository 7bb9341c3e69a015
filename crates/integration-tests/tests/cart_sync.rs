//! Integration tests for cart synchronization with the server cart.
//!
//! Seeded state: Asha (user 1) has two Mango Pickles (product 7) in her
//! server cart; the admin (user 2) has none.

use std::sync::Arc;

use serde_json::json;

use soil2spoon_core::{Price, ProductId};
use soil2spoon_integration_tests::StubBackend;
use soil2spoon_storefront::{MemoryTokenStore, Storefront};
use soil2spoon_storefront::types::Product;

async fn product(storefront: &Storefront, slug: &str) -> Product {
    storefront
        .api()
        .get_product(slug)
        .await
        .expect("product exists")
}

async fn login_asha(storefront: &Storefront) {
    storefront
        .session()
        .login("asha@soil2spoon.in", "masala123")
        .await
        .expect("login");
    storefront.cart().flush().await.expect("flush");
}

fn lines(storefront: &Storefront) -> Vec<(i64, u32)> {
    storefront
        .cart()
        .items()
        .iter()
        .map(|item| (item.product_id.as_i64(), item.quantity))
        .collect()
}

// =============================================================================
// Load Tests
// =============================================================================

#[tokio::test]
async fn test_login_loads_server_cart_without_echo() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;

    login_asha(&storefront).await;

    assert_eq!(lines(&storefront), vec![(7, 2)]);
    assert_eq!(storefront.cart().total(), Price::from_rupees(498));
    assert_eq!(storefront.cart().count(), 2);
    assert_eq!(stub.hits("GET", "/api/cart"), 1);
    assert!(stub.cart_puts().is_empty());
}

#[tokio::test]
async fn test_restored_session_loads_server_cart() {
    let stub = StubBackend::start().await;
    let storefront =
        stub.storefront_with(Arc::new(MemoryTokenStore::with_token("token-asha")));

    storefront.start().await;
    storefront.cart().flush().await.expect("flush");

    assert_eq!(lines(&storefront), vec![(7, 2)]);
    assert!(stub.cart_puts().is_empty());
}

#[tokio::test]
async fn test_anonymous_cart_stays_local_and_is_replaced_on_login() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;

    let masala = product(&storefront, "garam-masala").await;
    storefront.cart().add(&masala, 3);
    storefront.cart().flush().await.expect("flush");
    assert_eq!(lines(&storefront), vec![(8, 3)]);
    assert_eq!(stub.hits("PUT", "/api/cart"), 0);

    login_asha(&storefront).await;

    assert_eq!(lines(&storefront), vec![(7, 2)]);
    assert!(stub.cart_puts().is_empty());
    assert_eq!(stub.server_cart(1), vec![(7, 2)]);
}

#[tokio::test]
async fn test_same_identity_does_not_reload() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    login_asha(&storefront).await;

    login_asha(&storefront).await;

    assert_eq!(stub.hits("GET", "/api/cart"), 1);
}

#[tokio::test]
async fn test_load_for_replaced_identity_is_discarded() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    stub.hold("/api/cart");

    storefront
        .session()
        .login("asha@soil2spoon.in", "masala123")
        .await
        .expect("login");
    stub.wait_for_hits("GET", "/api/cart", 1).await;

    storefront.session().logout().await;
    stub.release();
    storefront.cart().flush().await.expect("flush");

    assert!(storefront.cart().items().is_empty());
    assert!(stub.cart_puts().is_empty());
}

#[tokio::test]
async fn test_change_during_load_never_overwrites_server_cart() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    let masala = product(&storefront, "garam-masala").await;
    stub.hold("/api/cart");

    storefront
        .session()
        .login("asha@soil2spoon.in", "masala123")
        .await
        .expect("login");
    stub.wait_for_hits("GET", "/api/cart", 1).await;
    storefront.cart().add(&masala, 1);

    stub.release();
    storefront.cart().flush().await.expect("flush");

    // The server cart wins and the change made against the old cart is
    // never written over it.
    assert_eq!(lines(&storefront), vec![(7, 2)]);
    assert_eq!(stub.server_cart(1), vec![(7, 2)]);
    assert!(stub.cart_puts().is_empty());

    storefront.cart().add(&masala, 1);
    storefront.cart().flush().await.expect("flush");
    assert_eq!(stub.server_cart(1), lines(&storefront));
    assert_eq!(stub.server_cart(1), vec![(7, 2), (8, 1)]);
}

// =============================================================================
// Push Tests
// =============================================================================

#[tokio::test]
async fn test_mutation_after_load_pushes_full_cart() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    login_asha(&storefront).await;

    let masala = product(&storefront, "garam-masala").await;
    storefront.cart().add(&masala, 1);
    storefront.cart().flush().await.expect("flush");

    assert_eq!(
        stub.cart_puts(),
        vec![json!([
            { "productId": 7, "quantity": 2 },
            { "productId": 8, "quantity": 1 },
        ])]
    );
    assert_eq!(stub.server_cart(1), vec![(7, 2), (8, 1)]);
    let put = stub
        .requests()
        .into_iter()
        .find(|r| r.method == "PUT")
        .expect("recorded");
    assert_eq!(put.authorization.as_deref(), Some("Bearer token-asha"));
}

#[tokio::test]
async fn test_pushes_arrive_in_mutation_order() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    login_asha(&storefront).await;

    let cart = storefront.cart();
    let paste = product(&storefront, "ginger-garlic-paste").await;
    cart.add(&paste, 1);
    cart.update_quantity(ProductId::new(7), 5);
    cart.remove(ProductId::new(9));
    cart.update_quantity(ProductId::new(7), 0);
    cart.flush().await.expect("flush");

    let puts = stub.cart_puts();
    assert_eq!(puts.len(), 4);
    assert_eq!(puts.last(), Some(&json!([])));
    assert!(stub.server_cart(1).is_empty());
    assert!(cart.items().is_empty());
}

#[tokio::test]
async fn test_mutations_after_logout_stay_local() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    login_asha(&storefront).await;

    storefront.session().logout().await;
    assert_eq!(lines(&storefront), vec![(7, 2)]);

    storefront.cart().clear();
    storefront.cart().flush().await.expect("flush");

    assert!(stub.cart_puts().is_empty());
    assert_eq!(stub.server_cart(1), vec![(7, 2)]);
}

#[tokio::test]
async fn test_switching_users_never_leaks_cart() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    login_asha(&storefront).await;
    storefront.session().logout().await;

    storefront
        .session()
        .login("admin@soil2spoon.in", "admin123")
        .await
        .expect("admin login");
    storefront.cart().flush().await.expect("flush");

    assert!(storefront.cart().items().is_empty());
    assert!(stub.cart_puts().is_empty());
    assert!(stub.server_cart(2).is_empty());
    assert_eq!(stub.hits("GET", "/api/cart"), 2);
}

#[tokio::test]
async fn test_shutdown_delivers_queued_pushes() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;
    login_asha(&storefront).await;

    storefront.cart().update_quantity(ProductId::new(7), 4);
    storefront.shutdown().await;

    assert_eq!(stub.server_cart(1), vec![(7, 4)]);
}
