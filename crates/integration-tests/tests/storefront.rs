//! Integration tests for checkout, admin access, catalog and content.

use soil2spoon_core::{CategoryId, OrderStatus, Price, ProductId};
use soil2spoon_integration_tests::StubBackend;
use soil2spoon_storefront::types::{
    AddressRequest, CreateOrderRequest, PaymentMethod, ProductQuery, ProductRequest, ShippingPolicy,
};
use soil2spoon_storefront::{Storefront, StorefrontError};

async fn signed_in(stub: &StubBackend, email: &str, password: &str) -> Storefront {
    let storefront = stub.storefront();
    storefront.start().await;
    storefront
        .session()
        .login(email, password)
        .await
        .expect("login");
    storefront.cart().flush().await.expect("flush");
    storefront
}

fn home() -> AddressRequest {
    AddressRequest {
        name: "Asha Patil".to_string(),
        phone: "9876543210".to_string(),
        address_line1: "14 Tilak Road".to_string(),
        address_line2: None,
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        pincode: "411002".to_string(),
        is_default: Some(true),
    }
}

// =============================================================================
// Checkout Tests
// =============================================================================

#[tokio::test]
async fn test_place_order_flushes_then_clears_cart() {
    let stub = StubBackend::start().await;
    let storefront = signed_in(&stub, "asha@soil2spoon.in", "masala123").await;
    let masala = storefront
        .api()
        .get_product("garam-masala")
        .await
        .expect("product");
    storefront.cart().add(&masala, 1);

    let address = storefront
        .api()
        .create_address(&home())
        .await
        .expect("address");
    let order = storefront
        .place_order(&CreateOrderRequest::ship_to(&address, PaymentMethod::Upi))
        .await
        .expect("order");

    // The pending push reached the backend before the order was built.
    assert_eq!(order.total_amount, Price::from_rupees(618));
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.status, Some(OrderStatus::Pending));
    assert_eq!(order.shipping_name.as_deref(), Some("Asha Patil"));

    assert!(storefront.cart().items().is_empty());
    storefront.cart().flush().await.expect("flush");
    assert!(stub.server_cart(1).is_empty());

    let orders = storefront.api().list_orders().await.expect("orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().map(|o| o.id), Some(order.id));
}

#[tokio::test]
async fn test_rejected_order_is_not_reported() {
    let stub = StubBackend::start().await;
    stub.set_server_cart(1, Vec::new());
    let storefront = signed_in(&stub, "asha@soil2spoon.in", "masala123").await;

    let err = storefront
        .place_order(&CreateOrderRequest::default())
        .await
        .expect_err("empty cart");

    // Client errors are the user's to fix and never reach Sentry.
    assert!(!err.is_reportable());
    match err {
        StorefrontError::Api(e) => {
            assert_eq!(e.status(), Some(400));
            assert_eq!(e.to_string(), "Cart is empty");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_place_order_signed_out_sends_nothing() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;

    let err = storefront
        .place_order(&CreateOrderRequest::default())
        .await
        .expect_err("signed out");

    assert!(matches!(err, StorefrontError::Session(_)));
    assert_eq!(stub.hits("POST", "/api/orders"), 0);
}

// =============================================================================
// Admin Tests
// =============================================================================

#[tokio::test]
async fn test_admin_calls_forbidden_for_shoppers() {
    let stub = StubBackend::start().await;
    let storefront = signed_in(&stub, "asha@soil2spoon.in", "masala123").await;

    let err = storefront
        .admin_delete_product(ProductId::new(9))
        .await
        .expect_err("forbidden");

    assert!(matches!(err, StorefrontError::Forbidden(_)));
    assert_eq!(stub.hits("DELETE", "/api/admin/products/9"), 0);
}

#[tokio::test]
async fn test_admin_manages_products() {
    let stub = StubBackend::start().await;
    let storefront = signed_in(&stub, "admin@soil2spoon.in", "admin123").await;

    let created = storefront
        .admin_create_product(&ProductRequest {
            name: Some("Kokum Sherbet".to_string()),
            slug: Some("kokum-sherbet".to_string()),
            price: Some(Price::from_rupees(180)),
            category_id: Some(CategoryId::new("pickles")),
            ..ProductRequest::default()
        })
        .await
        .expect("create");
    assert_eq!(created.name, "Kokum Sherbet");
    assert_eq!(created.price, Price::from_rupees(180));

    storefront
        .admin_delete_product(ProductId::new(9))
        .await
        .expect("delete");
    let err = storefront
        .admin_delete_product(ProductId::new(9))
        .await
        .expect_err("already gone");
    assert!(matches!(err, StorefrontError::Api(ref e) if e.is_not_found()));
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[tokio::test]
async fn test_product_listing_filters_and_pages() {
    let stub = StubBackend::start().await;
    let api = stub.storefront().api().clone();

    let all = api
        .list_products(&ProductQuery::default())
        .await
        .expect("all");
    assert_eq!(all.total_elements, 3);

    let pickles = api
        .list_products(&ProductQuery {
            category: Some(CategoryId::new("pickles")),
            ..ProductQuery::default()
        })
        .await
        .expect("pickles");
    assert_eq!(pickles.content.len(), 1);
    assert_eq!(
        pickles.content.first().map(|p| p.slug.as_str()),
        Some("mango-pickle")
    );

    let second_page = api
        .list_products(&ProductQuery {
            category: None,
            page: 1,
            size: 2,
        })
        .await
        .expect("page 2");
    assert_eq!(second_page.content.len(), 1);
    assert_eq!(second_page.total_pages, 2);

    let queries: Vec<_> = stub
        .requests()
        .into_iter()
        .filter_map(|r| r.query)
        .collect();
    assert!(queries.contains(&"category=pickles&page=0&size=20".to_string()));
}

#[tokio::test]
async fn test_product_detail_and_reviews() {
    let stub = StubBackend::start().await;
    let api = stub.storefront().api().clone();

    let pickle = api.get_product("mango-pickle").await.expect("product");
    assert_eq!(pickle.id, ProductId::new(7));

    let reviews = api.list_reviews(pickle.id).await.expect("reviews");
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews.first().map(|r| r.rating), Some(5));

    let err = api.get_product("no-such-thing").await.expect_err("404");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_featured_and_trending() {
    let stub = StubBackend::start().await;
    let api = stub.storefront().api().clone();

    let featured = api.featured_products().await.expect("featured");
    let trending = api.trending_products().await.expect("trending");

    assert_eq!(featured.len(), 1);
    assert_eq!(trending.len(), 2);
}

// =============================================================================
// Content Tests
// =============================================================================

#[tokio::test]
async fn test_content_falls_back_when_missing() {
    let stub = StubBackend::start().await;
    let api = stub.storefront().api().clone();

    let contact = api.contact_info_or_default().await;
    assert_eq!(contact.email, "care@soil2spoon.in");

    let shipping = api.shipping_policy_or_default().await;
    assert_eq!(shipping, ShippingPolicy::default());

    let faqs = api.faqs_or_default().await;
    assert_eq!(faqs.len(), 1);
}

// =============================================================================
// Address Tests
// =============================================================================

#[tokio::test]
async fn test_address_book_round_trip() {
    let stub = StubBackend::start().await;
    let storefront = signed_in(&stub, "asha@soil2spoon.in", "masala123").await;
    let api = storefront.api();

    let created = api.create_address(&home()).await.expect("create");
    assert!(created.is_default);
    assert_eq!(api.list_addresses().await.expect("list").len(), 1);

    api.delete_address(created.id).await.expect("delete");
    assert!(api.list_addresses().await.expect("list").is_empty());
}
