//! Checkout over HTTP: validation, payment handoff, and return handling.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::StatusCode;
use tokio::sync::Notify;

use manipedi_integration_tests::{
    BASE_URL, FakeGateway, FakeStore, GatewayMode, PAYMENT_URL, TestApp, payable_products,
};

const VALID_CUSTOMER: [(&str, &str); 2] = [("name", "Ana López"), ("email", "ana@example.com")];

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_cart() {
    let app = TestApp::payable();
    let visitor = app.visitor();

    let page = visitor.get("/checkout").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/cart"));

    let submit = visitor.post_form("/checkout", &VALID_CUSTOMER).await;
    assert_eq!(submit.status, StatusCode::SEE_OTHER);
    assert_eq!(submit.location(), Some("/cart"));
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_checkout_form_shows_total() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.add_to_cart("p1").await;

    let page = visitor.get("/checkout").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Pagar 29.98€"), "body: {}", page.body);
}

#[tokio::test]
async fn test_invalid_customer_is_rejected_without_payment_call() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.get("/checkout").await;

    let response = visitor
        .post_form("/checkout", &[("name", "Al"), ("email", "not-an-email")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .body
            .contains("El nombre debe tener al menos 3 caracteres")
    );
    assert!(response.body.contains("Introduce un email válido"));
    assert!(response.body.contains("value=\"not-an-email\""));
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_missing_email_message() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;

    let response = visitor
        .post_form("/checkout", &[("name", "Ana López"), ("email", "  ")])
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("El email es obligatorio"));
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_item_without_price_reference_blocks_payment() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.add_to_cart("p3").await;

    let response = visitor.post_form("/checkout", &VALID_CUSTOMER).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .body
            .contains("«Kit Manicura en Casa» no está disponible para pago online")
    );
    assert_eq!(app.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_valid_checkout_redirects_to_payment_page() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.add_to_cart("p1").await;
    visitor.add_to_cart("p2").await;

    let response = visitor
        .post_form(
            "/checkout",
            &[("name", "  Ana López "), ("email", "ana@example.com")],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some(PAYMENT_URL));
    assert_eq!(app.gateway.call_count(), 1);

    let request = app.gateway.last_request().unwrap();
    assert_eq!(request.customer_name, "Ana López");
    assert_eq!(request.customer_email, "ana@example.com");
    assert_eq!(request.items.len(), 2);
    assert_eq!(request.items[0].price_ref, "price_gel");
    assert_eq!(request.items[0].quantity, 2);
    assert_eq!(request.items[1].price_ref, "price_oil");
    assert_eq!(request.items[1].quantity, 1);
    let success_url = request.success_url.unwrap();
    let order = success_url
        .strip_prefix(&format!("{BASE_URL}/checkout/success?order="))
        .unwrap();
    assert!(!order.is_empty());
    assert_eq!(
        request.cancel_url.as_deref(),
        Some(format!("{BASE_URL}/checkout/cancel").as_str())
    );
}

#[tokio::test]
async fn test_gateway_failure_keeps_form_values() {
    let app = TestApp::new(
        FakeStore::with_products(payable_products()),
        FakeGateway::new(GatewayMode::Reject("No such price".to_string())),
    );
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;

    let response = visitor.post_form("/checkout", &VALID_CUSTOMER).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.body.contains("No hemos podido iniciar el pago"));
    assert!(response.body.contains("value=\"Ana López\""));
    assert!(response.body.contains("value=\"ana@example.com\""));
    assert!(!response.body.contains("No such price"));
    assert_eq!(app.gateway.call_count(), 1);

    // The cart survives a failed attempt
    let count = visitor.get("/cart/count").await;
    assert!(count.body.contains(">1</span>"));
}

#[tokio::test]
async fn test_success_return_clears_cart() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.post_form("/checkout", &VALID_CUSTOMER).await;

    let success_path = app.success_return_path();
    let page = visitor.get(&success_path).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("¡Gracias por tu compra!"));

    let count = visitor.get("/cart/count").await;
    assert!(count.body.contains(">0</span>"));

    // The reference is spent; a reload goes home
    let reload = visitor.get(&success_path).await;
    assert_eq!(reload.status, StatusCode::SEE_OTHER);
    assert_eq!(reload.location(), Some("/"));
}

#[tokio::test]
async fn test_success_requires_the_pending_order_reference() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;

    // Opening the form enters the checkout stage without paying
    assert_eq!(visitor.get("/checkout").await.status, StatusCode::OK);
    let forged = visitor.get("/checkout/success").await;
    assert_eq!(forged.status, StatusCode::SEE_OTHER);
    assert_eq!(forged.location(), Some("/"));

    visitor.post_form("/checkout", &VALID_CUSTOMER).await;
    let guessed = visitor.get("/checkout/success?order=guessed").await;
    assert_eq!(guessed.status, StatusCode::SEE_OTHER);
    assert_eq!(guessed.location(), Some("/"));

    let count = visitor.get("/cart/count").await;
    assert!(count.body.contains(">1</span>"));

    // The genuine return still works after the failed attempts
    let page = visitor.get(&app.success_return_path()).await;
    assert_eq!(page.status, StatusCode::OK);
}

#[tokio::test]
async fn test_order_reference_is_not_shared_between_visitors() {
    let app = TestApp::payable();
    let alice = app.visitor();
    alice.add_to_cart("p1").await;
    alice.post_form("/checkout", &VALID_CUSTOMER).await;
    let alice_return = app.success_return_path();

    let bob = app.visitor();
    bob.add_to_cart("p2").await;
    bob.get("/checkout").await;
    let page = bob.get(&alice_return).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);

    let count = bob.get("/cart/count").await;
    assert!(count.body.contains(">1</span>"));
}

#[tokio::test]
async fn test_cancelled_attempt_cannot_be_confirmed() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.post_form("/checkout", &VALID_CUSTOMER).await;
    let stale_return = app.success_return_path();

    visitor.get("/checkout/cancel").await;
    visitor.get("/checkout").await;

    let page = visitor.get(&stale_return).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/"));
}

#[tokio::test]
async fn test_success_without_checkout_redirects_home() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;

    let page = visitor.get("/checkout/success").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location(), Some("/"));

    let count = visitor.get("/cart/count").await;
    assert!(count.body.contains(">1</span>"));
}

#[tokio::test]
async fn test_cancel_return_keeps_cart() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.post_form("/checkout", &VALID_CUSTOMER).await;

    let response = visitor.get("/checkout/cancel").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/cart"));

    let cart = visitor.get("/cart").await;
    assert!(cart.body.contains("Pago cancelado. Tu carrito sigue guardado."));
    assert!(cart.body.contains("Esmalte Gel Premium"));
}

#[tokio::test]
async fn test_adding_after_success_starts_new_order() {
    let app = TestApp::payable();
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;
    visitor.post_form("/checkout", &VALID_CUSTOMER).await;
    let confirmed = visitor.get(&app.success_return_path()).await;
    assert_eq!(confirmed.status, StatusCode::OK);

    visitor.add_to_cart("p2").await;
    let page = visitor.get("/checkout").await;
    assert_eq!(page.status, StatusCode::OK);

    let response = visitor.post_form("/checkout", &VALID_CUSTOMER).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(app.gateway.call_count(), 2);
    let request = app.gateway.last_request().unwrap();
    assert_eq!(request.items.len(), 1);
    assert_eq!(request.items[0].price_ref, "price_oil");
}

#[tokio::test]
async fn test_concurrent_submission_is_refused() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let app = TestApp::new(
        FakeStore::with_products(payable_products()),
        FakeGateway::new(GatewayMode::Block {
            started: started.clone(),
            release: release.clone(),
        }),
    );
    let visitor = app.visitor();
    visitor.add_to_cart("p1").await;

    let first = tokio::spawn({
        let visitor = visitor.clone();
        async move { visitor.post_form("/checkout", &VALID_CUSTOMER).await }
    });
    started.notified().await;

    let second = visitor.post_form("/checkout", &VALID_CUSTOMER).await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    release.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first.status, StatusCode::SEE_OTHER);
    assert_eq!(app.gateway.call_count(), 1);
}

#[tokio::test]
async fn test_checkout_without_proxy_headers() {
    let app = TestApp::payable();
    let visitor = app.direct_visitor();
    visitor.add_to_cart("p1").await;

    let response = visitor.post_form("/checkout", &VALID_CUSTOMER).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "body: {}", response.body);
    assert_eq!(response.location(), Some(PAYMENT_URL));
    assert_eq!(app.gateway.call_count(), 1);
}
