//! Pages keep rendering from the bundled catalog when the store is down.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use manipedi_core::CatalogTable;
use manipedi_integration_tests::{FakeGateway, FakeStore, TestApp};

const PAGES: [&str; 6] = ["/", "/servicios", "/galeria", "/tienda", "/equipo", "/contacto"];

#[tokio::test]
async fn test_every_page_renders_when_store_fails() {
    let app = TestApp::new(FakeStore::failing(), FakeGateway::default());
    let visitor = app.visitor();

    for path in PAGES {
        let page = visitor.get(path).await;
        assert_eq!(page.status, StatusCode::OK, "{path}");
    }

    let shop = visitor.get("/tienda").await;
    assert!(shop.body.contains("Esmalte Gel Premium"));
    assert!(shop.body.contains("Base Fortalecedora"));

    let team = visitor.get("/equipo").await;
    assert!(team.body.contains("Ana María López"));
}

#[tokio::test]
async fn test_store_rows_replace_bundled_catalog() {
    let store = FakeStore::default();
    store.set_rows(
        CatalogTable::Services,
        serde_json::json!([{
            "id": 42,
            "name": "Manicura Rusa",
            "description": "Técnica en seco",
            "price": 40,
            "duration": "75 min",
            "category": "manicura"
        }]),
    );
    let app = TestApp::new(store, FakeGateway::default());
    let visitor = app.visitor();

    let page = visitor.get("/servicios").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Manicura Rusa"));
    assert!(page.body.contains("40€"));
    assert!(!page.body.contains("Pedicura Spa"));
}

#[tokio::test]
async fn test_service_category_filter() {
    let app = TestApp::new(FakeStore::failing(), FakeGateway::default());
    let visitor = app.visitor();

    let page = visitor.get("/servicios?category=pedicura").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Pedicura Spa"));
    assert!(!page.body.contains("Manicura Gel"));

    let unknown = visitor.get("/servicios?category=peluqueria").await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert!(unknown.body.contains("Manicura Gel"));
    assert!(unknown.body.contains("Pedicura Spa"));
}

#[tokio::test]
async fn test_shop_add_works_from_bundled_catalog() {
    let app = TestApp::new(FakeStore::failing(), FakeGateway::default());
    let visitor = app.visitor();

    let response = visitor.add_to_cart("p1").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let count = visitor.get("/cart/count").await;
    assert!(count.body.contains(">1</span>"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let healthy = TestApp::payable();
    let visitor = healthy.visitor();
    assert_eq!(visitor.get("/health").await.status, StatusCode::OK);
    assert_eq!(visitor.get("/health/ready").await.status, StatusCode::OK);

    let failing = TestApp::new(FakeStore::failing(), FakeGateway::default());
    let visitor = failing.visitor();
    assert_eq!(visitor.get("/health").await.status, StatusCode::OK);
    assert_eq!(
        visitor.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::payable();
    let page = app.visitor().get("/").await;

    assert!(page.headers.contains_key("content-security-policy"));
    assert!(page.headers.contains_key("x-request-id"));
    assert_eq!(
        page.headers
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}
