//! Integration tests for the Mani Pedi storefront.
//!
//! Tests drive the real axum router in-process with
//! [`tower::ServiceExt::oneshot`]. The hosted table store and the payment
//! function are replaced by the in-memory fakes below, so no network or
//! credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p manipedi-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode, header};
use secrecy::SecretString;
use tokio::sync::Notify;
use tower::ServiceExt;

use manipedi_core::{CatalogTable, CheckoutSessionRequest, SortOrder};
use manipedi_storefront::catalog::{CatalogError, CatalogService, CatalogSnapshot, TableStore};
use manipedi_storefront::config::{SalonInfo, StorefrontConfig, SupabaseConfig};
use manipedi_storefront::payments::{PaymentError, PaymentGateway, PaymentSession};
use manipedi_storefront::state::AppState;

/// Base URL the test app believes it is served from.
pub const BASE_URL: &str = "http://localhost:3000";

/// Hosted payment page returned by the default gateway.
pub const PAYMENT_URL: &str = "https://checkout.stripe.com/c/pay/cs_test_123";

// =============================================================================
// Fake table store
// =============================================================================

/// In-memory table store.
///
/// Tables without rows answer with an empty array; when `failing` is set
/// every call answers like an unreachable store.
#[derive(Default)]
pub struct FakeStore {
    tables: Mutex<HashMap<CatalogTable, Vec<serde_json::Value>>>,
    failing: bool,
    selects: AtomicUsize,
}

impl FakeStore {
    /// Store holding the given products, everything else empty.
    #[must_use]
    pub fn with_products(products: serde_json::Value) -> Self {
        let store = Self::default();
        store.set_rows(CatalogTable::Products, products);
        store
    }

    /// Store that fails every request.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn set_rows(&self, table: CatalogTable, rows: serde_json::Value) {
        let rows = rows.as_array().cloned().unwrap_or_default();
        self.tables.lock().unwrap().insert(table, rows);
    }

    #[must_use]
    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableStore for FakeStore {
    async fn select(
        &self,
        table: CatalogTable,
        order: SortOrder,
    ) -> Result<Vec<serde_json::Value>, CatalogError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(CatalogError::Api {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }

        let mut rows = self
            .tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default();
        if order == SortOrder::Descending {
            rows.reverse();
        }
        Ok(rows)
    }

    async fn upsert(
        &self,
        table: CatalogTable,
        row: &serde_json::Value,
    ) -> Result<(), CatalogError> {
        if self.failing {
            return Err(CatalogError::Api {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .push(row.clone());
        Ok(())
    }
}

// =============================================================================
// Fake payment gateway
// =============================================================================

/// How the fake gateway answers.
pub enum GatewayMode {
    /// Answer with this hosted payment page.
    Redirect(String),
    /// Answer like a function that returned `{ error }`.
    Reject(String),
    /// Signal `started`, then wait for `release` before redirecting.
    Block {
        started: Arc<Notify>,
        release: Arc<Notify>,
    },
}

/// Payment gateway that records every request it receives.
pub struct FakeGateway {
    mode: GatewayMode,
    calls: AtomicUsize,
    requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl FakeGateway {
    #[must_use]
    pub const fn new(mode: GatewayMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_request(&self) -> Option<CheckoutSessionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new(GatewayMode::Redirect(PAYMENT_URL.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<PaymentSession, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match &self.mode {
            GatewayMode::Redirect(url) => Ok(PaymentSession { url: url.clone() }),
            GatewayMode::Reject(message) => Err(PaymentError::Rejected(message.clone())),
            GatewayMode::Block { started, release } => {
                started.notify_one();
                release.notified().await;
                Ok(PaymentSession {
                    url: PAYMENT_URL.to_string(),
                })
            }
        }
    }
}

// =============================================================================
// Test application
// =============================================================================

/// Configuration pointing at nothing real.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: BASE_URL.to_string(),
        supabase: SupabaseConfig {
            url: "http://supabase.invalid".to_string(),
            api_key: SecretString::from("test-key-not-used-by-fakes"),
            checkout_function: "create-checkout-session".to_string(),
        },
        http_timeout: Duration::from_secs(1),
        salon: SalonInfo::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Products with and without a payment price reference.
#[must_use]
pub fn payable_products() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "p1",
            "name": "Esmalte Gel Premium",
            "description": "Acabado espejo",
            "price": 14.99,
            "image": "https://images.unsplash.com/photo-1",
            "category": "Esmaltes",
            "stripe_price_id": "price_gel"
        },
        {
            "id": "p2",
            "name": "Aceite de Cutículas",
            "description": "Vitamina E",
            "price": "8.50",
            "image": "https://images.unsplash.com/photo-2",
            "stripe_price_id": "price_oil"
        },
        {
            "id": "p3",
            "name": "Kit Manicura en Casa",
            "description": "Todo lo necesario",
            "price": 34.99,
            "image": "https://images.unsplash.com/photo-3"
        }
    ])
}

/// Router plus handles on its fakes.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<FakeStore>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    #[must_use]
    pub fn new(store: FakeStore, gateway: FakeGateway) -> Self {
        let store = Arc::new(store);
        let gateway = Arc::new(gateway);

        let snapshot = CatalogSnapshot::bundled().unwrap();
        let catalog = CatalogService::new(store.clone(), snapshot);
        let state = AppState::new(test_config(), catalog, gateway.clone());

        Self {
            router: manipedi_storefront::app(state),
            store,
            gateway,
        }
    }

    /// App with payable products and a redirecting gateway.
    #[must_use]
    pub fn payable() -> Self {
        Self::new(
            FakeStore::with_products(payable_products()),
            FakeGateway::default(),
        )
    }

    /// A visitor behind a proxy that sets `x-forwarded-for`.
    #[must_use]
    pub fn visitor(&self) -> Visitor {
        Visitor {
            router: self.router.clone(),
            cookie: Arc::new(Mutex::new(None)),
            forwarded_for: Some("203.0.113.10".to_string()),
            peer: SocketAddr::from(([10, 0, 0, 1], 44321)),
        }
    }

    /// A visitor talking to the server directly, without proxy headers.
    #[must_use]
    pub fn direct_visitor(&self) -> Visitor {
        Visitor {
            router: self.router.clone(),
            cookie: Arc::new(Mutex::new(None)),
            forwarded_for: None,
            peer: SocketAddr::from(([127, 0, 0, 1], 51234)),
        }
    }

    /// Path and query of the success URL sent with the last payment request.
    #[must_use]
    pub fn success_return_path(&self) -> String {
        let request = self.gateway.last_request().unwrap();
        let url = request.success_url.unwrap();
        url.strip_prefix(BASE_URL).unwrap().to_string()
    }
}

// =============================================================================
// Visitor (cookie-carrying client)
// =============================================================================

/// Collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Browser stand-in: keeps the session cookie between requests.
///
/// Every request carries the peer address the way a server built with
/// `into_make_service_with_connect_info` would attach it.
#[derive(Clone)]
pub struct Visitor {
    router: Router,
    cookie: Arc<Mutex<Option<String>>>,
    forwarded_for: Option<String>,
    peer: SocketAddr,
}

impl Visitor {
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Add a product from the shop page.
    pub async fn add_to_cart(&self, product_id: &str) -> TestResponse {
        self.post_form(
            "/cart/add",
            &[("product_id", product_id), ("return_to", "/tienda")],
        )
        .await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .extension(ConnectInfo(self.peer));
        if let Some(ip) = self.forwarded_for.as_deref() {
            builder = builder.header("x-forwarded-for", ip);
        }
        if let Some(cookie) = self.cookie.lock().unwrap().as_deref() {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            && let Some(pair) = set_cookie.split(';').next()
        {
            *self.cookie.lock().unwrap() = Some(pair.trim().to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}
