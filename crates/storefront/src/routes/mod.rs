//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /servicios              - Services grid (?category=)
//! GET  /galeria                - Gallery grid
//! GET  /tienda                 - Shop with add-to-cart forms
//! GET  /equipo                 - Team cards
//! GET  /contacto               - Contact details and opening hours
//!
//! # Health
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (pings the table store)
//!
//! # Cart (form posts, 303 back to `return_to`)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a product (opens the drawer)
//! POST /cart/update            - Set a line quantity
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//! POST /cart/open              - Show the drawer
//! POST /cart/close             - Hide the drawer
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Customer form
//! POST /checkout               - Create payment session, 303 to provider
//! GET  /checkout/success       - Provider return: order placed
//! GET  /checkout/cancel        - Provider return: back to the cart
//! ```

pub mod cart;
pub mod checkout;
pub mod contact;
pub mod gallery;
pub mod health;
pub mod home;
pub mod services;
pub mod shop;
pub mod team;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use manipedi_core::{Cart, CartItem};

use crate::config::SalonInfo;
use crate::error::AppError;
use crate::middleware::{cart_rate_limiter, checkout_rate_limiter};
use crate::models::Flash;
use crate::models::session::{load_cart, take_flashes};
use crate::state::AppState;

// =============================================================================
// Layout Context
// =============================================================================

/// Navbar entry.
#[derive(Debug, Clone, Copy)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
}

/// Navbar entries, in display order.
pub const NAV_LINKS: &[NavLink] = &[
    NavLink {
        href: "/",
        label: "Inicio",
    },
    NavLink {
        href: "/servicios",
        label: "Servicios",
    },
    NavLink {
        href: "/galeria",
        label: "Galería",
    },
    NavLink {
        href: "/tienda",
        label: "Tienda",
    },
    NavLink {
        href: "/equipo",
        label: "Equipo",
    },
    NavLink {
        href: "/contacto",
        label: "Contacto",
    },
];

/// Data every page layout needs: navbar, cart drawer, flashes and footer.
#[derive(Debug, Clone)]
pub struct Page {
    pub title: String,
    /// Path of the current page; also the `return_to` for cart forms.
    pub path: String,
    pub nonce: String,
    pub cart: CartView,
    pub flashes: Vec<Flash>,
    pub salon: SalonInfo,
}

impl Page {
    /// Build the layout context, consuming pending flash messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(
        state: &AppState,
        session: &Session,
        nonce: String,
        title: &str,
        path: &str,
    ) -> Result<Self, AppError> {
        let cart = load_cart(session).await?;
        let flashes = take_flashes(session).await?;

        Ok(Self {
            title: title.to_string(),
            path: path.to_string(),
            nonce,
            cart: CartView::from(&cart),
            flashes,
            salon: state.config().salon.clone(),
        })
    }

    /// Add a flash raised during this request.
    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    #[must_use]
    pub fn nav_links(&self) -> &'static [NavLink] {
        NAV_LINKS
    }

    /// Whether a navbar entry points at the current page.
    #[must_use]
    pub fn is_active(&self, href: &str) -> bool {
        self.path == href
    }
}

// =============================================================================
// Cart View
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    /// Quantity the minus control submits; the control is disabled at 1.
    pub decrement: u32,
    pub increment: u32,
    pub can_decrement: bool,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        let quantity = item.quantity();
        Self {
            id: item.id().as_str().to_string(),
            name: item.name().to_string(),
            image: item.image().to_string(),
            quantity,
            price: item.price().display(),
            line_price: item.line_total().display(),
            decrement: quantity.saturating_sub(1).max(1),
            increment: quantity.saturating_add(1),
            can_decrement: quantity > 1,
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    pub is_open: bool,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            subtotal: cart.total().display(),
            item_count: cart.item_count(),
            is_open: cart.is_open(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolve a form's `return_to` to a local path, defaulting to `fallback`.
///
/// Only same-origin absolute paths are accepted so the redirect cannot be
/// pointed at another host.
#[must_use]
pub fn safe_return(return_to: Option<&str>, fallback: &str) -> String {
    match return_to.map(str::trim) {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/open", post(cart::open))
        .route("/close", post(cart::close))
        // Only the mutations above are limited
        .route_layer(cart_rate_limiter())
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout",
            get(checkout::show).merge(post(checkout::submit).layer(checkout_rate_limiter())),
        )
        .route("/checkout/success", get(checkout::success))
        .route("/checkout/cancel", get(checkout::cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Marketing pages
        .route("/", get(home::home))
        .route("/servicios", get(services::index))
        .route("/galeria", get(gallery::index))
        .route("/tienda", get(shop::index))
        .route("/equipo", get(team::index))
        .route("/contacto", get(contact::index))
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Cart
        .nest("/cart", cart_routes())
        // Checkout and provider return URLs
        .merge(checkout_routes())
}

#[cfg(test)]
mod tests {
    use manipedi_core::{Price, ProductId};

    use super::*;

    #[test]
    fn test_safe_return_accepts_local_paths() {
        assert_eq!(safe_return(Some("/tienda"), "/cart"), "/tienda");
        assert_eq!(
            safe_return(Some("/servicios?category=pedicura"), "/cart"),
            "/servicios?category=pedicura"
        );
    }

    #[test]
    fn test_safe_return_rejects_foreign_targets() {
        assert_eq!(safe_return(Some("https://evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return(Some("//evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return(Some("/\\evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return(None, "/cart"), "/cart");
    }

    #[test]
    fn test_cart_view_formats_totals() {
        let mut cart = Cart::new();
        let item = CartItem::new(
            ProductId::from("p1"),
            "Esmalte Gel Premium",
            Price::from_cents(1499),
            "",
            None,
        );
        cart.add_item(item.clone());
        cart.add_item(item);

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "29.98€");

        let line = &view.items[0];
        assert_eq!(line.line_price, "29.98€");
        assert!(line.can_decrement);
        assert_eq!(line.decrement, 1);
        assert_eq!(line.increment, 3);
    }

    #[test]
    fn test_single_unit_cannot_decrement() {
        let mut cart = Cart::new();
        cart.add_item(CartItem::new(
            ProductId::from("p2"),
            "Aceite de Cutícula",
            Price::from_cents(899),
            "",
            None,
        ));

        let line = &CartView::from(&cart).items[0];
        assert!(!line.can_decrement);
        assert_eq!(line.decrement, 1);
    }
}
