//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutation is a plain form
//! post answered with a `303` back to the page it came from, so the site
//! works without JavaScript.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use manipedi_core::{CheckoutStage, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::Flash;
use crate::models::session::{load_cart, load_flow, push_flash, save_cart, save_flow};
use crate::routes::{Page, safe_return};
use crate::state::AppState;

/// Default redirect target for cart forms.
const CART_PATH: &str = "/cart";

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

/// Update cart form data.
///
/// The quantity is parsed as a signed integer so that `0` and negative
/// values reach the cart (which ignores them) instead of failing the form.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
    pub return_to: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

/// Forms that only carry a return path.
#[derive(Debug, Deserialize)]
pub struct ReturnForm {
    pub return_to: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: Page,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse> {
    let page = Page::load(&state, &session, nonce, "Tu Carrito", CART_PATH).await?;
    Ok(CartShowTemplate { page })
}

/// Add a product to the cart and open the drawer.
///
/// The line is built from the catalog, never from client-supplied prices.
/// Adding after a completed order starts a fresh checkout flow.
#[instrument(skip(state, session, form), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let id = ProductId::from(form.product_id.as_str());
    let product = state
        .catalog()
        .product(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let mut cart = load_cart(&session).await?;
    cart.add_item(product.to_cart_item());
    cart.set_open(true);
    save_cart(&session, &cart).await?;

    let mut flow = load_flow(&session).await?;
    if flow.stage() == CheckoutStage::Success {
        flow.restart();
        save_flow(&session, &flow).await?;
    }

    push_flash(
        &session,
        Flash::success(format!("«{}» añadido al carrito", product.name)),
    )
    .await?;

    tracing::info!(count = cart.item_count(), "Item added to cart");
    Ok(Redirect::to(&safe_return(form.return_to.as_deref(), CART_PATH)))
}

/// Set a line's quantity. Values below 1 and unknown ids are ignored.
#[instrument(skip(session, form), fields(product_id = %form.product_id, quantity = form.quantity))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;

    let changed = u32::try_from(form.quantity)
        .is_ok_and(|qty| cart.update_quantity(&ProductId::from(form.product_id.as_str()), qty));
    if changed {
        save_cart(&session, &cart).await?;
    } else {
        tracing::debug!("Quantity update ignored");
    }

    Ok(Redirect::to(&safe_return(form.return_to.as_deref(), CART_PATH)))
}

/// Remove a line. Removing an absent line is not an error.
#[instrument(skip(session, form), fields(product_id = %form.product_id))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;
    if cart.remove_item(&ProductId::from(form.product_id.as_str())) {
        save_cart(&session, &cart).await?;
    }

    Ok(Redirect::to(&safe_return(form.return_to.as_deref(), CART_PATH)))
}

/// Empty the cart.
#[instrument(skip(session, form))]
pub async fn clear(session: Session, Form(form): Form<ReturnForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;

    Ok(Redirect::to(&safe_return(form.return_to.as_deref(), CART_PATH)))
}

/// Show the cart drawer.
#[instrument(skip(session, form))]
pub async fn open(session: Session, Form(form): Form<ReturnForm>) -> Result<Redirect> {
    set_drawer(&session, true).await?;
    Ok(Redirect::to(&safe_return(form.return_to.as_deref(), CART_PATH)))
}

/// Hide the cart drawer.
#[instrument(skip(session, form))]
pub async fn close(session: Session, Form(form): Form<ReturnForm>) -> Result<Redirect> {
    set_drawer(&session, false).await?;
    Ok(Redirect::to(&safe_return(form.return_to.as_deref(), "/")))
}

async fn set_drawer(session: &Session, open: bool) -> Result<()> {
    let mut cart = load_cart(session).await?;
    if cart.is_open() != open {
        cart.set_open(open);
        save_cart(session, &cart).await?;
    }
    Ok(())
}

/// Get cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}
