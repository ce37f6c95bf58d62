//! Checkout route handlers.
//!
//! Flow: `GET /checkout` shows the customer form, `POST /checkout` validates
//! it locally and asks the payment function for a hosted payment page, then
//! redirects there. The provider sends the visitor back to
//! `/checkout/success?order={ref}` or `/checkout/cancel`.
//!
//! Each payment attempt stores a fresh order reference in the session and
//! embeds it in the success URL. The order is only confirmed when the
//! returning reference matches the stored one.
//!
//! The submission handler never retries and holds a per-session guard while
//! the remote call is outstanding.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use manipedi_core::{
    Cart, CheckoutError, CheckoutFlow, CheckoutStage, CustomerErrors, CustomerForm,
};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::Flash;
use crate::models::session::{
    load_cart, load_flow, new_order_ref, pending_order_ref, push_flash, save_cart, save_flow,
    take_order_ref,
};
use crate::routes::Page;
use crate::state::{AppState, CheckoutGuard};

const CART_PATH: &str = "/cart";
const CHECKOUT_PATH: &str = "/checkout";

/// Shown when the payment function cannot be reached or refuses the request.
const PAYMENT_FAILED: &str =
    "No hemos podido iniciar el pago. Inténtalo de nuevo en unos minutos.";

/// Checkout form template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutTemplate {
    pub page: Page,
    /// Values as entered, echoed back on errors.
    pub form: CustomerForm,
    pub errors: CustomerErrors,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub page: Page,
}

/// Query string of the provider's success return.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub order: Option<String>,
}

/// Success URL for the payment attempt identified by `order_ref`.
fn success_path(order_ref: &str) -> String {
    format!("/checkout/success?order={order_ref}")
}

/// Whether a success return belongs to the pending payment attempt.
fn is_pending_order(pending: Option<&str>, returned: Option<&str>) -> bool {
    matches!((pending, returned), (Some(p), Some(r)) if !p.is_empty() && p == r)
}

/// Move the flow into the checkout stage for `cart`.
///
/// A flow left in `Success` by an earlier order is restarted first.
fn enter_checkout(flow: &mut CheckoutFlow, cart: &Cart) -> std::result::Result<(), CheckoutError> {
    if flow.stage() == CheckoutStage::Success {
        flow.restart();
    }
    flow.begin(cart)
}

/// Display the customer form.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let mut flow = load_flow(&session).await?;

    if enter_checkout(&mut flow, &cart).is_err() {
        return Ok(Redirect::to(CART_PATH).into_response());
    }
    save_flow(&session, &flow).await?;

    let page = Page::load(&state, &session, nonce, "Finalizar Compra", CHECKOUT_PATH).await?;
    Ok(CheckoutTemplate {
        page,
        form: CustomerForm::default(),
        errors: CustomerErrors::default(),
    }
    .into_response())
}

/// Claim the per-session checkout guard.
///
/// A session without an id has never been saved, so it cannot have a cart
/// and has nothing to guard.
fn claim_guard(state: &AppState, session: &Session) -> Result<Option<CheckoutGuard>> {
    let Some(id) = session.id() else {
        return Ok(None);
    };

    state
        .checkouts()
        .try_begin(&id.to_string())
        .map(Some)
        .ok_or_else(|| AppError::Conflict("checkout already in progress".to_string()))
}

/// Submit the customer form and redirect to the hosted payment page.
#[instrument(skip(state, session, nonce, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<CustomerForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to(CART_PATH).into_response());
    }

    let _guard = claim_guard(&state, &session)?;

    let mut flow = load_flow(&session).await?;
    if flow.stage() != CheckoutStage::Checkout {
        enter_checkout(&mut flow, &cart).map_err(|e| AppError::BadRequest(e.to_string()))?;
        save_flow(&session, &flow).await?;
    }

    let mut request = match flow.prepare(&cart, &form) {
        Ok((_, request)) => request,
        Err(CheckoutError::InvalidCustomer(errors)) => {
            tracing::debug!(?errors, "Customer details rejected");
            let page = Page::load(&state, &session, nonce, "Finalizar Compra", CHECKOUT_PATH).await?;
            return Ok(render_form(page, form, errors, StatusCode::UNPROCESSABLE_ENTITY));
        }
        Err(CheckoutError::MissingPriceReference { item_name }) => {
            tracing::warn!(item = %item_name, "Cart item has no price reference");
            let mut page =
                Page::load(&state, &session, nonce, "Finalizar Compra", CHECKOUT_PATH).await?;
            page.flash(Flash::error(format!(
                "«{item_name}» no está disponible para pago online. \
                 Elimínalo del carrito para continuar."
            )));
            return Ok(render_form(
                page,
                form,
                CustomerErrors::default(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ));
        }
        Err(CheckoutError::EmptyCart) => return Ok(Redirect::to(CART_PATH).into_response()),
        Err(e @ CheckoutError::InvalidTransition { .. }) => {
            return Err(AppError::BadRequest(e.to_string()));
        }
    };

    let order_ref = new_order_ref(&session).await?;
    let config = state.config();
    request = request.with_return_urls(
        config.absolute_url(&success_path(&order_ref)),
        config.absolute_url("/checkout/cancel"),
    );

    add_breadcrumb("checkout", "Creating payment session", None);

    match state.payments().create_session(&request).await {
        Ok(payment) => {
            tracing::info!(lines = request.items.len(), "Redirecting to payment page");
            Ok(Redirect::to(&payment.url).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Payment session creation failed");
            let mut page =
                Page::load(&state, &session, nonce, "Finalizar Compra", CHECKOUT_PATH).await?;
            page.flash(Flash::error(PAYMENT_FAILED));
            Ok(render_form(
                page,
                form,
                CustomerErrors::default(),
                StatusCode::BAD_GATEWAY,
            ))
        }
    }
}

fn render_form(
    page: Page,
    form: CustomerForm,
    errors: CustomerErrors,
    status: StatusCode,
) -> Response {
    (status, CheckoutTemplate { page, form, errors }).into_response()
}

/// Provider return URL after a completed payment.
///
/// Clears the cart and finishes the flow. Arriving here without the
/// reference of the pending payment attempt, or without an active checkout,
/// goes back home and leaves the cart alone.
#[instrument(skip(state, session, nonce, query))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Query(query): Query<SuccessQuery>,
) -> Result<Response> {
    let pending = pending_order_ref(&session).await?;
    if !is_pending_order(pending.as_deref(), query.order.as_deref()) {
        tracing::warn!("Success return without a matching order reference");
        return Ok(Redirect::to("/").into_response());
    }

    let mut flow = load_flow(&session).await?;
    if let Err(e) = flow.complete() {
        tracing::debug!(error = %e, "Success return without an active checkout");
        return Ok(Redirect::to("/").into_response());
    }
    take_order_ref(&session).await?;

    let mut cart = load_cart(&session).await?;
    if !cart.is_empty() {
        tracing::info!(total = %cart.total().display(), "Checkout completed");
    }
    cart.clear();
    cart.set_open(false);
    save_cart(&session, &cart).await?;
    save_flow(&session, &flow).await?;

    let page = Page::load(
        &state,
        &session,
        nonce,
        "Pedido confirmado",
        "/checkout/success",
    )
    .await?;
    Ok(CheckoutSuccessTemplate { page }.into_response())
}

/// Provider return URL after an abandoned payment, also the form's way back
/// to the cart. The cart is kept as it was.
#[instrument(skip(session))]
pub async fn cancel(session: Session) -> Result<Redirect> {
    let mut flow = load_flow(&session).await?;
    let was_checkout = flow.stage() == CheckoutStage::Checkout;

    if flow.back_to_cart().is_ok() {
        save_flow(&session, &flow).await?;
    }
    // An abandoned attempt can no longer be confirmed
    take_order_ref(&session).await?;
    if was_checkout {
        push_flash(
            &session,
            Flash::info("Pago cancelado. Tu carrito sigue guardado."),
        )
        .await?;
    }

    Ok(Redirect::to(CART_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use manipedi_core::{CartItem, Price, ProductId};

    use super::*;

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(CartItem::new(
            ProductId::from("p1"),
            "Esmalte Gel Premium",
            Price::from_cents(1499),
            "",
            Some("price_123".to_string()),
        ));
        cart
    }

    #[test]
    fn test_enter_checkout_restarts_finished_flow() {
        let cart = cart();
        let mut flow = CheckoutFlow::new();
        flow.begin(&cart).unwrap();
        flow.complete().unwrap();

        enter_checkout(&mut flow, &cart).unwrap();
        assert_eq!(flow.stage(), CheckoutStage::Checkout);
    }

    #[test]
    fn test_enter_checkout_refuses_empty_cart() {
        let mut flow = CheckoutFlow::new();
        assert!(matches!(
            enter_checkout(&mut flow, &Cart::new()),
            Err(CheckoutError::EmptyCart)
        ));
        assert_eq!(flow.stage(), CheckoutStage::Cart);
    }

    #[test]
    fn test_success_path_carries_order_ref() {
        assert_eq!(success_path("abc123"), "/checkout/success?order=abc123");
    }

    #[test]
    fn test_success_return_requires_matching_order() {
        assert!(is_pending_order(Some("abc123"), Some("abc123")));
        assert!(!is_pending_order(Some("abc123"), Some("other")));
        assert!(!is_pending_order(Some("abc123"), None));
        assert!(!is_pending_order(None, Some("abc123")));
        assert!(!is_pending_order(None, None));
        assert!(!is_pending_order(Some(""), Some("")));
    }
}
