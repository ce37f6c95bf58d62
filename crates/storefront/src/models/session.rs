//! Session-stored state: the cart, the checkout stage and flash messages.
//!
//! Handlers load, mutate and save these within one request. Nothing here is
//! shared between sessions.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use manipedi_core::{Cart, CheckoutFlow};

/// Session keys.
pub mod keys {
    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for the checkout stage machine.
    pub const CHECKOUT_FLOW: &str = "checkout_flow";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";

    /// Key for the reference of the payment attempt awaiting its return.
    pub const ORDER_REF: &str = "order_ref";
}

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

/// One-shot notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "toast--success",
            FlashKind::Info => "toast--info",
            FlashKind::Error => "toast--error",
        }
    }

    /// ARIA role: errors interrupt, the rest are polite.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self.kind {
            FlashKind::Error => "alert",
            FlashKind::Success | FlashKind::Info => "status",
        }
    }
}

/// Load the cart, or an empty one for a new session.
///
/// # Errors
///
/// Returns an error if the session store fails or the stored value is corrupt.
pub async fn load_cart(session: &Session) -> Result<Cart, SessionError> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), SessionError> {
    session.insert(keys::CART, cart).await
}

/// Load the checkout flow, starting in the cart stage.
///
/// # Errors
///
/// Returns an error if the session store fails or the stored value is corrupt.
pub async fn load_flow(session: &Session) -> Result<CheckoutFlow, SessionError> {
    Ok(session
        .get::<CheckoutFlow>(keys::CHECKOUT_FLOW)
        .await?
        .unwrap_or_default())
}

/// Persist the checkout flow.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_flow(session: &Session, flow: &CheckoutFlow) -> Result<(), SessionError> {
    session.insert(keys::CHECKOUT_FLOW, flow).await
}

/// Queue a flash message for the next page render.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push_flash(session: &Session, flash: Flash) -> Result<(), SessionError> {
    let mut pending = session
        .get::<Vec<Flash>>(keys::FLASH)
        .await?
        .unwrap_or_default();
    pending.push(flash);
    session.insert(keys::FLASH, pending).await
}

/// Start a payment attempt: store and return a fresh order reference.
///
/// The reference travels in the provider's success URL and must come back
/// unchanged for the order to be confirmed. A newer attempt replaces an
/// older one.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn new_order_ref(session: &Session) -> Result<String, SessionError> {
    let order_ref = uuid::Uuid::new_v4().simple().to_string();
    session.insert(keys::ORDER_REF, &order_ref).await?;
    Ok(order_ref)
}

/// The pending order reference, if a payment attempt was started.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn pending_order_ref(session: &Session) -> Result<Option<String>, SessionError> {
    session.get::<String>(keys::ORDER_REF).await
}

/// Remove and return the pending order reference.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn take_order_ref(session: &Session) -> Result<Option<String>, SessionError> {
    session.remove::<String>(keys::ORDER_REF).await
}

/// Remove and return queued flash messages.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, SessionError> {
    Ok(session
        .remove::<Vec<Flash>>(keys::FLASH)
        .await?
        .unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use manipedi_core::{CartItem, CheckoutStage, Price, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_new_session_has_empty_cart_and_cart_stage() {
        let session = session();

        assert!(load_cart(&session).await.unwrap().is_empty());
        assert_eq!(
            load_flow(&session).await.unwrap().stage(),
            CheckoutStage::Cart
        );
    }

    #[tokio::test]
    async fn test_cart_roundtrip() {
        let session = session();
        let mut cart = Cart::new();
        cart.add_item(CartItem::new(
            ProductId::from("p1"),
            "Esmalte Gel Premium",
            Price::from_cents(1499),
            "",
            None,
        ));

        save_cart(&session, &cart).await.unwrap();
        assert_eq!(load_cart(&session).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once() {
        let session = session();
        push_flash(&session, Flash::success("Añadido")).await.unwrap();
        push_flash(&session, Flash::error("Fallo")).await.unwrap();

        let flashes = take_flashes(&session).await.unwrap();
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[1].role(), "alert");
        assert!(take_flashes(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_ref_is_replaced_and_taken_once() {
        let session = session();
        let first = new_order_ref(&session).await.unwrap();
        let second = new_order_ref(&session).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(
            pending_order_ref(&session).await.unwrap().as_deref(),
            Some(second.as_str())
        );

        assert_eq!(take_order_ref(&session).await.unwrap(), Some(second));
        assert_eq!(take_order_ref(&session).await.unwrap(), None);
    }
}
