//! Checkout stage machine and payment request mapping.
//!
//! ```text
//!   Cart ──begin──▶ Checkout ──complete──▶ Success
//!    ▲                 │
//!    └──back_to_cart───┘
//! ```
//!
//! `Success` is terminal for a flow. Starting a new purchase after success
//! goes through [`CheckoutFlow::restart`], which opens a fresh flow rather
//! than stepping backwards.
//!
//! [`CheckoutFlow::prepare`] performs every local check before the remote
//! payment call: customer validation first, then price-reference
//! completeness. Nothing here touches the network.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::customer::{CustomerErrors, CustomerForm, CustomerInfo};

/// Where the visitor is in the purchase flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    #[default]
    Cart,
    Checkout,
    Success,
}

impl CheckoutStage {
    /// Whether moving from `self` to `next` is allowed. Staying put is always
    /// allowed so page refreshes are harmless.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Cart, Self::Cart | Self::Checkout)
                | (Self::Checkout, _)
                | (Self::Success, Self::Success)
        )
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Checkout => "checkout",
            Self::Success => "success",
        }
    }
}

impl core::fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised before the payment provider is contacted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cannot move checkout from {from} to {to}")]
    InvalidTransition {
        from: CheckoutStage,
        to: CheckoutStage,
    },

    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid customer details: {0}")]
    InvalidCustomer(CustomerErrors),

    /// A cart line has no payment provider price reference.
    #[error("product '{item_name}' is not available for online payment")]
    MissingPriceReference { item_name: String },
}

/// One line of the payment session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLineItem {
    pub price_ref: String,
    pub quantity: u32,
}

/// Body sent to the remote session-creation function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub items: Vec<CheckoutLineItem>,
    pub customer_email: String,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

impl CheckoutSessionRequest {
    /// Attach the provider return URLs.
    #[must_use]
    pub fn with_return_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.success_url = Some(success_url.into());
        self.cancel_url = Some(cancel_url.into());
        self
    }
}

/// Per-session checkout progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFlow {
    stage: CheckoutStage,
}

impl CheckoutFlow {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stage: CheckoutStage::Cart,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> CheckoutStage {
        self.stage
    }

    const fn transition(&mut self, to: CheckoutStage) -> Result<(), CheckoutError> {
        if !self.stage.can_transition_to(to) {
            return Err(CheckoutError::InvalidTransition {
                from: self.stage,
                to,
            });
        }
        self.stage = to;
        Ok(())
    }

    /// Enter the checkout form. The cart must not be empty.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` for an empty cart, or `InvalidTransition` when the
    /// flow already finished.
    pub fn begin(&mut self, cart: &Cart) -> Result<(), CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.transition(CheckoutStage::Checkout)
    }

    /// Leave the form to edit the cart.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` once the flow reached `Success`.
    pub const fn back_to_cart(&mut self) -> Result<(), CheckoutError> {
        self.transition(CheckoutStage::Cart)
    }

    /// Mark the purchase paid, after the provider's return redirect.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the flow is in `Checkout` (or
    /// already `Success`).
    pub const fn complete(&mut self) -> Result<(), CheckoutError> {
        self.transition(CheckoutStage::Success)
    }

    /// Start a new flow, e.g. when a visitor shops again after paying.
    pub const fn restart(&mut self) {
        self.stage = CheckoutStage::Cart;
    }

    /// Run all local checks and build the payment session request.
    ///
    /// Order matters: customer details are validated first, then every line
    /// must carry a price reference. The first line missing one is named in
    /// the error.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the flow is not in `Checkout`
    /// - `EmptyCart` if there is nothing to pay for
    /// - `InvalidCustomer` with all field errors
    /// - `MissingPriceReference` naming the offending item
    pub fn prepare(
        &self,
        cart: &Cart,
        form: &CustomerForm,
    ) -> Result<(CustomerInfo, CheckoutSessionRequest), CheckoutError> {
        if self.stage != CheckoutStage::Checkout {
            return Err(CheckoutError::InvalidTransition {
                from: self.stage,
                to: CheckoutStage::Checkout,
            });
        }

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let customer = form.validate().map_err(CheckoutError::InvalidCustomer)?;

        let items = cart
            .items()
            .iter()
            .map(|item| {
                item.stripe_price_id()
                    .map(|price_ref| CheckoutLineItem {
                        price_ref: price_ref.to_owned(),
                        quantity: item.quantity(),
                    })
                    .ok_or_else(|| CheckoutError::MissingPriceReference {
                        item_name: item.name().to_owned(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let request = CheckoutSessionRequest {
            items,
            customer_email: customer.email.as_str().to_owned(),
            customer_name: customer.name.as_str().to_owned(),
            success_url: None,
            cancel_url: None,
        };

        Ok((customer, request))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::types::{Price, ProductId};

    fn cart_with(lines: &[(&str, &str, Option<&str>)]) -> Cart {
        let mut cart = Cart::new();
        for (id, name, price_ref) in lines {
            cart.add_item(CartItem::new(
                ProductId::from(*id),
                *name,
                Price::from_cents(1000),
                "",
                price_ref.map(ToString::to_string),
            ));
        }
        cart
    }

    fn valid_form() -> CustomerForm {
        CustomerForm {
            name: "Ana López".to_string(),
            email: "ana@gmail.com".to_string(),
        }
    }

    fn in_checkout(cart: &Cart) -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.begin(cart).unwrap();
        flow
    }

    #[test]
    fn test_transition_table() {
        use CheckoutStage::{Cart as C, Checkout as K, Success as S};

        assert!(C.can_transition_to(K));
        assert!(K.can_transition_to(C));
        assert!(K.can_transition_to(S));
        assert!(!C.can_transition_to(S));
        assert!(!S.can_transition_to(C));
        assert!(!S.can_transition_to(K));
        assert!(S.can_transition_to(S));
    }

    #[test]
    fn test_begin_requires_items() {
        let mut flow = CheckoutFlow::new();
        assert_eq!(flow.begin(&Cart::new()), Err(CheckoutError::EmptyCart));
        assert_eq!(flow.stage(), CheckoutStage::Cart);
    }

    #[test]
    fn test_success_is_terminal_until_restart() {
        let cart = cart_with(&[("p1", "Esmalte", Some("price_1"))]);
        let mut flow = in_checkout(&cart);
        flow.complete().unwrap();

        assert!(matches!(
            flow.back_to_cart(),
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert!(flow.begin(&cart).is_err());

        flow.restart();
        assert_eq!(flow.stage(), CheckoutStage::Cart);
    }

    #[test]
    fn test_complete_requires_checkout_stage() {
        let mut flow = CheckoutFlow::new();
        assert!(flow.complete().is_err());
    }

    #[test]
    fn test_prepare_maps_lines() {
        let mut cart = cart_with(&[
            ("p1", "Esmalte Gel Premium", Some("price_1")),
            ("p2", "Aceite de Cutículas", Some("price_2")),
        ]);
        cart.update_quantity(&ProductId::from("p2"), 3);
        let flow = in_checkout(&cart);

        let (customer, request) = flow.prepare(&cart, &valid_form()).unwrap();

        assert_eq!(customer.email.as_str(), "ana@gmail.com");
        assert_eq!(request.customer_name, "Ana López");
        assert_eq!(
            request.items,
            vec![
                CheckoutLineItem {
                    price_ref: "price_1".to_string(),
                    quantity: 1
                },
                CheckoutLineItem {
                    price_ref: "price_2".to_string(),
                    quantity: 3
                },
            ]
        );
    }

    #[test]
    fn test_prepare_reports_both_field_errors() {
        let cart = cart_with(&[("p1", "Esmalte", Some("price_1"))]);
        let flow = in_checkout(&cart);
        let form = CustomerForm {
            name: "Jo".to_string(),
            email: "jo-at-mail".to_string(),
        };

        match flow.prepare(&cart, &form) {
            Err(CheckoutError::InvalidCustomer(errors)) => {
                assert!(errors.name.is_some());
                assert!(errors.email.is_some());
            }
            other => panic!("expected customer errors, got {other:?}"),
        }
    }

    #[test]
    fn test_prepare_validates_customer_before_price_refs() {
        let cart = cart_with(&[("p1", "Esmalte", None)]);
        let flow = in_checkout(&cart);
        let form = CustomerForm::default();

        assert!(matches!(
            flow.prepare(&cart, &form),
            Err(CheckoutError::InvalidCustomer(_))
        ));
    }

    #[test]
    fn test_prepare_names_item_without_price_ref() {
        let cart = cart_with(&[
            ("p1", "Esmalte Gel Premium", Some("price_1")),
            ("p4", "Kit Manicura Casa", None),
        ]);
        let flow = in_checkout(&cart);

        let err = flow.prepare(&cart, &valid_form()).unwrap_err();
        assert_eq!(
            err,
            CheckoutError::MissingPriceReference {
                item_name: "Kit Manicura Casa".to_string()
            }
        );
        assert!(err.to_string().contains("Kit Manicura Casa"));
    }

    #[test]
    fn test_prepare_outside_checkout_stage() {
        let cart = cart_with(&[("p1", "Esmalte", Some("price_1"))]);
        let flow = CheckoutFlow::new();
        assert!(matches!(
            flow.prepare(&cart, &valid_form()),
            Err(CheckoutError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_request_wire_format() {
        let request = CheckoutSessionRequest {
            items: vec![CheckoutLineItem {
                price_ref: "price_1".to_string(),
                quantity: 2,
            }],
            customer_email: "ana@gmail.com".to_string(),
            customer_name: "Ana López".to_string(),
            success_url: None,
            cancel_url: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": [{ "price_ref": "price_1", "quantity": 2 }],
                "customer_email": "ana@gmail.com",
                "customer_name": "Ana López"
            })
        );

        let with_urls = request.with_return_urls("https://s/ok", "https://s/cancel");
        let json = serde_json::to_value(&with_urls).unwrap();
        assert_eq!(json["success_url"], "https://s/ok");
        assert_eq!(json["cancel_url"], "https://s/cancel");
    }
}
