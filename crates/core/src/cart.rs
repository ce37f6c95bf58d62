//! Session cart store.
//!
//! A [`Cart`] is owned by exactly one visitor session and only mutated from
//! request handlers, so it is a plain struct with method setters. Line items
//! are unique by product id and keep insertion order for display.
//!
//! Invariants:
//! - every stored line has `quantity >= 1`
//! - [`Cart::total`] is recomputed from the lines on every call

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// One product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    id: ProductId,
    name: String,
    price: Price,
    image: String,
    quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stripe_price_id: Option<String>,
}

impl CartItem {
    /// Create a line with quantity 1.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Price,
        image: impl Into<String>,
        stripe_price_id: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image: image.into(),
            quantity: 1,
            stripe_price_id: stripe_price_id.filter(|p| !p.trim().is_empty()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Payment provider price reference, if the product has one.
    #[must_use]
    pub fn stripe_price_id(&self) -> Option<&str> {
        self.stripe_price_id.as_deref()
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// The visitor's in-progress selection plus the drawer visibility flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    #[serde(default)]
    is_open: bool,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            is_open: false,
        }
    }

    /// Add one unit of `item`.
    ///
    /// If a line with the same id exists its quantity is incremented by one;
    /// otherwise the item is appended with quantity 1. The incoming item's
    /// own quantity is ignored.
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }

        self.items.push(CartItem {
            quantity: 1,
            ..item
        });
    }

    /// Set the quantity of line `id`.
    ///
    /// Quantities below 1 are ignored rather than clamped; removing a line is
    /// always an explicit [`Cart::remove_item`]. Unknown ids are ignored too.
    /// Returns whether the cart changed.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: u32) -> bool {
        if quantity < 1 {
            return false;
        }

        match self.items.iter_mut().find(|i| &i.id == id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove line `id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub const fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines (navbar badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Σ(price × quantity) over the current lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
