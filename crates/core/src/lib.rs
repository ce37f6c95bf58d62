//! Mani Pedi Core - Domain types for the salon storefront.
//!
//! This crate provides the types shared by the storefront server and the CLI:
//! - `storefront` - Public site: catalog pages, cart drawer, checkout handoff
//! - `cli` - Operator tooling for seeding the hosted catalog tables
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients. Everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails
//! - [`catalog`] - Read-only catalog records (services, products, team, ...)
//! - [`cart`] - The session cart store and its derived totals
//! - [`customer`] - Customer identity validation for checkout
//! - [`checkout`] - Checkout stage machine and payment request mapping

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customer;
pub mod types;

pub use cart::{Cart, CartItem};
pub use catalog::{CatalogTable, GalleryItem, Product, Service, SortOrder, TeamMember, Testimonial};
pub use checkout::{
    CheckoutError, CheckoutFlow, CheckoutLineItem, CheckoutSessionRequest, CheckoutStage,
};
pub use customer::{CustomerErrors, CustomerForm, CustomerInfo, CustomerName};
pub use types::*;
