//! Core types for Lookout.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;
pub mod wizard;

pub use cart::{Cart, CartCost, CartHandle, CartLine, OrderItem, OrderSummary};
pub use catalog::{Collection, CollectionRef, Image, OPTION_SEPARATOR, Product, Variant};
pub use id::*;
pub use price::{CurrencyCode, Money, MoneyError};
pub use wizard::{CameraLevel, CameraType, Selection, UnknownVariant, WizardStep};
