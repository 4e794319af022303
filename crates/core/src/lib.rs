//! Lookout Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront wizard and its tests:
//! - money and currency codes backed by fixed-point decimals
//! - Shopify global ID newtypes
//! - the normalized catalog schema (products, variants, collections)
//! - cart lines, cart handles and the derived order summary
//! - wizard enums (camera type, camera level, wizard step)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async runtime. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers and domain records
//! - [`options`] - Variant option matrix used by product pickers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod options;
pub mod types;

pub use options::OptionMatrix;
pub use types::*;
