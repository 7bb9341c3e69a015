//! Soil2Spoon Core - Shared types library.
//!
//! This crate provides common types used across all Soil2Spoon components:
//! - `storefront` - Client SDK for the shop's REST backend (session, cart, catalog)
//! - `cli` - Command-line storefront built on the SDK
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
