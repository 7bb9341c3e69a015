//! Soil2Spoon storefront client.
//!
//! This crate holds everything a storefront front end needs apart from
//! presentation: the HTTP gateway to the REST backend, the session (token and
//! profile), the cart with its server sync, and typed endpoint wrappers.
//! [`Storefront`] wires them together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;

pub use cart::{Cart, CartAction, CartSnapshot, CartStore};
pub use config::StorefrontConfig;
pub use error::StorefrontError;
pub use gateway::{ApiClient, ApiError, ApiPayload, RequestOptions};
pub use session::{IdentityListener, SessionSnapshot, SessionState, SessionStore};
pub use state::Storefront;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
