//! Command implementations. Each function drives the [`Storefront`] and
//! renders the result through [`crate::output`].

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod orders;

use thiserror::Error;

use soil2spoon_storefront::{ApiError, Storefront, StorefrontError};
use soil2spoon_storefront::session::SessionError;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// An argument was accepted by the parser but makes no sense here.
    #[error("{0}")]
    InvalidArgument(String),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Storefront(err.into())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        Self::Storefront(err.into())
    }
}

/// Resolve the stored token and wait for the server cart, so that cart
/// commands start from what the backend holds.
pub async fn restore_session(storefront: &Storefront) {
    let snapshot = storefront.start().await;
    tracing::debug!(state = ?snapshot.state, "Session restored");
    if let Err(e) = storefront.cart().flush().await {
        tracing::warn!(error = %e, "Cart sync unavailable");
    }
}
