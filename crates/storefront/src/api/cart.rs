//! `/api/cart` endpoints.

use tracing::instrument;

use crate::gateway::{ApiClient, ApiError};
use crate::types::{CartItem, CartLineInput};

impl ApiClient {
    /// The signed-in user's server cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let items: Option<Vec<CartItem>> = self.get("/api/cart").await?;
        Ok(items.unwrap_or_default())
    }

    /// Replace the server cart with `lines`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn replace_cart(&self, lines: &[CartLineInput]) -> Result<(), ApiError> {
        let _: serde_json::Value = self.put("/api/cart", lines).await?;
        Ok(())
    }
}
