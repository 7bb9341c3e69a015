//! `/api/orders` endpoints.

use tracing::instrument;

use crate::gateway::{ApiClient, ApiError};
use crate::types::{CreateOrderRequest, Order};

impl ApiClient {
    /// Orders placed by the signed-in user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let orders: Option<Vec<Order>> = self.get("/api/orders").await?;
        Ok(orders.unwrap_or_default())
    }

    /// Place an order from the server cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the cart is empty or the details are rejected.
    #[instrument(skip(self, request))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        self.post("/api/orders", request).await
    }
}
