//! `/api/admin` endpoints. The backend rejects these unless the token
//! belongs to an `ADMIN` user.

use tracing::instrument;

use soil2spoon_core::{ProductId, ReviewId};

use crate::gateway::{ApiClient, ApiError};
use crate::types::{Product, ProductRequest};

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError::Http` (403) for non-admin tokens.
    #[instrument(skip(self, request))]
    pub async fn create_product(&self, request: &ProductRequest) -> Result<Product, ApiError> {
        self.post("/api/admin/products", request).await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Http` (403) for non-admin tokens, 404 for unknown ids.
    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: ProductId,
        request: &ProductRequest,
    ) -> Result<Product, ApiError> {
        self.put(&format!("/api/admin/products/{id}"), request)
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Http` (403) for non-admin tokens, 404 for unknown ids.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        self.delete(&format!("/api/admin/products/{id}")).await
    }

    /// Remove any user's review.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` (403) for non-admin tokens, 404 for unknown ids.
    #[instrument(skip(self))]
    pub async fn delete_review(
        &self,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<(), ApiError> {
        self.delete(&format!(
            "/api/admin/products/{product_id}/reviews/{review_id}"
        ))
        .await
    }
}
