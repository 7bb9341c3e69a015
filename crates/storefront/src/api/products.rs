//! Catalog reads and product reviews.

use tracing::instrument;
use url::form_urlencoded;

use soil2spoon_core::{ProductId, ReviewId};

use super::segment;
use crate::gateway::{ApiClient, ApiError};
use crate::types::{Category, Page, Product, ProductQuery, Review, ReviewRequest};

/// Path and query string for a product listing.
pub(crate) fn products_path(query: &ProductQuery) -> String {
    let mut search = form_urlencoded::Serializer::new(String::new());
    if let Some(category) = &query.category {
        search.append_pair("category", category.as_str());
    }
    search.append_pair("page", &query.page.to_string());
    search.append_pair("size", &query.size.to_string());
    format!("/api/products?{}", search.finish())
}

impl ApiClient {
    /// Product categories.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let categories: Option<Vec<Category>> = self.get("/api/categories").await?;
        Ok(categories.unwrap_or_default())
    }

    /// One page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        self.get(&products_path(query)).await
    }

    /// A product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` (404) for unknown slugs.
    #[instrument(skip(self))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, ApiError> {
        self.get(&format!("/api/products/{}", segment(slug))).await
    }

    /// Products flagged as featured.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        let products: Option<Vec<Product>> = self.get("/api/products/featured").await?;
        Ok(products.unwrap_or_default())
    }

    /// Products flagged as trending.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn trending_products(&self) -> Result<Vec<Product>, ApiError> {
        let products: Option<Vec<Product>> = self.get("/api/products/trending").await?;
        Ok(products.unwrap_or_default())
    }

    /// Reviews for a product. Ownership flags are set when a token is attached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError> {
        let reviews: Option<Vec<Review>> = self
            .get(&format!("/api/products/{product_id}/reviews"))
            .await?;
        Ok(reviews.unwrap_or_default())
    }

    /// Post a review as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` (401) without a session, 400 for invalid input.
    #[instrument(skip(self, review))]
    pub async fn create_review(
        &self,
        product_id: ProductId,
        review: &ReviewRequest,
    ) -> Result<Review, ApiError> {
        self.post(&format!("/api/products/{product_id}/reviews"), review)
            .await
    }

    /// Edit one of the signed-in user's reviews.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` (403) when the review belongs to someone else.
    #[instrument(skip(self, review))]
    pub async fn update_review(
        &self,
        product_id: ProductId,
        review_id: ReviewId,
        review: &ReviewRequest,
    ) -> Result<Review, ApiError> {
        self.put(
            &format!("/api/products/{product_id}/reviews/{review_id}"),
            review,
        )
        .await
    }
}
