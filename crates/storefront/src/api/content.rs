//! Static site content. Every read has an `_or_default` variant for pages
//! that render something even when the backend lacks the endpoint.

use tracing::{debug, instrument, warn};

use soil2spoon_core::ProductId;

use crate::gateway::{ApiClient, ApiError};
use crate::types::{ContactInfo, Faq, ReturnsPolicy, ShippingPolicy, SiteInformation};

/// Fall back to `T::default()` on failure.
///
/// A 404 means the backend does not publish this page, which is routine;
/// anything else is logged as a warning.
fn or_default<T: Default>(what: &str, result: Result<T, ApiError>) -> T {
    result.unwrap_or_else(|e| {
        if e.is_not_found() {
            debug!(content = what, "Content not published, using default");
        } else {
            warn!(content = what, error = %e, "Content unavailable, using default");
        }
        T::default()
    })
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn faqs(&self) -> Result<Vec<Faq>, ApiError> {
        let faqs: Option<Vec<Faq>> = self.get("/api/faqs").await?;
        Ok(faqs.unwrap_or_default())
    }

    pub async fn faqs_or_default(&self) -> Vec<Faq> {
        or_default("faqs", self.faqs().await)
    }

    /// Seller and regulatory information, optionally specific to a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn site_information(
        &self,
        product_id: Option<ProductId>,
    ) -> Result<SiteInformation, ApiError> {
        let path = match product_id {
            Some(id) => format!("/api/content/site-information?productId={id}"),
            None => "/api/content/site-information".to_string(),
        };
        self.get(&path).await
    }

    pub async fn site_information_or_default(
        &self,
        product_id: Option<ProductId>,
    ) -> SiteInformation {
        or_default(
            "site-information",
            self.site_information(product_id).await,
        )
    }

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn shipping_policy(&self) -> Result<ShippingPolicy, ApiError> {
        self.get("/api/content/shipping").await
    }

    pub async fn shipping_policy_or_default(&self) -> ShippingPolicy {
        or_default("shipping", self.shipping_policy().await)
    }

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn returns_policy(&self) -> Result<ReturnsPolicy, ApiError> {
        self.get("/api/content/returns").await
    }

    pub async fn returns_policy_or_default(&self) -> ReturnsPolicy {
        or_default("returns", self.returns_policy().await)
    }

    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn contact_info(&self) -> Result<ContactInfo, ApiError> {
        self.get("/api/content/contact").await
    }

    pub async fn contact_info_or_default(&self) -> ContactInfo {
        or_default("contact", self.contact_info().await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_or_default_swallows_errors() {
        let err = ApiError::Decode(Arc::new(
            serde_json::from_str::<u32>("x").unwrap_err(),
        ));
        let faqs: Vec<Faq> = or_default("faqs", Err(err));
        assert!(faqs.is_empty());
    }

    #[test]
    fn test_or_default_covers_unpublished_pages() {
        let err = ApiError::from_response(reqwest::StatusCode::NOT_FOUND, None, "");
        assert!(err.is_not_found());
        let policy: ShippingPolicy = or_default("shipping", Err(err));
        assert_eq!(policy, ShippingPolicy::default());
    }

    #[test]
    fn test_or_default_passes_values_through() {
        let contact = ContactInfo {
            email: "care@soil2spoon.in".to_string(),
            ..ContactInfo::default()
        };
        assert_eq!(or_default("contact", Ok(contact.clone())), contact);
    }
}
