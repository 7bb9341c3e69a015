//! `/api/addresses` endpoints.

use tracing::instrument;

use soil2spoon_core::AddressId;

use crate::gateway::{ApiClient, ApiError};
use crate::types::{Address, AddressRequest};

impl ApiClient {
    /// Saved addresses of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn list_addresses(&self) -> Result<Vec<Address>, ApiError> {
        let addresses: Option<Vec<Address>> = self.get("/api/addresses").await?;
        Ok(addresses.unwrap_or_default())
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the address is rejected.
    #[instrument(skip(self, request))]
    pub async fn create_address(&self, request: &AddressRequest) -> Result<Address, ApiError> {
        self.post("/api/addresses", request).await
    }

    /// Overwrite a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the address does not exist or is rejected.
    #[instrument(skip(self, request))]
    pub async fn update_address(
        &self,
        id: AddressId,
        request: &AddressRequest,
    ) -> Result<Address, ApiError> {
        self.put(&format!("/api/addresses/{id}"), request).await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the address does not exist.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        self.delete(&format!("/api/addresses/{id}")).await
    }
}
