//! The storefront client as one owned instance.

use std::sync::Arc;

use tracing::{info, instrument};

use soil2spoon_core::{ProductId, ReviewId};

use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::error::{Result, StorefrontError};
use crate::gateway::ApiClient;
use crate::session::{SessionSnapshot, SessionStore};
use crate::storage::{FileTokenStore, TokenStore};
use crate::types::{CreateOrderRequest, Order, Product, ProductRequest, UserProfile};

/// Gateway, session and cart wired together.
///
/// This struct is cheaply cloneable via `Arc`. The cart is registered as the
/// session's identity listener, so signing in loads the server cart and
/// signing out stops syncing.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionStore,
    cart: CartStore,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api", &self.inner.api)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build the client with the given token store.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Api` if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let session = SessionStore::new(api.clone(), tokens);
        let cart = CartStore::new(api.clone());
        session.add_listener(Arc::new(cart.clone()));

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                session,
                cart,
            }),
        })
    }

    /// Build the client with the token persisted on disk.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Config` when no token directory is available.
    pub fn with_file_tokens(config: StorefrontConfig) -> Result<Self> {
        let tokens = FileTokenStore::new(config.resolve_token_dir()?);
        Self::new(config, Arc::new(tokens))
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Resolve the persisted token, loading the server cart if it is valid.
    pub async fn start(&self) -> SessionSnapshot {
        self.inner.session.start().await
    }

    /// Place an order from the cart, then empty it.
    ///
    /// Pending cart pushes are delivered first so the backend orders what
    /// the user sees.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::Session` when signed out
    /// - `StorefrontError::Api` if the backend rejects the order; the cart is
    ///   kept
    #[instrument(skip(self, request))]
    pub async fn place_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        self.inner.session.require_user()?;
        self.inner.cart.flush().await?;

        let order = self.inner.api.create_order(request).await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order placed");
        self.inner.cart.clear();
        Ok(order)
    }

    /// The signed-in user, if they are an admin.
    ///
    /// # Errors
    ///
    /// - `StorefrontError::Session` when signed out
    /// - `StorefrontError::Forbidden` for non-admin users
    pub fn require_admin(&self) -> Result<UserProfile> {
        let user = self.inner.session.require_user()?;
        if user.role.is_admin() {
            Ok(user)
        } else {
            Err(StorefrontError::Forbidden(
                "admin role required".to_string(),
            ))
        }
    }

    /// # Errors
    ///
    /// See [`Storefront::require_admin`]; otherwise `StorefrontError::Api`.
    pub async fn admin_create_product(&self, request: &ProductRequest) -> Result<Product> {
        self.require_admin()?;
        Ok(self.inner.api.create_product(request).await?)
    }

    /// # Errors
    ///
    /// See [`Storefront::require_admin`]; otherwise `StorefrontError::Api`.
    pub async fn admin_update_product(
        &self,
        id: ProductId,
        request: &ProductRequest,
    ) -> Result<Product> {
        self.require_admin()?;
        Ok(self.inner.api.update_product(id, request).await?)
    }

    /// # Errors
    ///
    /// See [`Storefront::require_admin`]; otherwise `StorefrontError::Api`.
    pub async fn admin_delete_product(&self, id: ProductId) -> Result<()> {
        self.require_admin()?;
        Ok(self.inner.api.delete_product(id).await?)
    }

    /// # Errors
    ///
    /// See [`Storefront::require_admin`]; otherwise `StorefrontError::Api`.
    pub async fn admin_delete_review(
        &self,
        product_id: ProductId,
        review_id: ReviewId,
    ) -> Result<()> {
        self.require_admin()?;
        Ok(self.inner.api.delete_review(product_id, review_id).await?)
    }

    /// Deliver queued cart pushes and stop the sync worker.
    pub async fn shutdown(&self) {
        self.inner.cart.shutdown().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::SessionError;
    use crate::storage::MemoryTokenStore;

    fn offline() -> Storefront {
        Storefront::new(
            StorefrontConfig::new("http://127.0.0.1:9").unwrap(),
            Arc::new(MemoryTokenStore::default()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_place_order_requires_session() {
        let storefront = offline();
        let result = storefront
            .place_order(&CreateOrderRequest::default())
            .await;
        assert!(matches!(
            result,
            Err(StorefrontError::Session(SessionError::NotAuthenticated))
        ));
    }

    #[tokio::test]
    async fn test_admin_calls_require_session() {
        let storefront = offline();
        assert!(matches!(
            storefront.admin_delete_product(ProductId::new(1)).await,
            Err(StorefrontError::Session(SessionError::NotAuthenticated))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let storefront = offline();
        storefront.shutdown().await;
        assert!(storefront.cart().flush().await.is_err());
    }
}
