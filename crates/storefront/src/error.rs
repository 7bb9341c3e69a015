//! Unified error handling with Sentry integration.
//!
//! Each layer has its own `thiserror` enum; `StorefrontError` wraps them for
//! callers that drive the whole client (the CLI, the facade).

use thiserror::Error;

use crate::cart::CartError;
use crate::config::ConfigError;
use crate::gateway::ApiError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// Top-level error for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The backend call failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Token storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A session operation failed.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// The cart sync worker is gone.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The signed-in user lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl StorefrontError {
    /// Whether this error is worth an error report, as opposed to a user
    /// mistake (bad input, wrong password, missing role).
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(err) | Self::Session(SessionError::Api(err)) => match err {
                ApiError::Http { status, .. } => *status >= 500,
                _ => true,
            },
            Self::Storage(_) | Self::Cart(_) | Self::Session(SessionError::Storage(_)) => true,
            _ => false,
        }
    }

    /// Capture to Sentry when reportable, then log.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, "Storefront error");
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "7")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::Forbidden("admin role required".to_string());
        assert_eq!(err.to_string(), "Forbidden: admin role required");

        let api = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            Some("application/json"),
            r#"{"message":"Cart is empty"}"#,
        );
        assert_eq!(StorefrontError::from(api).to_string(), "Cart is empty");
    }

    #[test]
    fn test_client_errors_are_not_reported() {
        let not_found = ApiError::from_response(StatusCode::NOT_FOUND, None, "");
        assert!(!StorefrontError::from(not_found).is_reportable());

        let invalid = SessionError::InvalidInput("password is required".to_string());
        assert!(!StorefrontError::from(invalid).is_reportable());

        let server = ApiError::from_response(StatusCode::BAD_GATEWAY, None, "");
        assert!(StorefrontError::from(server).is_reportable());
    }
}
