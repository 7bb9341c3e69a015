//! `/api/auth` endpoints.

use tracing::instrument;

use crate::gateway::{ApiClient, ApiError};
use crate::types::{
    AuthResponse, ForgotPasswordResponse, LoginRequest, MessageResponse, ResetPasswordRequest,
    SignupRequest, UserProfile,
};

impl ApiClient {
    /// Exchange credentials for a token and profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` with the backend's message on bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post("/api/auth/login", &LoginRequest { email, password })
            .await
    }

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the email is taken or the input is rejected.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.post(
            "/api/auth/signup",
            &SignupRequest {
                email,
                password,
                name,
            },
        )
        .await
    }

    /// Profile for the current bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` (401/403) when the token is missing or expired.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.get("/api/auth/me").await
    }

    /// Request a password reset email.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport or backend failure.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse, ApiError> {
        self.post(
            "/api/auth/forgot-password",
            &serde_json::json!({ "email": email }),
        )
        .await
    }

    /// Set a new password using a reset token. Returns the backend's message.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the reset token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<String, ApiError> {
        let response: Option<MessageResponse> = self
            .post(
                "/api/auth/reset-password",
                &ResetPasswordRequest {
                    token,
                    new_password,
                },
            )
            .await?;
        Ok(response.map(|r| r.message).unwrap_or_default())
    }
}
