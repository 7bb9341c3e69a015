//! Integration tests for session identity and token persistence.

use std::sync::Arc;

use secrecy::ExposeSecret;

use soil2spoon_core::UserRole;
use soil2spoon_integration_tests::StubBackend;
use soil2spoon_storefront::session::SessionError;
use soil2spoon_storefront::{
    ApiError, FileTokenStore, MemoryTokenStore, SessionState, TokenStore,
};

fn persisted(tokens: &dyn TokenStore) -> Option<String> {
    tokens
        .load()
        .expect("load token")
        .map(|t| t.expose_secret().to_string())
}

// =============================================================================
// Startup Tests
// =============================================================================

#[tokio::test]
async fn test_start_without_token_is_anonymous() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    assert!(storefront.session().is_loading());

    let snapshot = storefront.start().await;

    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert!(!snapshot.loading);
    assert!(!snapshot.has_token);
    assert_eq!(stub.hits("GET", "/api/auth/me"), 0);
}

#[tokio::test]
async fn test_start_resolves_persisted_token() {
    let stub = StubBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token("token-asha"));
    let storefront = stub.storefront_with(tokens);
    assert_eq!(storefront.session().state(), SessionState::Resolving);

    let snapshot = storefront.start().await;

    assert_eq!(snapshot.state, SessionState::Authenticated);
    let user = snapshot.user.expect("profile");
    assert_eq!(user.id.as_i64(), 1);
    assert_eq!(user.role, UserRole::User);
    assert_eq!(stub.hits("GET", "/api/auth/me"), 1);
}

#[tokio::test]
async fn test_start_with_rejected_token_signs_out() {
    let stub = StubBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::with_token("token-expired"));
    let storefront = stub.storefront_with(tokens.clone());

    let snapshot = storefront.start().await;

    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert!(snapshot.user.is_none());
    assert_eq!(persisted(tokens.as_ref()), None);
}

#[tokio::test]
async fn test_token_survives_restart_on_disk() {
    let stub = StubBackend::start().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let first = stub.storefront_with(Arc::new(FileTokenStore::new(dir.path())));
    first.start().await;
    first
        .session()
        .login("asha@soil2spoon.in", "masala123")
        .await
        .expect("login");
    first.shutdown().await;

    let second = stub.storefront_with(Arc::new(FileTokenStore::new(dir.path())));
    let snapshot = second.start().await;

    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert_eq!(
        snapshot.user.map(|u| u.email.to_string()),
        Some("asha@soil2spoon.in".to_string())
    );
}

// =============================================================================
// Login / Signup Tests
// =============================================================================

#[tokio::test]
async fn test_login_persists_token_and_authenticates() {
    let stub = StubBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::default());
    let storefront = stub.storefront_with(tokens.clone());
    storefront.start().await;

    let user = storefront
        .session()
        .login("asha@soil2spoon.in", "masala123")
        .await
        .expect("login");

    assert_eq!(user.name, "Asha");
    assert!(storefront.session().is_authenticated());
    assert_eq!(persisted(tokens.as_ref()), Some("token-asha".to_string()));
    // The login response carries the profile; no extra lookup.
    assert_eq!(stub.hits("GET", "/api/auth/me"), 0);
}

#[tokio::test]
async fn test_login_rejection_keeps_session() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;

    let err = storefront
        .session()
        .login("asha@soil2spoon.in", "wrong")
        .await
        .expect_err("rejected");

    match err {
        SessionError::Api(ApiError::Http {
            status, message, ..
        }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(storefront.session().state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_login_validates_before_calling_backend() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();

    let err = storefront
        .session()
        .login("not-an-email", "masala123")
        .await
        .expect_err("invalid");

    assert!(matches!(err, SessionError::InvalidInput(_)));
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_signup_creates_and_signs_in() {
    let stub = StubBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::default());
    let storefront = stub.storefront_with(tokens.clone());
    storefront.start().await;

    let user = storefront
        .session()
        .signup("ravi@soil2spoon.in", "jeera456", "Ravi")
        .await
        .expect("signup");

    assert_eq!(user.name, "Ravi");
    assert!(storefront.session().is_authenticated());
    assert!(persisted(tokens.as_ref()).is_some());
}

#[tokio::test]
async fn test_signup_duplicate_email_is_rejected() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;

    let err = storefront
        .session()
        .signup("asha@soil2spoon.in", "anything", "Asha Again")
        .await
        .expect_err("duplicate");

    assert_eq!(err.to_string(), "Email already registered");
    assert_eq!(storefront.session().state(), SessionState::Anonymous);
}

// =============================================================================
// Logout / Token Tests
// =============================================================================

#[tokio::test]
async fn test_logout_is_local_and_clears_token() {
    let stub = StubBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::default());
    let storefront = stub.storefront_with(tokens.clone());
    storefront.start().await;
    storefront
        .session()
        .login("asha@soil2spoon.in", "masala123")
        .await
        .expect("login");
    storefront.cart().flush().await.expect("flush");
    let before = stub.requests().len();

    storefront.session().logout().await;

    assert_eq!(storefront.session().state(), SessionState::Anonymous);
    assert_eq!(persisted(tokens.as_ref()), None);
    assert_eq!(stub.requests().len(), before);
}

#[tokio::test]
async fn test_set_token_adopts_and_resolves() {
    let stub = StubBackend::start().await;
    let tokens = Arc::new(MemoryTokenStore::default());
    let storefront = stub.storefront_with(tokens.clone());
    storefront.start().await;

    storefront
        .session()
        .set_token(Some("token-admin".to_string()))
        .await;

    let user = storefront.session().user().expect("profile");
    assert_eq!(user.role, UserRole::Admin);
    assert_eq!(persisted(tokens.as_ref()), Some("token-admin".to_string()));

    storefront.session().set_token(Some("   ".to_string())).await;
    assert_eq!(storefront.session().state(), SessionState::Anonymous);
    assert_eq!(persisted(tokens.as_ref()), None);
}

#[tokio::test]
async fn test_subscribers_see_final_state() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    let mut updates = storefront.session().subscribe();
    storefront.start().await;

    storefront
        .session()
        .login("admin@soil2spoon.in", "admin123")
        .await
        .expect("login");

    assert!(updates.has_changed().expect("sender alive"));
    let latest = updates.borrow_and_update().clone();
    assert_eq!(latest.state, SessionState::Authenticated);
    assert!(!latest.loading);
}

// =============================================================================
// Password Reset Tests
// =============================================================================

#[tokio::test]
async fn test_password_reset_flow() {
    let stub = StubBackend::start().await;
    let storefront = stub.storefront();
    storefront.start().await;

    let requested = storefront
        .session()
        .forgot_password("asha@soil2spoon.in")
        .await
        .expect("forgot");
    assert!(
        requested
            .reset_link
            .is_some_and(|link| link.contains("reset-password"))
    );

    let message = storefront
        .session()
        .reset_password("reset-ok", "newmasala")
        .await
        .expect("reset");
    assert_eq!(message, "Password updated");

    let err = storefront
        .session()
        .reset_password("reset-stale", "newmasala")
        .await
        .expect_err("stale token");
    assert_eq!(err.to_string(), "Invalid or expired reset token");
    assert_eq!(storefront.session().state(), SessionState::Anonymous);
}
