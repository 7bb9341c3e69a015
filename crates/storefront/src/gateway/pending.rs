//! In-flight registry for deduplicated reads.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use super::{ApiError, ApiPayload};

/// A read that any number of callers may await.
pub(crate) type SharedResponse = Shared<BoxFuture<'static, Result<ApiPayload, ApiError>>>;

/// At most one entry per URL. The future stored for a key removes its own
/// entry once the network call settles, so a later read starts fresh.
#[derive(Default)]
pub(crate) struct PendingRequests {
    entries: Mutex<HashMap<String, SharedResponse>>,
}

impl PendingRequests {
    /// Join the in-flight read for `key`, or register the one built by
    /// `start`. The flag is `true` when an existing entry was joined.
    pub(crate) fn join_or_start<F>(&self, key: &str, start: F) -> (SharedResponse, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<ApiPayload, ApiError>>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(key) {
            return (existing.clone(), true);
        }
        let shared = start().shared();
        entries.insert(key.to_string(), shared.clone());
        (shared, false)
    }

    pub(crate) fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_second_caller_joins_first() {
        let registry = Arc::new(PendingRequests::default());
        let starts = Arc::new(AtomicUsize::new(0));

        let make = |registry: Arc<PendingRequests>, starts: Arc<AtomicUsize>| {
            move || {
                starts.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::task::yield_now().await;
                    registry.remove("/api/products");
                    Ok(ApiPayload::Text("ok".to_string()))
                }
                .boxed()
            }
        };

        let (first, joined_first) = registry.join_or_start(
            "/api/products",
            make(Arc::clone(&registry), Arc::clone(&starts)),
        );
        let (second, joined_second) = registry.join_or_start(
            "/api/products",
            make(Arc::clone(&registry), Arc::clone(&starts)),
        );

        assert!(!joined_first);
        assert!(joined_second);
        assert_eq!(registry.len(), 1);

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.unwrap(), ApiPayload::Text("ok".to_string()));
        assert_eq!(b.unwrap(), ApiPayload::Text("ok".to_string()));
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_contend() {
        let registry = PendingRequests::default();
        let (_a, joined_a) = registry.join_or_start("/a", || {
            async { Ok(ApiPayload::Empty) }.boxed()
        });
        let (_b, joined_b) = registry.join_or_start("/b", || {
            async { Ok(ApiPayload::Empty) }.boxed()
        });
        assert!(!joined_a);
        assert!(!joined_b);
        assert_eq!(registry.len(), 2);
    }
}
