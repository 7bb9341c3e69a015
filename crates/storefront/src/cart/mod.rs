//! Cart store with server synchronization.
//!
//! The local cart is authoritative for this client. While a user is signed
//! in, every local change is pushed to `PUT /api/cart` (replace-all). When a
//! new identity signs in the server cart is fetched and replaces the local
//! one; that replacement is not echoed back.
//!
//! # Ordering
//!
//! Pushes and loads run on a single background worker in the order they
//! were queued, so the last local change is the last write the server sees.
//! Queued work carries the generation it was issued under and is dropped if
//! the generation has moved on by the time it runs. The generation moves on
//! when the identity changes and when a server cart replaces the local one,
//! so a push built from lines the server load has since overwritten is never
//! sent.

mod reducer;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use soil2spoon_core::{Price, ProductId, UserId};

use crate::gateway::ApiClient;
use crate::session::IdentityListener;
use crate::types::{CartItem, CartLineInput, Product, UserProfile};

pub use reducer::{Cart, CartAction, reduce};

/// How long the "added to cart" notice stays up.
pub const NOTICE_DURATION: Duration = Duration::from_millis(2500);

/// Text of the notice shown after an add.
pub const ADDED_NOTICE: &str = "Added to cart";

/// Cart store errors.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart sync worker has stopped")]
    WorkerStopped,
}

/// Point-in-time view of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Price,
    pub count: u32,
    pub notice: Option<String>,
}

enum SyncCommand {
    Push {
        lines: Vec<CartLineInput>,
        generation: u64,
    },
    Load {
        user: UserId,
        generation: u64,
    },
    Flush(oneshot::Sender<()>),
    Shutdown,
}

#[derive(Default)]
struct CartState {
    cart: Cart,
    /// Set by a server load; consumed by the change it causes.
    skip_next_sync: bool,
    /// Signed-in user, if any. Pushes only happen while this is set.
    identity: Option<UserId>,
    /// Identity whose server cart has been requested.
    loaded_for: Option<UserId>,
    /// Bumped on every identity change and every applied server cart.
    generation: u64,
    notice: Option<String>,
    notice_seq: u64,
}

impl CartState {
    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.cart.items().to_vec(),
            total: self.cart.total(),
            count: self.cart.count(),
            notice: self.notice.clone(),
        }
    }

    /// Decide whether the change just applied goes to the server.
    fn on_cart_changed(&mut self) -> Option<Vec<CartLineInput>> {
        if std::mem::take(&mut self.skip_next_sync) {
            debug!("Skipping push of freshly loaded server cart");
            return None;
        }
        self.identity.map(|_| self.cart.lines())
    }
}

/// State shared between the store handle and its worker.
struct CartShared {
    state: Mutex<CartState>,
    snapshot_tx: watch::Sender<CartSnapshot>,
}

impl CartShared {
    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &CartState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Apply a server cart if it is still for the current identity.
    fn apply_server_cart(&self, user: UserId, generation: u64, items: Vec<CartItem>) -> bool {
        let mut state = self.lock();
        if state.generation != generation || state.identity != Some(user) {
            debug!(user_id = %user, "Dropping server cart for a stale identity");
            return false;
        }
        // The flag is raised and consumed under the same lock as the
        // replacement, so no local change can slip in between.
        state.cart.apply(CartAction::SetFromServer(items));
        state.skip_next_sync = true;
        let _ = state.on_cart_changed();
        // Pushes queued during the load carry lines that no longer exist.
        state.generation += 1;
        self.publish(&state);
        true
    }

    fn load_failed(&self, user: UserId, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation && state.loaded_for == Some(user) {
            state.loaded_for = None;
        }
    }

    fn clear_notice(&self, seq: u64) {
        let mut state = self.lock();
        if state.notice_seq == seq && state.notice.take().is_some() {
            self.publish(&state);
        }
    }
}

/// The cart store. Cheap to clone.
///
/// Must be created inside a Tokio runtime; it spawns its sync worker.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    shared: Arc<CartShared>,
    commands: mpsc::UnboundedSender<SyncCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
    notice_timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for CartInner {
    fn drop(&mut self) {
        if let Some(timer) = self
            .notice_timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty cart and start its sync worker.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let state = CartState::default();
        let (snapshot_tx, _) = watch::channel(state.snapshot());
        let shared = Arc::new(CartShared {
            state: Mutex::new(state),
            snapshot_tx,
        });

        let (commands, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_sync_worker(api, Arc::clone(&shared), receiver));

        Self {
            inner: Arc::new(CartInner {
                shared,
                commands,
                worker: Mutex::new(Some(worker)),
                notice_timer: Mutex::new(None),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.shared.lock().snapshot()
    }

    /// Watch snapshots as the cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.shared.snapshot_tx.subscribe()
    }

    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.shared.lock().cart.clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.inner.shared.lock().cart.items().to_vec()
    }

    #[must_use]
    pub fn total(&self) -> Price {
        self.inner.shared.lock().cart.total()
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.inner.shared.lock().cart.count()
    }

    /// The transient notice, if one is showing.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        self.inner.shared.lock().notice.clone()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product` and show the added notice.
    pub fn add(&self, product: &Product, quantity: u32) {
        self.add_item(CartItem::from_product(product, quantity));
    }

    /// Add a prepared line and show the added notice.
    pub fn add_item(&self, item: CartItem) {
        crate::error::add_breadcrumb("cart", "Added to cart", None);
        self.dispatch(CartAction::Add(item));
        self.show_notice();
    }

    pub fn update_quantity(&self, product_id: ProductId, quantity: i64) {
        self.dispatch(CartAction::UpdateQuantity {
            product_id,
            quantity,
        });
    }

    pub fn remove(&self, product_id: ProductId) {
        self.dispatch(CartAction::Remove(product_id));
    }

    pub fn clear(&self) {
        self.dispatch(CartAction::Clear);
    }

    /// Replace the cart with a server copy without pushing it back.
    pub fn set_from_server(&self, items: Vec<CartItem>) {
        self.dispatch(CartAction::SetFromServer(items));
    }

    /// Apply `action`; returns whether a push was queued.
    fn dispatch(&self, action: CartAction) -> bool {
        let from_server = matches!(action, CartAction::SetFromServer(_));
        let mut state = self.inner.shared.lock();
        state.cart.apply(action);
        if from_server {
            state.skip_next_sync = true;
        }
        let push = state.on_cart_changed();
        self.inner.shared.publish(&state);

        // Queued while still holding the lock so pushes keep mutation order.
        match push {
            Some(lines) => {
                let generation = state.generation;
                if self
                    .inner
                    .commands
                    .send(SyncCommand::Push { lines, generation })
                    .is_err()
                {
                    debug!("Cart sync worker stopped, push dropped");
                    return false;
                }
                true
            }
            None => false,
        }
    }

    fn show_notice(&self) {
        let seq = {
            let mut state = self.inner.shared.lock();
            state.notice_seq += 1;
            state.notice = Some(ADDED_NOTICE.to_string());
            self.inner.shared.publish(&state);
            state.notice_seq
        };

        let shared = Arc::clone(&self.inner.shared);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(NOTICE_DURATION).await;
            shared.clear_notice(seq);
        });

        let previous = self
            .inner
            .notice_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// React to a session identity change.
    ///
    /// A new identity queues a server load; the same identity again does
    /// nothing; `None` stops syncing and drops any load in flight. The local
    /// cart itself is left alone on sign-out.
    pub fn identity_changed(&self, user: Option<UserId>) {
        let mut state = self.inner.shared.lock();
        match user {
            Some(id) if state.loaded_for == Some(id) => {
                state.identity = Some(id);
                debug!(user_id = %id, "Identity unchanged, keeping cart");
            }
            Some(id) => {
                state.generation += 1;
                state.identity = Some(id);
                state.loaded_for = Some(id);
                let generation = state.generation;
                if self
                    .inner
                    .commands
                    .send(SyncCommand::Load {
                        user: id,
                        generation,
                    })
                    .is_err()
                {
                    debug!("Cart sync worker stopped, load dropped");
                }
            }
            None => {
                if state.identity.is_some() || state.loaded_for.is_some() {
                    state.generation += 1;
                }
                state.identity = None;
                state.loaded_for = None;
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Wait until everything queued so far has been attempted.
    ///
    /// # Errors
    ///
    /// Returns `CartError::WorkerStopped` after [`CartStore::shutdown`].
    pub async fn flush(&self) -> Result<(), CartError> {
        let (done, wait) = oneshot::channel();
        self.inner
            .commands
            .send(SyncCommand::Flush(done))
            .map_err(|_| CartError::WorkerStopped)?;
        wait.await.map_err(|_| CartError::WorkerStopped)
    }

    /// Drain queued work, then stop the worker. Later mutations stay local.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let _ = self.inner.commands.send(SyncCommand::Shutdown);
        let worker = self
            .inner
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            warn!(error = %e, "Cart sync worker ended abnormally");
        }
    }
}

#[async_trait]
impl IdentityListener for CartStore {
    async fn on_identity_changed(&self, user: Option<UserProfile>) {
        self.identity_changed(user.map(|u| u.id));
    }
}

// =============================================================================
// Sync worker
// =============================================================================

async fn run_sync_worker(
    api: ApiClient,
    shared: Arc<CartShared>,
    mut commands: mpsc::UnboundedReceiver<SyncCommand>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            SyncCommand::Push { lines, generation } => {
                if shared.generation() != generation {
                    debug!("Dropping push superseded by an identity change or server load");
                    continue;
                }
                push_cart(&api, &lines).await;
            }
            SyncCommand::Load { user, generation } => {
                if shared.generation() != generation {
                    debug!(user_id = %user, "Dropping superseded cart load");
                    continue;
                }
                load_cart(&api, &shared, user, generation).await;
            }
            SyncCommand::Flush(done) => {
                let _ = done.send(());
            }
            SyncCommand::Shutdown => break,
        }
    }
    debug!("Cart sync worker stopped");
}

#[instrument(skip(api, lines), fields(lines = lines.len()))]
async fn push_cart(api: &ApiClient, lines: &[CartLineInput]) {
    match api.replace_cart(lines).await {
        Ok(()) => debug!("Pushed cart"),
        Err(e) => warn!(error = %e, "Cart push failed"),
    }
}

#[instrument(skip(api, shared))]
async fn load_cart(api: &ApiClient, shared: &CartShared, user: UserId, generation: u64) {
    match api.get_cart().await {
        Ok(items) => {
            if shared.apply_server_cart(user, generation, items) {
                debug!("Loaded server cart");
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to load server cart");
            shared.load_failed(user, generation);
        }
    }
}
