//! Client session wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use samagri::cart::UserId;

use crate::api::{ApiConfig, CartsApi, CatalogApi, HttpBackend};
use crate::cart::mirror::MirrorSync;
use crate::cart::{CartService, CartView, LocalCartService};
use crate::checkout::CheckoutService;
use crate::discounts::{DiscountFeed, DiscountWatcher};
use crate::notify::Notices;
use crate::storage::{FileCartStore, StoreError};

/// Settings for one client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend connection settings.
    pub api: ApiConfig,

    /// Directory holding the persisted cart files.
    pub store_dir: PathBuf,

    /// Cadence of discount polling.
    pub discount_poll_interval: Duration,

    /// The user this session acts as.
    pub user: UserId,
}

/// Errors from building a client context.
#[derive(Debug, Error)]
pub enum ClientInitError {
    /// The cart state directory could not be prepared.
    #[error("failed to prepare cart state directory")]
    Store(#[from] StoreError),
}

/// One fully wired client session.
///
/// Owns the discount poller and the mirror worker. Dropping the context
/// without [`ClientContext::shutdown`] abandons queued mirror writes.
pub struct ClientContext {
    /// Cart reads and mutations.
    pub cart: Arc<dyn CartService>,

    /// Catalog lookups.
    pub catalog: Arc<dyn CatalogApi>,

    /// Order placement.
    pub checkout: CheckoutService,

    /// The active discount code feed.
    pub discounts: DiscountFeed,

    /// User-facing notices.
    pub notices: Notices,

    watcher: DiscountWatcher,
    mirror: MirrorSync,
    mirror_worker: JoinHandle<()>,
}

impl ClientContext {
    /// Wire a full client session from configuration.
    ///
    /// Spawns the discount poller and the mirror worker on the current
    /// runtime.
    ///
    /// # Errors
    ///
    /// - [`ClientInitError::Store`]: the cart state directory could not be
    ///   prepared.
    pub fn initialize(config: ClientConfig) -> Result<Self, ClientInitError> {
        let backend = Arc::new(HttpBackend::new(config.api));
        let store = Arc::new(FileCartStore::open(config.store_dir)?);
        let notices = Notices::new();

        let carts_api: Arc<dyn CartsApi> = backend.clone();
        let (mirror, mirror_worker) = MirrorSync::spawn(carts_api.clone(), notices.clone());

        let (watcher, discounts) = DiscountWatcher::spawn(
            backend.clone(),
            config.discount_poll_interval,
            notices.clone(),
        );

        let cart: Arc<dyn CartService> = Arc::new(LocalCartService::new(
            store,
            carts_api,
            mirror.clone(),
            discounts.clone(),
            notices.clone(),
            config.user,
        ));

        let checkout = CheckoutService::new(backend.clone(), cart.clone(), discounts.clone());

        Ok(ClientContext {
            cart,
            catalog: backend,
            checkout,
            discounts,
            notices,
            watcher,
            mirror,
            mirror_worker,
        })
    }

    /// Subscribe to cart snapshots.
    #[must_use]
    pub fn cart_updates(&self) -> watch::Receiver<Option<CartView>> {
        self.cart.updates()
    }

    /// Stop background work. Polling ends immediately; queued mirror writes
    /// drain before this returns.
    pub async fn shutdown(self) {
        self.watcher.shutdown();
        self.mirror.close();

        _ = self.mirror_worker.await;
    }
}
