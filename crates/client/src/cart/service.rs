//! Cart mutation service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use samagri::cart::{Cart, CartId, UserId};
use samagri::catalog::{ItemRef, Listing};
use samagri::totals::{CartTotals, cart_totals};

use crate::api::{ApiError, CartsApi};
use crate::cart::document::CartDocument;
use crate::cart::errors::CartServiceError;
use crate::cart::mirror::MirrorSync;
use crate::discounts::DiscountFeed;
use crate::notify::{Notice, Notices};
use crate::storage::CartStore;

/// A cart together with the totals in effect when the snapshot was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    /// The cart itself.
    pub cart: Cart,

    /// Totals under the discount rate active at snapshot time.
    pub totals: CartTotals,
}

/// Cart service backed by the local store.
///
/// Every operation runs as one read-modify-persist cycle under an internal
/// lock, so concurrent callers observe each other's writes. Snapshots go out
/// on the watch channel only after the store write succeeds; the backend
/// mirror is queued last.
pub struct LocalCartService {
    store: Arc<dyn CartStore>,
    api: Arc<dyn CartsApi>,
    mirror: MirrorSync,
    discounts: DiscountFeed,
    notices: Notices,
    updates: watch::Sender<Option<CartView>>,
    mutation: Mutex<()>,
    user: UserId,
}

impl LocalCartService {
    /// Create a service acting for `user`.
    #[must_use]
    pub fn new(
        store: Arc<dyn CartStore>,
        api: Arc<dyn CartsApi>,
        mirror: MirrorSync,
        discounts: DiscountFeed,
        notices: Notices,
        user: UserId,
    ) -> Self {
        let (updates, _) = watch::channel(None);

        Self {
            store,
            api,
            mirror,
            discounts,
            notices,
            updates,
            mutation: Mutex::new(()),
            user,
        }
    }

    fn view(&self, cart: Cart) -> Result<CartView, CartServiceError> {
        let totals = cart_totals(&cart, self.discounts.current_rate())?;

        Ok(CartView { cart, totals })
    }

    /// Persist a mutated cart, then publish and mirror it.
    fn persist(&self, cart: Cart) -> Result<CartView, CartServiceError> {
        let view = self.view(cart)?;

        self.store.save(&view.cart)?;
        self.updates.send_replace(Some(view.clone()));
        self.mirror.upsert(CartDocument::from(&view.cart));

        Ok(view)
    }

    /// Drop local state and tell subscribers the cart is gone.
    fn clear(&self) -> Result<(), CartServiceError> {
        self.store.clear()?;
        self.updates.send_replace(None);

        Ok(())
    }
}

#[async_trait]
impl CartService for LocalCartService {
    async fn current(&self) -> Result<Option<CartView>, CartServiceError> {
        let _guard = self.mutation.lock().await;

        self.store.load().map(|cart| self.view(cart)).transpose()
    }

    async fn hydrate(&self) -> Result<Option<CartView>, CartServiceError> {
        let _guard = self.mutation.lock().await;

        if let Some(cart) = self.store.load() {
            let view = self.view(cart)?;
            self.updates.send_replace(Some(view.clone()));

            return Ok(Some(view));
        }

        // The document is gone or unreadable. If the identifier survived,
        // the backend mirror may still have the cart.
        let Some(id) = self.store.stored_cart_id() else {
            return Ok(None);
        };

        match self.api.fetch_cart(&id).await {
            Ok(document) => {
                let cart = match Cart::try_from(document) {
                    Ok(cart) => cart,
                    Err(error) => {
                        warn!(%error, cart_id = %id, "mirrored cart is invalid, discarding");
                        self.clear()?;

                        return Ok(None);
                    }
                };

                if cart.is_empty() {
                    self.clear()?;

                    return Ok(None);
                }

                info!(cart_id = %id, "cart recovered from backend mirror");

                let view = self.view(cart)?;
                self.store.save(&view.cart)?;
                self.updates.send_replace(Some(view.clone()));

                Ok(Some(view))
            }
            Err(ApiError::NotFound(_)) => {
                // The cart was deleted on the backend. The identifier is
                // stale and can go.
                self.clear()?;

                Ok(None)
            }
            Err(error) => {
                warn!(%error, cart_id = %id, "cart recovery failed, keeping the identifier for a later retry");

                Ok(None)
            }
        }
    }

    async fn add_item(
        &self,
        listing: &Listing,
        quantity: u32,
    ) -> Result<CartView, CartServiceError> {
        let _guard = self.mutation.lock().await;

        let mut cart = self
            .store
            .load()
            .unwrap_or_else(|| Cart::new(new_cart_id(), self.user));

        let change = cart.upsert(listing, quantity)?;

        if change.clamped {
            debug!(item = %listing.item(), quantity = change.quantity, "add clamped to stock");
        }

        self.persist(cart)
    }

    async fn remove_item(&self, item: ItemRef) -> Result<Option<CartView>, CartServiceError> {
        let _guard = self.mutation.lock().await;

        let Some(mut cart) = self.store.load() else {
            return Ok(None);
        };

        if !cart.remove(item) {
            return Ok(Some(self.view(cart)?));
        }

        if cart.is_empty() {
            // The backend hears about the emptied cart before local state
            // goes away.
            self.mirror.upsert(CartDocument::from(&cart));
            self.clear()?;

            return Ok(None);
        }

        Ok(Some(self.persist(cart)?))
    }

    async fn increment_quantity(
        &self,
        item: ItemRef,
        amount: u32,
    ) -> Result<Option<CartView>, CartServiceError> {
        let _guard = self.mutation.lock().await;

        let Some(mut cart) = self.store.load() else {
            return Ok(None);
        };

        let Some(change) = cart.increment(item, amount) else {
            return Ok(Some(self.view(cart)?));
        };

        if change.clamped {
            self.notices.publish(Notice::StockLimited {
                item,
                available: change.quantity,
            });
        }

        Ok(Some(self.persist(cart)?))
    }

    async fn decrement_quantity(
        &self,
        item: ItemRef,
        amount: u32,
    ) -> Result<Option<CartView>, CartServiceError> {
        let _guard = self.mutation.lock().await;

        let Some(mut cart) = self.store.load() else {
            return Ok(None);
        };

        if cart.decrement(item, amount).is_none() {
            return Ok(Some(self.view(cart)?));
        }

        Ok(Some(self.persist(cart)?))
    }

    async fn replace_cart(&self, cart: Cart) -> Result<Option<CartView>, CartServiceError> {
        let _guard = self.mutation.lock().await;

        if cart.is_empty() {
            self.mirror.upsert(CartDocument::from(&cart));
            self.clear()?;

            return Ok(None);
        }

        Ok(Some(self.persist(cart)?))
    }

    async fn delete_cart(&self) -> Result<(), CartServiceError> {
        let _guard = self.mutation.lock().await;

        if let Some(id) = self.store.stored_cart_id() {
            self.mirror.delete(id);
        }

        self.clear()
    }

    fn updates(&self) -> watch::Receiver<Option<CartView>> {
        self.updates.subscribe()
    }
}

/// Mint a client-side cart identifier.
fn new_cart_id() -> CartId {
    CartId::new(Uuid::now_v7().to_string())
}

/// High-level cart operations offered to the rest of the client.
#[automock]
#[async_trait]
pub trait CartService: Send + Sync {
    /// The current cart with totals under the rate in effect right now.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Totals`]: totals for the stored cart overflowed.
    async fn current(&self) -> Result<Option<CartView>, CartServiceError>;

    /// Load the persisted cart, recovering from the backend mirror when only
    /// the identifier survived.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Store`]: stale local state could not be cleared.
    /// - [`CartServiceError::Totals`]: totals for the cart overflowed.
    async fn hydrate(&self) -> Result<Option<CartView>, CartServiceError>;

    /// Validate a listing and merge it into the cart, creating the cart on
    /// first use.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Cart`]: the listing or quantity was rejected;
    ///   nothing changed.
    /// - [`CartServiceError::Store`]: the new state could not be persisted.
    async fn add_item(
        &self,
        listing: &Listing,
        quantity: u32,
    ) -> Result<CartView, CartServiceError>;

    /// Remove a line. Removing the last line also clears persisted state and
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Store`]: the new state could not be persisted.
    async fn remove_item(&self, item: ItemRef) -> Result<Option<CartView>, CartServiceError>;

    /// Raise a line's quantity, capped at its stock snapshot.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Store`]: the new state could not be persisted.
    async fn increment_quantity(
        &self,
        item: ItemRef,
        amount: u32,
    ) -> Result<Option<CartView>, CartServiceError>;

    /// Lower a line's quantity, floored at one.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Store`]: the new state could not be persisted.
    async fn decrement_quantity(
        &self,
        item: ItemRef,
        amount: u32,
    ) -> Result<Option<CartView>, CartServiceError>;

    /// Replace the whole cart. An empty replacement removes local state, as
    /// if the last line had been taken out.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Store`]: the new state could not be persisted.
    async fn replace_cart(&self, cart: Cart) -> Result<Option<CartView>, CartServiceError>;

    /// Drop local state and queue a backend-side deletion.
    ///
    /// # Errors
    ///
    /// - [`CartServiceError::Store`]: local state could not be cleared.
    async fn delete_cart(&self) -> Result<(), CartServiceError>;

    /// Subscribe to cart snapshots. `None` means no cart exists.
    fn updates(&self) -> watch::Receiver<Option<CartView>>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;
    use tokio::task::JoinHandle;

    use samagri::cart::{ANONYMOUS_USER, CartError};
    use samagri::catalog::ListingError;
    use samagri::discounts::DiscountRate;

    use crate::api::MockCartsApi;
    use crate::cart::document::CartItemDocument;
    use crate::storage::{MemoryCartStore, MockCartStore};

    use super::*;

    fn incense() -> Listing {
        Listing::new(ItemRef::Product(42), 250, Some(10))
    }

    fn brass_diya() -> Listing {
        Listing::new(ItemRef::Product(7), 1200, Some(3))
    }

    fn accepting_api() -> MockCartsApi {
        let mut api = MockCartsApi::new();
        api.expect_upsert_cart().returning(|_| Ok(()));
        api.expect_delete_cart().returning(|_| Ok(()));

        api
    }

    struct Harness {
        service: LocalCartService,
        mirror: MirrorSync,
        worker: JoinHandle<()>,
        notices: Notices,
    }

    impl Harness {
        fn with_api(api: MockCartsApi, rate: Option<DiscountRate>) -> Self {
            Self::build(Arc::new(MemoryCartStore::new()), api, rate)
        }

        fn with_store(store: MockCartStore, api: MockCartsApi) -> Self {
            Self::build(Arc::new(store), api, None)
        }

        fn build(
            store: Arc<dyn CartStore>,
            api: MockCartsApi,
            rate: Option<DiscountRate>,
        ) -> Self {
            let api: Arc<dyn CartsApi> = Arc::new(api);
            let notices = Notices::new();
            let (mirror, worker) = MirrorSync::spawn(api.clone(), notices.clone());

            let feed = DiscountFeed::fixed(rate.map(|rate| crate::discounts::DiscountCode {
                code: "BAISAKHI10".to_owned(),
                rate,
                expires_on: None,
            }));

            let service =
                LocalCartService::new(store, api, mirror.clone(), feed, notices.clone(), ANONYMOUS_USER);

            Harness {
                service,
                mirror,
                worker,
                notices,
            }
        }

        async fn drain_mirror(self) -> TestResult {
            self.mirror.close();
            self.worker.await?;

            Ok(())
        }
    }

    #[tokio::test]
    async fn adding_creates_a_cart_and_merges_repeats() -> TestResult {
        let harness = Harness::with_api(accepting_api(), None);

        let first = harness.service.add_item(&incense(), 2).await?;
        assert_eq!(first.cart.len(), 1);
        assert_eq!(first.totals.subtotal, 500);

        let second = harness.service.add_item(&incense(), 1).await?;
        assert_eq!(second.cart.len(), 1, "repeat adds should merge into one line");
        assert_eq!(second.totals.subtotal, 750);

        let current = harness.service.current().await?.ok_or("expected a cart")?;
        assert_eq!(current.cart.id(), second.cart.id(), "the cart id should be stable");

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn an_out_of_stock_listing_changes_nothing() -> TestResult {
        let harness = Harness::with_api(MockCartsApi::new(), None);

        let sold_out = Listing::new(ItemRef::Product(42), 250, Some(0));
        let result = harness.service.add_item(&sold_out, 1).await;

        assert!(
            matches!(
                result,
                Err(CartServiceError::Cart(CartError::Listing(ListingError::OutOfStock)))
            ),
            "expected an out of stock rejection, got {result:?}"
        );
        assert!(
            harness.service.current().await?.is_none(),
            "a rejected add should not create a cart"
        );

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn totals_reflect_the_rate_active_at_mutation_time() -> TestResult {
        let rate = DiscountRate::new(dec!(0.1))?;
        let harness = Harness::with_api(accepting_api(), Some(rate));

        let view = harness.service.add_item(&incense(), 2).await?;

        assert_eq!(view.totals.subtotal, 500);
        assert_eq!(view.totals.discount, 50);
        assert_eq!(view.totals.grand_total, 450);

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn removing_the_last_line_retires_the_cart() -> TestResult {
        let mut api = MockCartsApi::new();
        api.expect_upsert_cart()
            .withf(|document| !document.cart_items.is_empty())
            .returning(|_| Ok(()));
        // The emptied cart is still mirrored once before local state goes.
        api.expect_upsert_cart()
            .withf(|document| document.cart_items.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let harness = Harness::with_api(api, None);

        harness.service.add_item(&incense(), 2).await?;

        let after = harness.service.remove_item(ItemRef::Product(42)).await?;
        assert!(after.is_none(), "removing the last line should empty the cart");
        assert!(harness.service.current().await?.is_none());

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn removing_a_missing_line_leaves_the_cart_alone() -> TestResult {
        let harness = Harness::with_api(accepting_api(), None);

        harness.service.add_item(&incense(), 2).await?;

        let view = harness
            .service
            .remove_item(ItemRef::Bundle(9))
            .await?
            .ok_or("expected the cart to survive")?;

        assert_eq!(view.cart.len(), 1);

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn clamped_increments_publish_a_stock_notice() -> TestResult {
        let harness = Harness::with_api(accepting_api(), None);
        let mut inbox = harness.notices.subscribe();

        harness.service.add_item(&brass_diya(), 2).await?;

        let view = harness
            .service
            .increment_quantity(ItemRef::Product(7), 5)
            .await?
            .ok_or("expected a cart")?;

        assert_eq!(
            view.cart.get(ItemRef::Product(7)).map(|line| line.quantity()),
            Some(3),
            "the quantity should cap at the stock snapshot"
        );

        let notice = inbox.recv().await?;
        assert!(
            matches!(notice, Notice::StockLimited { available: 3, .. }),
            "expected a stock notice, got {notice:?}"
        );

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn decrements_floor_at_one() -> TestResult {
        let harness = Harness::with_api(accepting_api(), None);

        harness.service.add_item(&incense(), 2).await?;

        let view = harness
            .service
            .decrement_quantity(ItemRef::Product(42), 10)
            .await?
            .ok_or("expected a cart")?;

        assert_eq!(
            view.cart.get(ItemRef::Product(42)).map(|line| line.quantity()),
            Some(1),
            "decrements should never remove the line"
        );

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn mutations_on_no_cart_return_none() -> TestResult {
        let harness = Harness::with_api(MockCartsApi::new(), None);

        assert!(harness.service.remove_item(ItemRef::Product(42)).await?.is_none());
        assert!(harness
            .service
            .increment_quantity(ItemRef::Product(42), 1)
            .await?
            .is_none());
        assert!(harness
            .service
            .decrement_quantity(ItemRef::Product(42), 1)
            .await?
            .is_none());

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn replacing_with_an_empty_cart_clears_state() -> TestResult {
        let harness = Harness::with_api(accepting_api(), None);

        harness.service.add_item(&incense(), 1).await?;

        let empty = Cart::new(CartId::new("0198d0e1"), ANONYMOUS_USER);
        let view = harness.service.replace_cart(empty).await?;

        assert!(view.is_none());
        assert!(harness.service.current().await?.is_none());

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn delete_queues_a_backend_deletion() -> TestResult {
        let mut api = MockCartsApi::new();
        api.expect_upsert_cart().returning(|_| Ok(()));
        api.expect_delete_cart().times(1).returning(|_| Ok(()));

        let harness = Harness::with_api(api, None);

        harness.service.add_item(&incense(), 1).await?;
        harness.service.delete_cart().await?;

        assert!(harness.service.current().await?.is_none());

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn watch_subscribers_see_writes_and_clears() -> TestResult {
        let harness = Harness::with_api(accepting_api(), None);
        let mut snapshots = harness.service.updates();

        harness.service.add_item(&incense(), 2).await?;
        snapshots.changed().await?;

        let seen = snapshots.borrow_and_update().clone().ok_or("expected a snapshot")?;
        assert_eq!(seen.totals.subtotal, 500);

        harness.service.delete_cart().await?;
        snapshots.changed().await?;

        assert!(
            snapshots.borrow_and_update().is_none(),
            "deleting should publish the cart's absence"
        );

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn hydrate_prefers_the_local_document() -> TestResult {
        let harness = Harness::with_api(accepting_api(), None);

        harness.service.add_item(&incense(), 2).await?;

        let view = harness.service.hydrate().await?.ok_or("expected a cart")?;
        assert_eq!(view.totals.subtotal, 500);

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn hydrate_recovers_from_the_mirror_when_only_the_id_survived() -> TestResult {
        let mut store = MockCartStore::new();
        store.expect_load().returning(|| None);
        store
            .expect_stored_cart_id()
            .returning(|| Some(CartId::new("0198d0e1")));
        store.expect_save().times(1).returning(|_| Ok(()));

        let mut api = MockCartsApi::new();
        api.expect_fetch_cart().returning(|id| {
            Ok(CartDocument {
                cart_id: id.as_str().to_owned(),
                user_id: ANONYMOUS_USER,
                cart_items: vec![CartItemDocument {
                    product_id: Some(42),
                    bundle_id: None,
                    price: 250,
                    quantity: 2,
                    stock: Some(10),
                }],
            })
        });

        let harness = Harness::with_store(store, api);

        let view = harness.service.hydrate().await?.ok_or("expected a recovered cart")?;
        assert_eq!(view.cart.id().as_str(), "0198d0e1");
        assert_eq!(view.totals.subtotal, 500);

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn hydrate_clears_the_id_when_the_backend_lost_the_cart() -> TestResult {
        let mut store = MockCartStore::new();
        store.expect_load().returning(|| None);
        store
            .expect_stored_cart_id()
            .returning(|| Some(CartId::new("0198d0e1")));
        store.expect_clear().times(1).returning(|| Ok(()));

        let mut api = MockCartsApi::new();
        api.expect_fetch_cart()
            .returning(|id| Err(ApiError::NotFound(format!("cart {id}"))));

        let harness = Harness::with_store(store, api);

        assert!(harness.service.hydrate().await?.is_none());

        harness.drain_mirror().await
    }

    #[tokio::test]
    async fn hydrate_keeps_the_id_on_transient_failures() -> TestResult {
        let mut store = MockCartStore::new();
        store.expect_load().returning(|| None);
        store
            .expect_stored_cart_id()
            .returning(|| Some(CartId::new("0198d0e1")));

        let mut api = MockCartsApi::new();
        api.expect_fetch_cart()
            .returning(|_| Err(ApiError::UnexpectedResponse("backend down".to_owned())));

        let harness = Harness::with_store(store, api);

        assert!(harness.service.hydrate().await?.is_none());

        harness.drain_mirror().await
    }
}
