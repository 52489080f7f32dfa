//! Order placement.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use samagri::cart::{CartId, UserId};
use samagri::totals::CartTotals;

use crate::api::{ApiError, OrdersApi};
use crate::cart::{CartService, CartServiceError};
use crate::discounts::DiscountFeed;

/// Identifier of a placed order.
pub type OrderId = u64;

/// Identifier of a stored delivery address.
pub type AddressId = u64;

/// Everything the backend needs to turn a cart into an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// The ordering user.
    pub user_id: UserId,

    /// The delivery address.
    pub address_id: AddressId,

    /// The cart to convert.
    pub cart_id: CartId,

    /// The discount code applied at checkout, if one was active.
    pub discount_code: Option<String>,
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// The backend-assigned order identifier.
    pub order_id: OrderId,

    /// The totals the order was placed with.
    pub totals: CartTotals,
}

/// Errors surfaced by order placement.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The backend rejected or failed the order request. The cart is kept.
    #[error("order request failed")]
    Api(#[from] ApiError),

    /// Local cart state could not be read or cleared.
    #[error(transparent)]
    Cart(#[from] CartServiceError),
}

/// Turns the active cart into an order and retires the cart.
pub struct CheckoutService {
    orders: Arc<dyn OrdersApi>,
    cart: Arc<dyn CartService>,
    discounts: DiscountFeed,
}

impl CheckoutService {
    /// Create a checkout service over the given collaborators.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrdersApi>,
        cart: Arc<dyn CartService>,
        discounts: DiscountFeed,
    ) -> Self {
        CheckoutService {
            orders,
            cart,
            discounts,
        }
    }

    /// Place an order for the current cart, delivered to `address_id`.
    ///
    /// On success the local cart is cleared and its backend mirror deleted.
    /// On failure the cart is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`]: no cart, or no lines in it.
    /// - [`CheckoutError::Api`]: the order request failed.
    /// - [`CheckoutError::Cart`]: local state could not be read or cleared.
    pub async fn place_order(&self, address_id: AddressId) -> Result<PlacedOrder, CheckoutError> {
        let Some(view) = self.cart.current().await? else {
            return Err(CheckoutError::EmptyCart);
        };

        if view.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = NewOrder {
            user_id: view.cart.user_id(),
            address_id,
            cart_id: view.cart.id().clone(),
            discount_code: self.discounts.active().map(|code| code.code),
        };

        let order_id = self.orders.create_order(&order).await?;

        info!(order_id, cart_id = %order.cart_id, "order placed");

        self.cart.delete_cart().await?;

        Ok(PlacedOrder {
            order_id,
            totals: view.totals,
        })
    }
}
