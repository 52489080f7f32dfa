//! Cart documents
//!
//! The JSON document shape shared by the on-disk store and the backend
//! mirror. Field names stay camelCase so the same bytes round-trip through
//! both without translation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use samagri::cart::{Cart, CartError, CartId, CartItem, UserId};
use samagri::catalog::ItemRef;

/// Errors from validating a stored or fetched cart document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A line must carry exactly one of `productId` or `bundleId`.
    #[error("cart line must reference exactly one of productId or bundleId")]
    AmbiguousItemKey,

    /// The document violates a cart invariant.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Wire and disk representation of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDocument {
    /// The cart identifier.
    pub cart_id: String,

    /// The owning user.
    pub user_id: UserId,

    /// The cart lines.
    pub cart_items: Vec<CartItemDocument>,
}

/// Wire and disk representation of one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDocument {
    /// Product identifier. Mutually exclusive with `bundle_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,

    /// Bundle identifier. Mutually exclusive with `product_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<u64>,

    /// Unit price in minor units, captured when the line was created.
    pub price: u64,

    /// Quantity on the line.
    pub quantity: u32,

    /// Stock snapshot, when the entity tracks stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl From<&Cart> for CartDocument {
    fn from(cart: &Cart) -> Self {
        CartDocument {
            cart_id: cart.id().as_str().to_owned(),
            user_id: cart.user_id(),
            cart_items: cart.items().iter().map(CartItemDocument::from).collect(),
        }
    }
}

impl From<&CartItem> for CartItemDocument {
    fn from(line: &CartItem) -> Self {
        let (product_id, bundle_id) = match line.item() {
            ItemRef::Product(id) => (Some(id), None),
            ItemRef::Bundle(id) => (None, Some(id)),
        };

        CartItemDocument {
            product_id,
            bundle_id,
            price: line.unit_price(),
            quantity: line.quantity(),
            stock: line.stock(),
        }
    }
}

impl TryFrom<CartDocument> for Cart {
    type Error = DocumentError;

    fn try_from(document: CartDocument) -> Result<Self, Self::Error> {
        let items = document
            .cart_items
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::from_parts(CartId::new(document.cart_id), document.user_id, items)?)
    }
}

impl TryFrom<CartItemDocument> for CartItem {
    type Error = DocumentError;

    fn try_from(document: CartItemDocument) -> Result<Self, Self::Error> {
        let item = match (document.product_id, document.bundle_id) {
            (Some(id), None) => ItemRef::Product(id),
            (None, Some(id)) => ItemRef::Bundle(id),
            _ => return Err(DocumentError::AmbiguousItemKey),
        };

        Ok(CartItem::new(item, document.price, document.quantity, document.stock)?)
    }
}
