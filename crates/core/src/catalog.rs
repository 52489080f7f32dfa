//! Catalog references

use std::fmt;

use thiserror::Error;

/// Identifier of a single product.
pub type ProductId = u64;

/// Identifier of a bundle of products sold together.
pub type BundleId = u64;

/// Reference to a purchasable catalog entity.
///
/// Products and bundles have independent identifier spaces, so a cart line is
/// keyed by this pair rather than by a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    /// A single product.
    Product(ProductId),

    /// A bundle of products.
    Bundle(BundleId),
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Product(id) => write!(f, "product {id}"),
            ItemRef::Bundle(id) => write!(f, "bundle {id}"),
        }
    }
}

/// Errors that make a listing unpurchasable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    /// The listing has no positive price.
    #[error("item price must be positive")]
    ZeroPrice,

    /// The listing tracks stock and none is left.
    #[error("item is out of stock")]
    OutOfStock,
}

/// Snapshot of a catalog entity at the moment it is added to a cart.
///
/// `stock` is `None` for entities that do not track inventory; such listings
/// are never quantity-clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    item: ItemRef,
    unit_price: u64,
    stock: Option<u32>,
}

impl Listing {
    /// Create a listing snapshot with a unit price in minor units.
    pub fn new(item: ItemRef, unit_price: u64, stock: Option<u32>) -> Self {
        Listing {
            item,
            unit_price,
            stock,
        }
    }

    /// The catalog entity this listing refers to.
    pub fn item(&self) -> ItemRef {
        self.item
    }

    /// The unit price in minor units.
    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    /// The available stock, if tracked.
    pub fn stock(&self) -> Option<u32> {
        self.stock
    }

    /// Check that the listing can be purchased at all.
    ///
    /// # Errors
    ///
    /// - [`ListingError::ZeroPrice`]: the listing has no positive price.
    /// - [`ListingError::OutOfStock`]: stock is tracked and exhausted.
    pub fn purchasable(&self) -> Result<(), ListingError> {
        if self.unit_price == 0 {
            return Err(ListingError::ZeroPrice);
        }

        if self.stock == Some(0) {
            return Err(ListingError::OutOfStock);
        }

        Ok(())
    }
}
