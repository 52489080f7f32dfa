//! Carts

use std::fmt;

use thiserror::Error;

use crate::catalog::{ItemRef, Listing, ListingError};

/// Identifier of the user a cart belongs to.
pub type UserId = u64;

/// Placeholder user id for carts built before sign-in.
pub const ANONYMOUS_USER: UserId = 0;

/// Opaque identifier of a cart.
///
/// Minted by the client and echoed by the backend, so the core treats it as
/// an arbitrary string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartId(String);

impl CartId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        CartId(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors related to cart construction or mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantity arguments must be at least one.
    #[error("quantity must be at least one")]
    ZeroQuantity,

    /// The listing cannot be purchased.
    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Two cart lines reference the same catalog entity.
    #[error("duplicate cart line for {0}")]
    DuplicateItem(ItemRef),
}

/// Outcome of a quantity mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChange {
    /// The quantity after the mutation.
    pub quantity: u32,

    /// Whether the requested quantity was adjusted to stay within bounds.
    pub clamped: bool,
}

/// One line of a cart: a catalog entity with its captured price and quantity.
///
/// The unit price and stock are snapshots taken when the line was first
/// added; merging more of the same entity never refreshes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    item: ItemRef,
    unit_price: u64,
    quantity: u32,
    stock: Option<u32>,
}

impl CartItem {
    /// Create a cart line.
    ///
    /// # Errors
    ///
    /// - [`CartError::ZeroQuantity`]: `quantity` is zero.
    /// - [`CartError::Listing`]: `unit_price` is zero.
    pub fn new(
        item: ItemRef,
        unit_price: u64,
        quantity: u32,
        stock: Option<u32>,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if unit_price == 0 {
            return Err(CartError::Listing(ListingError::ZeroPrice));
        }

        Ok(CartItem {
            item,
            unit_price,
            quantity,
            stock,
        })
    }

    /// The catalog entity this line refers to.
    pub fn item(&self) -> ItemRef {
        self.item
    }

    /// The captured unit price in minor units.
    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    /// The quantity on the line.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// The stock snapshot taken when the line was added, if tracked.
    pub fn stock(&self) -> Option<u32> {
        self.stock
    }

    /// Price of the whole line in minor units, or `None` on overflow.
    pub fn line_total(&self) -> Option<u64> {
        u64::from(self.quantity).checked_mul(self.unit_price)
    }

    /// Raise the quantity, clamped to the stock snapshot and floored at one.
    fn grow(&mut self, additional: u32) -> QuantityChange {
        let requested = self.quantity.saturating_add(additional);

        self.quantity = match self.stock {
            Some(stock) => requested.min(stock).max(1),
            None => requested,
        };

        QuantityChange {
            quantity: self.quantity,
            clamped: self.quantity != requested,
        }
    }

    /// Lower the quantity, floored at one.
    fn shrink(&mut self, amount: u32) -> QuantityChange {
        let lowered = self.quantity.saturating_sub(amount);

        self.quantity = lowered.max(1);

        QuantityChange {
            quantity: self.quantity,
            clamped: lowered < 1,
        }
    }
}

/// A cart: at most one line per catalog entity, every line with quantity of
/// at least one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(id: CartId, user_id: UserId) -> Self {
        Cart {
            id,
            user_id,
            items: Vec::new(),
        }
    }

    /// Rebuild a cart from stored lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::DuplicateItem`] when two lines reference the
    /// same catalog entity.
    pub fn from_parts(
        id: CartId,
        user_id: UserId,
        items: Vec<CartItem>,
    ) -> Result<Self, CartError> {
        for (index, line) in items.iter().enumerate() {
            let duplicate = items
                .iter()
                .take(index)
                .any(|earlier| earlier.item() == line.item());

            if duplicate {
                return Err(CartError::DuplicateItem(line.item()));
            }
        }

        Ok(Cart { id, user_id, items })
    }

    /// The cart identifier.
    pub fn id(&self) -> &CartId {
        &self.id
    }

    /// The user the cart belongs to.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The cart lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The number of lines in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for a catalog entity.
    pub fn get(&self, item: ItemRef) -> Option<&CartItem> {
        self.items.iter().find(|line| line.item() == item)
    }

    /// Merge a listing into the cart.
    ///
    /// An existing line for the same entity grows by `quantity`; otherwise a
    /// new line is appended. Either way the result is clamped to the stock
    /// snapshot, and an existing line keeps its originally captured price.
    ///
    /// # Errors
    ///
    /// - [`CartError::ZeroQuantity`]: `quantity` is zero.
    /// - [`CartError::Listing`]: the listing is unpurchasable; the cart is
    ///   left untouched.
    pub fn upsert(&mut self, listing: &Listing, quantity: u32) -> Result<QuantityChange, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        listing.purchasable()?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.item() == listing.item())
        {
            return Ok(existing.grow(quantity));
        }

        let capped = match listing.stock() {
            Some(stock) => quantity.min(stock),
            None => quantity,
        };

        let line = CartItem::new(listing.item(), listing.unit_price(), capped, listing.stock())?;

        let change = QuantityChange {
            quantity: line.quantity(),
            clamped: capped < quantity,
        };

        self.items.push(line);

        Ok(change)
    }

    /// Remove the line for a catalog entity.
    ///
    /// Returns whether a line was actually removed.
    pub fn remove(&mut self, item: ItemRef) -> bool {
        let before = self.items.len();

        self.items.retain(|line| line.item() != item);

        self.items.len() < before
    }

    /// Raise the quantity of an existing line, clamped to its stock snapshot.
    ///
    /// Returns `None` when no line exists for the entity.
    pub fn increment(&mut self, item: ItemRef, amount: u32) -> Option<QuantityChange> {
        self.items
            .iter_mut()
            .find(|line| line.item() == item)
            .map(|line| line.grow(amount))
    }

    /// Lower the quantity of an existing line, floored at one.
    ///
    /// Lines are never removed this way; removal is an explicit, separate
    /// action.
    ///
    /// Returns `None` when no line exists for the entity.
    pub fn decrement(&mut self, item: ItemRef, amount: u32) -> Option<QuantityChange> {
        self.items
            .iter_mut()
            .find(|line| line.item() == item)
            .map(|line| line.shrink(amount))
    }
}
