//! Durable cart storage.

use mockall::automock;
use thiserror::Error;

use samagri::cart::{Cart, CartId};

mod file;
mod memory;

pub use file::FileCartStore;
pub use memory::MemoryCartStore;

/// Errors from persisting or clearing cart state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying file operation failed.
    #[error("cart storage io failed")]
    Io(#[from] std::io::Error),

    /// The cart could not be encoded for storage.
    #[error("cart document encoding failed")]
    Encode(#[from] serde_json::Error),
}

/// Durable storage for the single local cart.
///
/// Loads are infallible by contract: state that is missing, unreadable or
/// malformed reads back as no cart at all, and the next save overwrites it.
#[automock]
pub trait CartStore: Send + Sync {
    /// The persisted cart, if a usable one exists.
    fn load(&self) -> Option<Cart>;

    /// The identifier of the last saved cart, if present.
    ///
    /// Kept separately from the cart document so that it survives a corrupt
    /// document and can drive recovery from the backend mirror.
    fn stored_cart_id(&self) -> Option<CartId>;

    /// Persist the cart wholesale, replacing any previous state.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Io`]: the write failed.
    /// - [`StoreError::Encode`]: the cart could not be encoded.
    fn save(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Remove all persisted cart state.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Io`]: the removal failed.
    fn clear(&self) -> Result<(), StoreError>;
}
