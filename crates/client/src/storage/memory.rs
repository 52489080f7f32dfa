//! In-memory cart storage.

use std::sync::{Mutex, MutexGuard, PoisonError};

use samagri::cart::{Cart, CartId};

use crate::storage::{CartStore, StoreError};

/// Cart storage held entirely in memory.
///
/// Useful in tests and for ephemeral sessions that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    cart: Option<Cart>,
    cart_id: Option<CartId>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Option<Cart> {
        self.state().cart.clone()
    }

    fn stored_cart_id(&self) -> Option<CartId> {
        self.state().cart_id.clone()
    }

    fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut state = self.state();
        state.cart = Some(cart.clone());
        state.cart_id = Some(cart.id().clone());

        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state();
        state.cart = None;
        state.cart_id = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use samagri::catalog::{ItemRef, Listing};

    use super::*;

    #[test]
    fn save_load_and_clear_round_trip() -> TestResult {
        let store = MemoryCartStore::new();
        let mut cart = Cart::new(CartId::new("0198d0e1"), 7);
        cart.upsert(&Listing::new(ItemRef::Bundle(9), 4500, None), 1)?;

        assert!(store.load().is_none());

        store.save(&cart)?;
        assert_eq!(store.load().map(|cart| cart.len()), Some(1));
        assert!(store.stored_cart_id().is_some());

        store.clear()?;
        assert!(store.load().is_none());
        assert!(store.stored_cart_id().is_none());

        Ok(())
    }
}
