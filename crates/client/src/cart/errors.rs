//! Cart service errors.

use thiserror::Error;

use samagri::cart::CartError;
use samagri::totals::TotalsError;

use crate::storage::StoreError;

/// Errors surfaced by cart reads and mutations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// The mutation was rejected before any state changed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Totals could not be computed for the new cart state.
    #[error(transparent)]
    Totals(#[from] TotalsError),

    /// Persisting or clearing local state failed.
    #[error("cart storage failed")]
    Store(#[from] StoreError),
}
