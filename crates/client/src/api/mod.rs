//! Storefront backend REST client.

mod backend;
mod errors;
mod traits;

pub use backend::{ApiConfig, HttpBackend};
pub use errors::ApiError;
pub use traits::*;
