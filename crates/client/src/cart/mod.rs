//! Cart state: the shared document shape, the mutation service and the
//! backend mirror.

pub mod document;
pub mod errors;
pub mod mirror;
pub mod service;

pub use errors::CartServiceError;
pub use service::*;
