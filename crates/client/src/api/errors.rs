//! Backend API errors.

use thiserror::Error;

use samagri::discounts::RateError;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The requested entity does not exist on the backend.
    #[error("{0} not found")]
    NotFound(String),

    /// The backend returned a non-2xx response or an unexpected body.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),

    /// The backend announced a discount with an out-of-range rate.
    #[error(transparent)]
    Rate(#[from] RateError),
}
