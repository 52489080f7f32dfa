//! Backend API surface, one trait per resource family.

use async_trait::async_trait;
use mockall::automock;

use samagri::cart::CartId;
use samagri::catalog::{BundleId, Listing, ProductId};

use crate::{
    api::ApiError,
    cart::document::CartDocument,
    checkout::{NewOrder, OrderId},
    discounts::DiscountCode,
};

/// A catalog entity ready to be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Display name.
    pub name: String,

    /// The purchasable listing behind the entity.
    pub listing: Listing,
}

/// Catalog lookups.
#[automock]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotFound`]: no such product.
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedResponse`]: the request
    ///   failed.
    async fn product(&self, id: ProductId) -> Result<CatalogEntry, ApiError>;

    /// Fetch one bundle.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotFound`]: no such bundle.
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedResponse`]: the request
    ///   failed.
    async fn bundle(&self, id: BundleId) -> Result<CatalogEntry, ApiError>;
}

/// The backend's copy of the cart.
#[automock]
#[async_trait]
pub trait CartsApi: Send + Sync {
    /// Fetch the mirrored cart document.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotFound`]: the backend has no cart under this id.
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedResponse`]: the request
    ///   failed.
    async fn fetch_cart(&self, id: &CartId) -> Result<CartDocument, ApiError>;

    /// Create or replace the mirrored cart wholesale.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedResponse`]: the request
    ///   failed.
    async fn upsert_cart(&self, document: &CartDocument) -> Result<(), ApiError>;

    /// Delete the mirrored cart.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedResponse`]: the request
    ///   failed.
    async fn delete_cart(&self, id: &CartId) -> Result<(), ApiError>;
}

/// Discount announcements.
#[automock]
#[async_trait]
pub trait DiscountsApi: Send + Sync {
    /// The discount codes currently flagged active by the backend.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedResponse`]: the request
    ///   failed.
    /// - [`ApiError::Rate`]: an announced rate was outside `[0, 1]`.
    async fn active_discounts(&self) -> Result<Vec<DiscountCode>, ApiError>;
}

/// Order placement.
#[automock]
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// Convert a cart into an order, returning the new order's id.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] / [`ApiError::UnexpectedResponse`]: the backend
    ///   rejected or failed the request.
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, ApiError>;
}
