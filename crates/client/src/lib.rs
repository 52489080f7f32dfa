//! Client runtime for a headless storefront: persisted cart state, discount
//! polling, backend mirroring and order placement.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod context;
pub mod discounts;
pub mod notify;
pub mod storage;
