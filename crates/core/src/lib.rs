//! Samagri
//!
//! Samagri is the cart, discount and totals core of a headless storefront client, written in Rust.

pub mod cart;
pub mod catalog;
pub mod discounts;
pub mod totals;
