//! Cart Walkthrough Example
//!
//! Builds a small cart, applies a discount rate, and prints the totals at
//! each step.

use anyhow::Result;
use rust_decimal::dec;

use samagri::{
    cart::{ANONYMOUS_USER, Cart, CartId},
    catalog::{ItemRef, Listing},
    discounts::DiscountRate,
    totals::cart_totals,
};

/// Cart Walkthrough Example
#[expect(clippy::print_stdout, reason = "Example program output to user")]
pub fn main() -> Result<()> {
    let incense = Listing::new(ItemRef::Product(42), 500, Some(10));
    let thali = Listing::new(ItemRef::Bundle(3), 4500, None);

    let mut cart = Cart::new(CartId::new("example-cart"), ANONYMOUS_USER);

    cart.upsert(&incense, 2)?;
    cart.upsert(&thali, 1)?;

    let totals = cart_totals(&cart, DiscountRate::ZERO)?;
    println!("subtotal: {} minor units", totals.subtotal);

    let rate = DiscountRate::new(dec!(0.1))?;
    let totals = cart_totals(&cart, rate)?;

    println!("with {}% off:", rate.as_percent());
    println!("  discount:    {} minor units", totals.discount);
    println!("  grand total: {} minor units", totals.grand_total);

    Ok(())
}
