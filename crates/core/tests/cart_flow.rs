//! Full shopping session tests

use rust_decimal::dec;
use testresult::TestResult;

use samagri::{
    cart::{ANONYMOUS_USER, Cart, CartId, QuantityChange},
    catalog::{ItemRef, Listing},
    discounts::DiscountRate,
    totals::cart_totals,
};

#[test]
fn full_shopping_session() -> TestResult {
    let incense = Listing::new(ItemRef::Product(42), 500, Some(10));
    let diya = Listing::new(ItemRef::Product(7), 1200, Some(3));

    let mut cart = Cart::new(CartId::new("0198d3a2"), ANONYMOUS_USER);

    // Two packs of incense.
    cart.upsert(&incense, 2)?;
    let totals = cart_totals(&cart, DiscountRate::ZERO)?;
    assert_eq!(totals.subtotal, 1000);

    // A third pack merges instead of adding a line.
    cart.upsert(&incense, 1)?;
    assert_eq!(cart.len(), 1);
    let totals = cart_totals(&cart, DiscountRate::ZERO)?;
    assert_eq!(totals.subtotal, 1500);

    // The festival code takes 10% off the whole cart.
    let rate = DiscountRate::new(dec!(0.1))?;
    let totals = cart_totals(&cart, rate)?;
    assert_eq!(totals.discount, 150);
    assert_eq!(totals.grand_total, 1350);

    // The diya is limited by its stock snapshot.
    cart.upsert(&diya, 1)?;
    let change = cart.increment(ItemRef::Product(7), 4);
    assert_eq!(change, Some(QuantityChange { quantity: 3, clamped: true }));

    // Quantities never fall below one.
    let change = cart.decrement(ItemRef::Product(42), 10);
    assert_eq!(change, Some(QuantityChange { quantity: 1, clamped: true }));

    // Clearing both lines leaves nothing to pay.
    assert!(cart.remove(ItemRef::Product(42)));
    assert!(cart.remove(ItemRef::Product(7)));
    assert!(cart.is_empty());

    let totals = cart_totals(&cart, rate)?;
    assert_eq!(totals.grand_total, 0);

    Ok(())
}

#[test]
fn rebuilding_a_cart_preserves_totals() -> TestResult {
    let mut original = Cart::new(CartId::new("0198d3a2"), 12);

    original.upsert(&Listing::new(ItemRef::Product(1), 250, None), 4)?;
    original.upsert(&Listing::new(ItemRef::Bundle(1), 4500, None), 1)?;

    let rebuilt = Cart::from_parts(
        original.id().clone(),
        original.user_id(),
        original.items().to_vec(),
    )?;

    let rate = DiscountRate::new(dec!(0.25))?;

    assert_eq!(cart_totals(&rebuilt, rate)?, cart_totals(&original, rate)?);

    Ok(())
}
