//! Totals

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

use crate::{cart::Cart, discounts::DiscountRate};

/// Errors that can occur while calculating cart totals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalsError {
    /// A total exceeded the representable range of minor units.
    #[error("cart totals overflowed")]
    Overflow,
}

/// Totals for a cart at one moment, all in minor units.
///
/// Totals are derived on demand and never stored, so they always reflect the
/// discount rate in effect when they were requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of unit price times quantity across all lines.
    pub subtotal: u64,

    /// Amount removed by the discount rate.
    pub discount: u64,

    /// Subtotal less discount.
    pub grand_total: u64,
}

/// Calculate the totals of a cart under a discount rate.
///
/// An empty cart totals to zero across the board.
///
/// # Errors
///
/// Returns [`TotalsError::Overflow`] if any intermediate amount leaves the
/// representable range.
pub fn cart_totals(cart: &Cart, rate: DiscountRate) -> Result<CartTotals, TotalsError> {
    let subtotal = cart.items().iter().try_fold(0_u64, |acc, line| {
        let line_total = line.line_total().ok_or(TotalsError::Overflow)?;

        acc.checked_add(line_total).ok_or(TotalsError::Overflow)
    })?;

    let discount = rate_of_minor(rate, subtotal)?;

    let grand_total = subtotal.checked_sub(discount).ok_or(TotalsError::Overflow)?;

    Ok(CartTotals {
        subtotal,
        discount,
        grand_total,
    })
}

/// Calculate the discounted share of a minor unit amount, rounding midpoints
/// away from zero.
fn rate_of_minor(rate: DiscountRate, minor: u64) -> Result<u64, TotalsError> {
    let Some(applied) = rate.value().checked_mul(Decimal::from(minor)) else {
        return Err(TotalsError::Overflow);
    };

    let rounded = applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let Some(rounded) = rounded.to_u64() else {
        return Err(TotalsError::Overflow);
    };

    Ok(rounded)
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use crate::{
        cart::{ANONYMOUS_USER, Cart, CartError, CartId},
        catalog::{ItemRef, Listing},
    };

    use super::*;

    fn cart_with(lines: &[(ItemRef, u64, u32)]) -> Result<Cart, CartError> {
        let mut cart = Cart::new(CartId::new("cart-1"), ANONYMOUS_USER);

        for (item, price, quantity) in lines {
            cart.upsert(&Listing::new(*item, *price, None), *quantity)?;
        }

        Ok(cart)
    }

    #[test]
    fn subtotal_sums_price_times_quantity() -> TestResult {
        let cart = cart_with(&[
            (ItemRef::Product(1), 250, 2),
            (ItemRef::Product(2), 1200, 1),
        ])?;

        let totals = cart_totals(&cart, DiscountRate::ZERO)?;

        assert_eq!(totals.subtotal, 1700);
        assert_eq!(totals.discount, 0);
        assert_eq!(totals.grand_total, 1700);

        Ok(())
    }

    #[test]
    fn discount_is_rate_times_subtotal() -> TestResult {
        let cart = cart_with(&[(ItemRef::Product(1), 500, 3)])?;
        let rate = DiscountRate::new(dec!(0.1))?;

        let totals = cart_totals(&cart, rate)?;

        assert_eq!(totals.subtotal, 1500);
        assert_eq!(totals.discount, 150);
        assert_eq!(totals.grand_total, 1350);

        Ok(())
    }

    #[test]
    fn midpoints_round_away_from_zero() -> TestResult {
        let cart = cart_with(&[(ItemRef::Product(1), 25, 1)])?;
        let rate = DiscountRate::new(dec!(0.1))?;

        let totals = cart_totals(&cart, rate)?;

        assert_eq!(totals.discount, 3, "2.5 minor units must round up to 3");
        assert_eq!(totals.grand_total, 22);

        Ok(())
    }

    #[test]
    fn empty_cart_totals_to_zero() -> TestResult {
        let cart = Cart::new(CartId::new("cart-1"), ANONYMOUS_USER);

        let totals = cart_totals(&cart, DiscountRate::new(dec!(0.5))?)?;

        assert_eq!(
            totals,
            CartTotals {
                subtotal: 0,
                discount: 0,
                grand_total: 0
            }
        );

        Ok(())
    }

    #[test]
    fn full_rate_discounts_everything() -> TestResult {
        let cart = cart_with(&[(ItemRef::Product(1), 999, 1)])?;

        let totals = cart_totals(&cart, DiscountRate::new(dec!(1))?)?;

        assert_eq!(totals.discount, 999);
        assert_eq!(totals.grand_total, 0);

        Ok(())
    }

    #[test]
    fn subtotal_overflow_is_reported() -> TestResult {
        let cart = cart_with(&[
            (ItemRef::Product(1), u64::MAX, 1),
            (ItemRef::Product(2), 1, 1),
        ])?;

        let result = cart_totals(&cart, DiscountRate::ZERO);

        assert!(matches!(result, Err(TotalsError::Overflow)));

        Ok(())
    }
}
