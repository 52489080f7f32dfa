//! Discount rates

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from constructing a discount rate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    /// Rates below zero or above one are rejected.
    #[error("discount rate must be between 0 and 1")]
    OutOfRange,
}

/// A validated fractional discount rate in the closed range `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountRate(Decimal);

impl DiscountRate {
    /// The rate that discounts nothing.
    pub const ZERO: DiscountRate = DiscountRate(Decimal::ZERO);

    /// Validate a decimal into a discount rate.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::OutOfRange`] when the value lies outside `[0, 1]`.
    pub fn new(value: Decimal) -> Result<Self, RateError> {
        if !(Decimal::ZERO..=Decimal::ONE).contains(&value) {
            return Err(RateError::OutOfRange);
        }

        Ok(DiscountRate(value))
    }

    /// The underlying decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The rate expressed in percent, with trailing zeros trimmed.
    pub fn as_percent(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn accepts_rates_within_range() -> TestResult {
        assert_eq!(DiscountRate::new(dec!(0))?.value(), dec!(0));
        assert_eq!(DiscountRate::new(dec!(0.1))?.value(), dec!(0.1));
        assert_eq!(DiscountRate::new(dec!(1))?.value(), dec!(1));

        Ok(())
    }

    #[test]
    fn rejects_rates_outside_range() {
        assert!(matches!(
            DiscountRate::new(dec!(-0.01)),
            Err(RateError::OutOfRange)
        ));
        assert!(matches!(
            DiscountRate::new(dec!(1.01)),
            Err(RateError::OutOfRange)
        ));
    }

    #[test]
    fn as_percent_trims_trailing_zeros() -> TestResult {
        let rate = DiscountRate::new(dec!(0.10))?;

        assert_eq!(rate.as_percent(), dec!(10));

        Ok(())
    }
}
