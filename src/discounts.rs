//! Discounts
//!
//! Discount types and the money arithmetic shared by the calculator: turning
//! a configured decimal into a percentage or a fixed amount, and applying it
//! to prices held in minor units.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// A configured amount could not be represented in minor units.
    #[error("amount {0} cannot be represented in minor units of {1}")]
    AmountConversion(Decimal, &'static str),

    /// Summing line discounts overflowed.
    #[error("discount total overflowed")]
    Overflow,

    /// The order total and the cart are priced in different currencies.
    #[error("order total is in {0}, but cart is in {1}")]
    CurrencyMismatch(&'static str, &'static str),
}

/// How a coupon's `discount_value` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percentage off each eligible unit.
    PercentOffProduct,

    /// Fixed amount off each eligible unit.
    DollarOffProduct,

    /// Percentage off the order total.
    PercentOffOrder,

    /// Fixed amount off the order total.
    DollarOffOrder,

    /// A type this engine doesn't know how to apply. Always discounts nothing.
    #[serde(other)]
    Unrecognised,
}

impl DiscountType {
    /// Whether the discount is computed per eligible cart line.
    pub const fn is_per_product(self) -> bool {
        matches!(self, Self::PercentOffProduct | Self::DollarOffProduct)
    }

    /// Whether the discount is computed from the order total.
    pub const fn is_per_order(self) -> bool {
        matches!(self, Self::PercentOffOrder | Self::DollarOffOrder)
    }

    /// Stable label used in logs and storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PercentOffProduct => "percent_off_product",
            Self::DollarOffProduct => "dollar_off_product",
            Self::PercentOffOrder => "percent_off_order",
            Self::DollarOffOrder => "dollar_off_order",
            Self::Unrecognised => "unrecognised",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpret a configured value as percentage points (`10` is 10%).
pub fn percentage_points(value: Decimal) -> Percentage {
    Percentage::from(value / Decimal::ONE_HUNDRED)
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns an error if the percentage calculation overflows or cannot be safely represented
/// (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Convert an amount in major units (`12.50`) to minor units of `currency` (`1250`).
///
/// # Errors
///
/// Returns `DiscountError::AmountConversion` if the amount overflows `i64` minor units.
pub fn major_to_minor(amount: Decimal, currency: &Currency) -> Result<i64, DiscountError> {
    let conversion = || DiscountError::AmountConversion(amount, currency.iso_alpha_code);

    let scale = 10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .ok_or_else(conversion)?;

    amount
        .checked_mul(scale)
        .ok_or_else(conversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(conversion)
}

/// Express a money amount in major units, for comparison with configured thresholds.
pub fn to_major(money: &Money<'_, Currency>) -> Decimal {
    Decimal::new(money.to_minor_units(), money.currency().exponent)
}
