//! Discount Calculator
//!
//! Turns a coupon and a cart into a discount amount. Calculation is
//! fail-closed: anything that stops the coupon applying, including malformed
//! configuration and arithmetic faults, results in a zero discount rather
//! than an error. The [`Outcome`] on the returned [`DiscountApplication`]
//! says why.

use jiff::civil::Date;
use rusty_money::{Money, iso::Currency};
use tracing::{Span, debug, warn};

use crate::{
    cart::Cart,
    catalog::Catalog,
    coupons::Coupon,
    discounts::{DiscountError, DiscountType, major_to_minor, percent_of_minor, percentage_points},
    eligibility::{
        is_cart_uniformly_eligible, is_date_eligible, is_item_eligible, is_order_price_eligible,
    },
    validity::deactivate,
};

/// Why a coupon didn't apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    /// The coupon has been deactivated.
    Invalid,

    /// The evaluation date is outside the coupon's date window.
    OutsideDateWindow,

    /// The order total is outside the coupon's order price window.
    OutsideOrderPriceWindow,

    /// No cart line qualifies for a per-product discount.
    NoEligibleItems,

    /// At least one discountable line fails an order-level coupon's rules.
    CartNotUniformlyEligible,

    /// A percentage off the order needs a positive order total.
    NonPositiveTotal,

    /// The engine doesn't know how to apply the coupon's discount type.
    UnrecognisedDiscountType,
}

/// How a calculation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The coupon applied. The amount may still be zero (for example a 0% coupon).
    Applied,

    /// The coupon doesn't apply to this order.
    Ineligible(Ineligibility),

    /// A one-time coupon was consumed by a concurrent calculation first.
    LostRace,

    /// The discount couldn't be computed.
    Failed(DiscountError),
}

impl From<DiscountError> for Outcome {
    fn from(error: DiscountError) -> Self {
        Self::Failed(error)
    }
}

impl From<Ineligibility> for Outcome {
    fn from(reason: Ineligibility) -> Self {
        Self::Ineligible(reason)
    }
}

/// Result of applying a coupon to a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountApplication<'a> {
    amount: Money<'a, Currency>,
    outcome: Outcome,
}

impl<'a> DiscountApplication<'a> {
    fn zero(currency: &'a Currency, outcome: Outcome) -> Self {
        Self {
            amount: Money::from_minor(0, currency),
            outcome,
        }
    }

    /// The discount amount, never negative
    pub fn amount(&self) -> Money<'a, Currency> {
        self.amount
    }

    /// How the calculation ended
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Whether the coupon applied
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied)
    }
}

/// Calculates coupon discounts against a catalog on a given day.
#[derive(Debug)]
pub struct DiscountCalculator<'c, C: Catalog + ?Sized> {
    catalog: &'c C,
    today: Date,
}

impl<'c, C: Catalog + ?Sized> DiscountCalculator<'c, C> {
    /// Create a calculator resolving scope through `catalog`, evaluating date windows on `today`.
    pub fn new(catalog: &'c C, today: Date) -> Self {
        Self { catalog, today }
    }

    /// Apply `coupon` to `cart`, whose order total is `total`.
    ///
    /// A strictly positive discount from a one-time coupon deactivates it. If
    /// another calculation deactivated it first, the discount is zero and the
    /// outcome is [`Outcome::LostRace`].
    #[tracing::instrument(
        name = "coupons.calculator.calculate",
        skip_all,
        fields(
            coupon_code = %coupon.code(),
            discount_type = %coupon.discount_type(),
            amount_minor = tracing::field::Empty
        )
    )]
    pub fn calculate<'a>(
        &self,
        coupon: &Coupon,
        cart: &Cart<'a>,
        total: Money<'a, Currency>,
    ) -> DiscountApplication<'a> {
        let currency = cart.currency();

        let minor = match self.discount_minor(coupon, cart, &total) {
            Ok(minor) => minor.max(0),
            Err(Outcome::Failed(error)) => {
                warn!(%error, "discount calculation failed");

                return DiscountApplication::zero(currency, Outcome::Failed(error));
            }
            Err(outcome) => {
                debug!(?outcome, "coupon not applied");

                return DiscountApplication::zero(currency, outcome);
            }
        };

        if minor > 0 && coupon.is_one_time() && !deactivate(coupon) {
            warn!("one-time coupon consumed by a concurrent checkout");

            return DiscountApplication::zero(currency, Outcome::LostRace);
        }

        Span::current().record("amount_minor", minor);

        DiscountApplication {
            amount: Money::from_minor(minor, currency),
            outcome: Outcome::Applied,
        }
    }

    /// Apply `coupon` to `cart` and return only the discount amount.
    pub fn calculate_discount<'a>(
        &self,
        coupon: &Coupon,
        cart: &Cart<'a>,
        total: Money<'a, Currency>,
    ) -> Money<'a, Currency> {
        self.calculate(coupon, cart, total).amount()
    }

    fn discount_minor(
        &self,
        coupon: &Coupon,
        cart: &Cart<'_>,
        total: &Money<'_, Currency>,
    ) -> Result<i64, Outcome> {
        if total.currency() != cart.currency() {
            return Err(DiscountError::CurrencyMismatch(
                total.currency().iso_alpha_code,
                cart.currency().iso_alpha_code,
            )
            .into());
        }

        if !coupon.is_valid() {
            return Err(Ineligibility::Invalid.into());
        }

        if !is_date_eligible(coupon, self.today) {
            return Err(Ineligibility::OutsideDateWindow.into());
        }

        if !is_order_price_eligible(coupon, total) {
            return Err(Ineligibility::OutsideOrderPriceWindow.into());
        }

        let discount_type = coupon.discount_type();

        if discount_type.is_per_product() {
            self.per_product_minor(coupon, cart)
        } else if discount_type.is_per_order() {
            self.per_order_minor(coupon, cart, total)
        } else {
            Err(Ineligibility::UnrecognisedDiscountType.into())
        }
    }

    /// Sum of per-unit discounts over every eligible line.
    fn per_product_minor(&self, coupon: &Coupon, cart: &Cart<'_>) -> Result<i64, Outcome> {
        let percent = percentage_points(coupon.discount_value());

        let fixed = match coupon.discount_type() {
            DiscountType::DollarOffProduct => {
                Some(major_to_minor(coupon.discount_value(), cart.currency())?)
            }
            _ => None,
        };

        let mut eligible_lines = 0_usize;
        let mut discount = 0_i64;

        for item in cart
            .discountable_items()
            .filter(|item| is_item_eligible(coupon, self.catalog, cart, item))
        {
            let per_unit = match fixed {
                Some(fixed) => fixed,
                None => percent_of_minor(&percent, item.unit_price().to_minor_units())?,
            };

            discount = per_unit
                .checked_mul(i64::from(item.count()))
                .and_then(|line| discount.checked_add(line))
                .ok_or(DiscountError::Overflow)?;

            eligible_lines += 1;
        }

        if eligible_lines == 0 {
            return Err(Ineligibility::NoEligibleItems.into());
        }

        Ok(discount)
    }

    /// Discount on the order total, if every discountable line qualifies.
    fn per_order_minor(
        &self,
        coupon: &Coupon,
        cart: &Cart<'_>,
        total: &Money<'_, Currency>,
    ) -> Result<i64, Outcome> {
        if !is_cart_uniformly_eligible(coupon, self.catalog, cart) {
            return Err(Ineligibility::CartNotUniformlyEligible.into());
        }

        match coupon.discount_type() {
            DiscountType::PercentOffOrder => {
                let total_minor = total.to_minor_units();

                if total_minor <= 0 {
                    return Err(Ineligibility::NonPositiveTotal.into());
                }

                Ok(percent_of_minor(
                    &percentage_points(coupon.discount_value()),
                    total_minor,
                )?)
            }
            _ => Ok(major_to_minor(coupon.discount_value(), cart.currency())?),
        }
    }
}
