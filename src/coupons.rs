//! Coupons
//!
//! A [`Coupon`] is read many times while carts are evaluated and mutated at
//! most twice over its life: once when a one-time coupon is consumed
//! (see [`crate::validity`]) and once when it's redeemed (see
//! [`crate::redemption`]). Both mutations go through atomics so a coupon can
//! be shared between checkout threads as `&Coupon` or `Arc<Coupon>`.

use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};

use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::{CategoryUuid, ProductUuid},
    discounts::DiscountType,
    redemption::Redemption,
    uuids::TypedUuid,
};

/// Marker for coupon records.
#[derive(Debug)]
pub struct CouponRecord;

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// Reasons a coupon definition is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum CouponError {
    /// Coupons need a code to be presented at checkout.
    #[error("coupon code is empty")]
    EmptyCode,

    /// The discount value is below zero.
    #[error("discount value {0} is negative")]
    NegativeDiscountValue(Decimal),

    /// `min_qty` is above `max_qty`.
    #[error("minimum quantity {min} exceeds maximum quantity {max}")]
    QuantityWindow {
        /// Configured minimum
        min: u32,
        /// Configured maximum
        max: u32,
    },

    /// `min_order_price` is above `max_order_price`.
    #[error("minimum order price {min} exceeds maximum order price {max}")]
    OrderPriceWindow {
        /// Configured minimum
        min: Decimal,
        /// Configured maximum
        max: Decimal,
    },

    /// `begin_date` is after `expires_on`.
    #[error("coupon begins on {begin} but expires on {expires}")]
    DateWindow {
        /// Configured first day
        begin: Date,
        /// Configured last day
        expires: Date,
    },
}

fn valid_by_default() -> bool {
    true
}

/// Coupon configuration as supplied by the caller, before a code is attached.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCoupon {
    /// Identity of the coupon record.
    #[serde(default)]
    pub uuid: CouponUuid,

    /// How `discount_value` is applied.
    pub discount_type: DiscountType,

    /// Percentage points for percent types, major currency units for fixed types.
    pub discount_value: Decimal,

    /// First day the coupon can be used.
    #[serde(default)]
    pub begin_date: Option<Date>,

    /// Last day the coupon can be used.
    #[serde(default)]
    pub expires_on: Option<Date>,

    /// Smallest order total, in major units, the coupon applies to.
    #[serde(default)]
    pub min_order_price: Option<Decimal>,

    /// Largest order total, in major units, the coupon applies to.
    #[serde(default)]
    pub max_order_price: Option<Decimal>,

    /// Minimum unit count; per line, or across the cart when `span` is set.
    #[serde(default)]
    pub min_qty: Option<u32>,

    /// Maximum unit count per line.
    #[serde(default)]
    pub max_qty: Option<u32>,

    /// Compare `min_qty` against the whole cart rather than each line.
    #[serde(default)]
    pub span: bool,

    /// Deactivate the coupon after its first non-zero discount.
    #[serde(default)]
    pub one_time: bool,

    /// Whether the coupon can still be used. Loaded coupons may already be spent.
    #[serde(default = "valid_by_default")]
    pub is_valid: bool,

    /// Products whose skus the coupon is restricted to.
    #[serde(default)]
    pub product_uuids: FxHashSet<ProductUuid>,

    /// Categories whose products' skus the coupon is restricted to.
    #[serde(default)]
    pub category_uuids: FxHashSet<CategoryUuid>,

    /// Redemption already recorded in storage, if any.
    #[serde(default)]
    pub redemption: Option<Redemption>,
}

impl NewCoupon {
    /// Unrestricted, valid, reusable coupon of the given type and value.
    pub fn new(discount_type: DiscountType, discount_value: Decimal) -> Self {
        Self {
            uuid: CouponUuid::new(),
            discount_type,
            discount_value,
            begin_date: None,
            expires_on: None,
            min_order_price: None,
            max_order_price: None,
            min_qty: None,
            max_qty: None,
            span: false,
            one_time: false,
            is_valid: true,
            product_uuids: FxHashSet::default(),
            category_uuids: FxHashSet::default(),
            redemption: None,
        }
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`CouponError`].
    pub fn validate(&self) -> Result<(), CouponError> {
        if self.discount_value < Decimal::ZERO {
            return Err(CouponError::NegativeDiscountValue(self.discount_value));
        }

        match (self.min_qty, self.max_qty) {
            (Some(min), Some(max)) if min > max => {
                return Err(CouponError::QuantityWindow { min, max });
            }
            _ => {}
        }

        match (self.min_order_price, self.max_order_price) {
            (Some(min), Some(max)) if min > max => {
                return Err(CouponError::OrderPriceWindow { min, max });
            }
            _ => {}
        }

        match (self.begin_date, self.expires_on) {
            (Some(begin), Some(expires)) if begin > expires => {
                Err(CouponError::DateWindow { begin, expires })
            }
            _ => Ok(()),
        }
    }
}

/// Coupon definition
#[derive(Debug)]
pub struct Coupon {
    uuid: CouponUuid,
    code: String,
    discount_type: DiscountType,
    discount_value: Decimal,
    begin_date: Option<Date>,
    expires_on: Option<Date>,
    min_order_price: Option<Decimal>,
    max_order_price: Option<Decimal>,
    min_qty: Option<u32>,
    max_qty: Option<u32>,
    span: bool,
    one_time: bool,
    is_valid: AtomicBool,
    product_uuids: FxHashSet<ProductUuid>,
    category_uuids: FxHashSet<CategoryUuid>,
    redemption: OnceLock<Redemption>,
}

impl Coupon {
    /// Attach a code to a coupon configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] if the code is empty or the configuration
    /// breaks one of its invariants.
    pub fn new(code: impl Into<String>, coupon: NewCoupon) -> Result<Self, CouponError> {
        let code = code.into();

        if code.trim().is_empty() {
            return Err(CouponError::EmptyCode);
        }

        coupon.validate()?;

        let redemption = coupon
            .redemption
            .map_or_else(OnceLock::new, OnceLock::from);

        Ok(Self {
            uuid: coupon.uuid,
            code,
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            begin_date: coupon.begin_date,
            expires_on: coupon.expires_on,
            min_order_price: coupon.min_order_price,
            max_order_price: coupon.max_order_price,
            min_qty: coupon.min_qty,
            max_qty: coupon.max_qty,
            span: coupon.span,
            one_time: coupon.one_time,
            is_valid: AtomicBool::new(coupon.is_valid),
            product_uuids: coupon.product_uuids,
            category_uuids: coupon.category_uuids,
            redemption,
        })
    }

    /// Return the coupon uuid
    pub fn uuid(&self) -> CouponUuid {
        self.uuid
    }

    /// Return the code presented at checkout
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Return the discount type
    pub fn discount_type(&self) -> DiscountType {
        self.discount_type
    }

    /// Return the discount value
    pub fn discount_value(&self) -> Decimal {
        self.discount_value
    }

    /// First day the coupon can be used
    pub fn begin_date(&self) -> Option<Date> {
        self.begin_date
    }

    /// Last day the coupon can be used
    pub fn expires_on(&self) -> Option<Date> {
        self.expires_on
    }

    /// Smallest qualifying order total in major units
    pub fn min_order_price(&self) -> Option<Decimal> {
        self.min_order_price
    }

    /// Largest qualifying order total in major units
    pub fn max_order_price(&self) -> Option<Decimal> {
        self.max_order_price
    }

    /// Minimum unit count
    pub fn min_qty(&self) -> Option<u32> {
        self.min_qty
    }

    /// Maximum unit count per line
    pub fn max_qty(&self) -> Option<u32> {
        self.max_qty
    }

    /// Whether `min_qty` applies to the whole cart
    pub fn is_span(&self) -> bool {
        self.span
    }

    /// Whether the coupon is consumed by its first discount
    pub fn is_one_time(&self) -> bool {
        self.one_time
    }

    /// Whether the coupon can still be used
    pub fn is_valid(&self) -> bool {
        self.is_valid.load(Ordering::Acquire)
    }

    /// Products the coupon is restricted to
    pub fn product_uuids(&self) -> &FxHashSet<ProductUuid> {
        &self.product_uuids
    }

    /// Categories the coupon is restricted to
    pub fn category_uuids(&self) -> &FxHashSet<CategoryUuid> {
        &self.category_uuids
    }

    /// Whether the coupon applies to every sku
    pub fn is_unrestricted(&self) -> bool {
        self.product_uuids.is_empty() && self.category_uuids.is_empty()
    }

    /// The recorded redemption, if any
    pub fn redemption(&self) -> Option<&Redemption> {
        self.redemption.get()
    }

    pub(crate) fn validity_flag(&self) -> &AtomicBool {
        &self.is_valid
    }

    pub(crate) fn redemption_cell(&self) -> &OnceLock<Redemption> {
        &self.redemption
    }
}
