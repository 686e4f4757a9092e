//! Coupons
//!
//! Coupon eligibility and discount engine. Coupons carry date, order price,
//! quantity and product/category rules; the calculator applies them to a
//! cart and returns the discount, failing closed to zero when a coupon
//! doesn't apply.

pub mod calculator;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod discounts;
pub mod eligibility;
pub mod issuance;
pub mod prelude;
pub mod redemption;
pub mod uuids;
pub mod validity;
