//! Validity
//!
//! One-time coupons are deactivated after they fund their first discount.

use std::sync::atomic::Ordering;

use tracing::info;

use crate::coupons::Coupon;

/// Deactivate the coupon.
///
/// Returns `true` if this call moved the coupon from valid to invalid, and
/// `false` if it was already invalid. When several threads race to
/// deactivate the same coupon exactly one of them gets `true`.
pub fn deactivate(coupon: &Coupon) -> bool {
    let deactivated = coupon
        .validity_flag()
        .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
        .is_ok();

    if deactivated {
        info!(coupon_code = %coupon.code(), "deactivated coupon");
    }

    deactivated
}
