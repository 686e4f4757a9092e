//! Redemption
//!
//! Tracks whether a coupon has been redeemed and by whom. Redemption is
//! separate from cart discounting: a coupon can be redeemed without ever
//! funding a discount, and a one-time coupon can be consumed without being
//! redeemed.

use jiff::{Timestamp, Zoned, civil::Date};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{coupons::Coupon, uuids::UserUuid};

/// A recorded redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    /// When the coupon was redeemed.
    pub redeemed_at: Timestamp,

    /// Who redeemed it.
    pub redeemed_by: UserUuid,
}

/// Why a redemption attempt left the coupon unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum RedeemError {
    /// The coupon was redeemed earlier, possibly by a concurrent caller.
    #[error("coupon already redeemed at {}", .0.redeemed_at)]
    AlreadyRedeemed(Redemption),

    /// The coupon's last valid day has passed.
    #[error("coupon expired on {0}")]
    Expired(Date),
}

/// Redemption state of a coupon on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionState {
    /// Can still be redeemed.
    Active,

    /// Has been redeemed.
    Redeemed,

    /// Expired without being redeemed.
    Expired,
}

/// Extension point run after a successful redemption.
///
/// The default implementation does nothing; integrators implement it to
/// issue loyalty points, send receipts and so on.
pub trait RedemptionHook {
    /// Called once, after `redemption` has been recorded on `coupon`.
    fn after_redeem(&self, _coupon: &Coupon, _redemption: &Redemption) {}
}

/// Hook that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl RedemptionHook for NoopHook {}

/// Returns whether the coupon has been redeemed
pub fn is_redeemed(coupon: &Coupon) -> bool {
    coupon.redemption().is_some()
}

/// Returns whether the coupon's last valid day is before `today`
pub fn is_expired(coupon: &Coupon, today: Date) -> bool {
    coupon.expires_on().is_some_and(|expires| expires < today)
}

/// Returns the redemption state of the coupon on `today`
pub fn state(coupon: &Coupon, today: Date) -> RedemptionState {
    if is_redeemed(coupon) {
        RedemptionState::Redeemed
    } else if is_expired(coupon, today) {
        RedemptionState::Expired
    } else {
        RedemptionState::Active
    }
}

/// Mark the coupon redeemed by `redeemer` at `now`, then run `hook`.
///
/// Only one caller can redeem a coupon; concurrent callers that lose see
/// [`RedeemError::AlreadyRedeemed`] and the hook doesn't run for them.
///
/// # Errors
///
/// - [`RedeemError::AlreadyRedeemed`]: the coupon has a redemption recorded.
/// - [`RedeemError::Expired`]: the coupon's `expires_on` is before `now`'s date.
#[tracing::instrument(
    name = "coupons.redemption.redeem",
    skip_all,
    fields(coupon_code = %coupon.code(), redeemer = %redeemer)
)]
pub fn redeem<H: RedemptionHook + ?Sized>(
    coupon: &Coupon,
    redeemer: UserUuid,
    now: &Zoned,
    hook: &H,
) -> Result<Redemption, RedeemError> {
    if let Some(existing) = coupon.redemption() {
        return Err(RedeemError::AlreadyRedeemed(*existing));
    }

    if let Some(expires) = coupon.expires_on().filter(|_| is_expired(coupon, now.date())) {
        return Err(RedeemError::Expired(expires));
    }

    let redemption = Redemption {
        redeemed_at: now.timestamp(),
        redeemed_by: redeemer,
    };

    let mut recorded_here = false;

    let stored = coupon.redemption_cell().get_or_init(|| {
        recorded_here = true;
        redemption
    });

    if !recorded_here {
        return Err(RedeemError::AlreadyRedeemed(*stored));
    }

    info!(redeemed_at = %stored.redeemed_at, "redeemed coupon");

    hook.after_redeem(coupon, stored);

    Ok(*stored)
}
