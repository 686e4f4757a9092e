//! Coupons prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    calculator::{DiscountApplication, DiscountCalculator, Ineligibility, Outcome},
    cart::{Cart, CartError, CartItem, ItemKind},
    catalog::{Catalog, CategoryUuid, InMemoryCatalog, ProductUuid, SkuUuid},
    coupons::{Coupon, CouponError, CouponUuid, NewCoupon},
    discounts::{DiscountError, DiscountType},
    issuance::{
        CodeGenerator, CodeRegistry, InMemoryCodeRegistry, IssueConfig, IssueError,
        RandomCodeGenerator, issue,
    },
    redemption::{NoopHook, RedeemError, Redemption, RedemptionHook, RedemptionState, redeem},
    uuids::{TypedUuid, UserUuid},
    validity::deactivate,
};
