//! Eligibility
//!
//! Pure predicates deciding whether a coupon applies to an order, and to
//! which of its lines. Every constraint on a coupon is optional; an absent
//! constraint never makes anything ineligible.

use jiff::civil::Date;
use rusty_money::{Money, iso::Currency};

use crate::{
    cart::{Cart, CartItem},
    catalog::Catalog,
    coupons::Coupon,
    discounts::to_major,
};

/// Whether `today` falls inside the coupon's `begin_date..=expires_on` window.
pub fn is_date_eligible(coupon: &Coupon, today: Date) -> bool {
    coupon.begin_date().is_none_or(|begin| begin <= today)
        && coupon.expires_on().is_none_or(|expires| today <= expires)
}

/// Whether the order total falls inside the coupon's order price window.
pub fn is_order_price_eligible(coupon: &Coupon, total: &Money<'_, Currency>) -> bool {
    let total = to_major(total);

    coupon.min_order_price().is_none_or(|min| min <= total)
        && coupon.max_order_price().is_none_or(|max| total <= max)
}

/// Whether the line's count falls inside the coupon's quantity window.
///
/// The window is only enforced when `max_qty` is set. A coupon with just a
/// `min_qty` accepts any count here; the minimum is still applied by
/// [`is_span_eligible`].
pub fn is_quantity_eligible(coupon: &Coupon, item: &CartItem<'_>) -> bool {
    let Some(max) = coupon.max_qty() else {
        return true;
    };

    let count = item.count();

    coupon.min_qty().unwrap_or(0) <= count && count <= max
}

/// Whether the line's sku is inside the coupon's product/category scope.
///
/// A coupon restricted to both products and categories accepts skus matching
/// either. Skus the catalog doesn't know are out of scope of any restricted
/// coupon.
pub fn is_scope_eligible<C: Catalog + ?Sized>(
    coupon: &Coupon,
    catalog: &C,
    item: &CartItem<'_>,
) -> bool {
    if coupon.is_unrestricted() {
        return true;
    }

    let Some(product) = catalog.product_of(item.sku()) else {
        return false;
    };

    coupon.product_uuids().contains(&product)
        || coupon
            .category_uuids()
            .iter()
            .any(|category| catalog.in_category(product, *category))
}

/// Whether the coupon's `min_qty` is met.
///
/// Span coupons compare the unit count of the whole cart, so every line
/// passes or fails together. Other coupons compare the line's own count.
pub fn is_span_eligible(coupon: &Coupon, cart: &Cart<'_>, item: &CartItem<'_>) -> bool {
    let min = u64::from(coupon.min_qty().unwrap_or(0));

    if coupon.is_span() {
        cart.total_units() >= min
    } else {
        u64::from(item.count()) >= min
    }
}

/// Whether the coupon may discount this cart line.
pub fn is_item_eligible<C: Catalog + ?Sized>(
    coupon: &Coupon,
    catalog: &C,
    cart: &Cart<'_>,
    item: &CartItem<'_>,
) -> bool {
    item.kind().is_discountable()
        && is_quantity_eligible(coupon, item)
        && is_scope_eligible(coupon, catalog, item)
        && is_span_eligible(coupon, cart, item)
}

/// Whether every discountable line in the cart is eligible.
///
/// Order-level discounts need this: a single ineligible line disqualifies the
/// whole order. Non-discountable lines are ignored.
pub fn is_cart_uniformly_eligible<C: Catalog + ?Sized>(
    coupon: &Coupon,
    catalog: &C,
    cart: &Cart<'_>,
) -> bool {
    cart.discountable_items()
        .all(|item| is_item_eligible(coupon, catalog, cart, item))
}
