//! Cart

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SkuUuid;

/// Errors related to cart construction or totals.
#[derive(Debug, Error)]
pub enum CartError {
    /// An item's currency differs from the cart currency (index, item currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// An item has a count of zero (index).
    #[error("Item {0} has a count of zero")]
    ZeroCount(usize),

    /// An item has a negative unit price (index).
    #[error("Item {0} has a negative unit price")]
    NegativePrice(usize),

    /// Line totals exceeded the representable range of minor units.
    #[error("cart total overflowed")]
    Overflow,
}

/// What a cart line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A physical stock unit; the only kind coupons discount.
    StockUnit,

    /// A service line (installation, engraving).
    Service,

    /// A charge such as shipping or handling.
    Fee,
}

impl ItemKind {
    /// Whether coupons may discount lines of this kind.
    pub const fn is_discountable(self) -> bool {
        matches!(self, Self::StockUnit)
    }
}

/// A single cart line
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CartItem<'a> {
    sku: SkuUuid,
    kind: ItemKind,
    unit_price: Money<'a, Currency>,
    count: u32,
}

impl<'a> CartItem<'a> {
    /// Create a new line item.
    pub fn new(sku: SkuUuid, kind: ItemKind, unit_price: Money<'a, Currency>, count: u32) -> Self {
        Self {
            sku,
            kind,
            unit_price,
            count,
        }
    }

    /// Create a stock unit line.
    pub fn stock_unit(sku: SkuUuid, unit_price: Money<'a, Currency>, count: u32) -> Self {
        Self::new(sku, ItemKind::StockUnit, unit_price, count)
    }

    /// Returns the sku of the line
    pub fn sku(&self) -> SkuUuid {
        self.sku
    }

    /// Returns the kind of the line
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Returns the price of a single unit
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Returns the number of units on the line
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Cart
#[derive(Debug)]
pub struct Cart<'a> {
    items: Vec<CartItem<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create a new empty cart.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a new cart with the given items.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if an item is priced in another currency, has a
    /// count of zero or has a negative unit price.
    pub fn with_items(
        items: impl Into<Vec<CartItem<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            let item_currency = item.unit_price().currency();

            if item_currency != currency {
                return Err(CartError::CurrencyMismatch(
                    i,
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if item.count() == 0 {
                return Err(CartError::ZeroCount(i));
            }

            if item.unit_price().to_minor_units() < 0 {
                return Err(CartError::NegativePrice(i));
            }

            Ok(())
        })?;

        Ok(Cart { items, currency })
    }

    /// Iterate over the cart lines.
    pub fn items(&self) -> impl Iterator<Item = &CartItem<'a>> {
        self.items.iter()
    }

    /// Iterate over the lines coupons may discount.
    pub fn discountable_items(&self) -> impl Iterator<Item = &CartItem<'a>> {
        self.items.iter().filter(|item| item.kind().is_discountable())
    }

    /// Sum of unit counts across every line.
    pub fn total_units(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.count())).sum()
    }

    /// Calculate the subtotal of the cart.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if the line totals overflow.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        let minor = self.items.iter().try_fold(0_i64, |acc, item| {
            item.unit_price()
                .to_minor_units()
                .checked_mul(i64::from(item.count()))
                .and_then(|line| acc.checked_add(line))
                .ok_or(CartError::Overflow)
        })?;

        Ok(Money::from_minor(minor, self.currency))
    }

    /// Get the number of lines in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
