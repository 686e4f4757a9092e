//! Checkout scenarios loaded from `tests/fixtures/checkout.yml`.
//!
//! Each scenario pairs a coupon definition with a cart and the discount the
//! calculator is expected to produce, in pence.

use jiff::civil::Date;
use rusty_money::{Money, iso::GBP};
use serde::Deserialize;
use testresult::TestResult;

use coupons::prelude::*;

#[derive(Debug, Deserialize)]
struct CheckoutFixture {
    today: Date,
    catalog: Vec<CatalogEntry>,
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    sku: SkuUuid,
    product: ProductUuid,
    #[serde(default)]
    categories: Vec<CategoryUuid>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    coupon: NewCoupon,
    cart: Vec<LineFixture>,
    total: i64,
    expected: i64,
}

#[derive(Debug, Deserialize)]
struct LineFixture {
    sku: SkuUuid,
    #[serde(default = "stock_unit")]
    kind: ItemKind,
    unit_price: i64,
    count: u32,
}

fn stock_unit() -> ItemKind {
    ItemKind::StockUnit
}

fn load() -> Result<CheckoutFixture, serde_norway::Error> {
    serde_norway::from_str(include_str!("fixtures/checkout.yml"))
}

fn catalog(fixture: &CheckoutFixture) -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();

    for entry in &fixture.catalog {
        catalog
            .add_product(entry.product, entry.categories.iter().copied())
            .add_sku(entry.sku, entry.product);
    }

    catalog
}

fn cart(lines: &[LineFixture]) -> Result<Cart<'static>, CartError> {
    Cart::with_items(
        lines
            .iter()
            .map(|line| {
                CartItem::new(
                    line.sku,
                    line.kind,
                    Money::from_minor(line.unit_price, GBP),
                    line.count,
                )
            })
            .collect::<Vec<_>>(),
        GBP,
    )
}

#[test]
fn checkout_scenarios_produce_expected_discounts() -> TestResult {
    let fixture = load()?;
    let catalog = catalog(&fixture);
    let calculator = DiscountCalculator::new(&catalog, fixture.today);

    for scenario in &fixture.scenarios {
        let coupon = Coupon::new("SCENARIO", scenario.coupon.clone())?;
        let cart = cart(&scenario.cart)?;

        let amount =
            calculator.calculate_discount(&coupon, &cart, Money::from_minor(scenario.total, GBP));

        assert_eq!(
            amount,
            Money::from_minor(scenario.expected, GBP),
            "scenario: {}",
            scenario.name
        );
    }

    Ok(())
}

#[test]
fn checkout_discounts_are_never_negative() -> TestResult {
    let fixture = load()?;
    let catalog = catalog(&fixture);

    // Evaluate every coupon against every cart, on days either side of today.
    for today in [
        fixture.today.yesterday()?,
        fixture.today,
        fixture.today.tomorrow()?,
    ] {
        let calculator = DiscountCalculator::new(&catalog, today);

        for coupon_scenario in &fixture.scenarios {
            for cart_scenario in &fixture.scenarios {
                let coupon = Coupon::new("ANY", coupon_scenario.coupon.clone())?;
                let cart = cart(&cart_scenario.cart)?;

                for total in [0, 1, cart_scenario.total] {
                    let application =
                        calculator.calculate(&coupon, &cart, Money::from_minor(total, GBP));

                    assert!(
                        application.amount().to_minor_units() >= 0,
                        "coupon {:?} on cart {:?}",
                        coupon_scenario.name,
                        cart_scenario.name
                    );
                }
            }
        }
    }

    Ok(())
}

#[test]
fn unrestricted_coupon_accepts_any_stock_unit() -> TestResult {
    let fixture = load()?;
    let catalog = catalog(&fixture);
    let coupon = Coupon::new(
        "ANYTHING",
        NewCoupon::new(DiscountType::PercentOffProduct, rust_decimal::Decimal::TEN),
    )?;

    for entry in &fixture.catalog {
        for count in [1, 2, 100] {
            let item = CartItem::stock_unit(entry.sku, Money::from_minor(999, GBP), count);
            let cart = Cart::with_items([item], GBP)?;

            assert!(coupons::eligibility::is_item_eligible(
                &coupon, &catalog, &cart, &item
            ));
        }
    }

    // Skus the catalog has never heard of are still in scope.
    let stranger = CartItem::stock_unit(SkuUuid::new(), Money::from_minor(1, GBP), 1);
    let cart = Cart::with_items([stranger], GBP)?;

    assert!(coupons::eligibility::is_item_eligible(
        &coupon, &catalog, &cart, &stranger
    ));

    Ok(())
}
