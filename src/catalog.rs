//! Catalog
//!
//! Resolves which stock units belong to which products, and which products
//! belong to which categories. Coupon scope checks walk these links from the
//! sku in the cart up to the coupon's products and categories.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::uuids::TypedUuid;

/// Stock Unit
#[derive(Debug)]
pub struct Sku;

/// Stock unit UUID
pub type SkuUuid = TypedUuid<Sku>;

/// Product
#[derive(Debug)]
pub struct Product;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Category
#[derive(Debug)]
pub struct Category;

/// Category UUID
pub type CategoryUuid = TypedUuid<Category>;

/// Read access to catalog membership.
///
/// Implemented by whatever holds product data (a database-backed cache in a
/// checkout service, [`InMemoryCatalog`] in tests). Lookups for unknown ids
/// must answer "no" rather than fail.
pub trait Catalog {
    /// The product a stock unit belongs to, if the sku is known.
    fn product_of(&self, sku: SkuUuid) -> Option<ProductUuid>;

    /// Whether `product` is linked to `category`.
    fn in_category(&self, product: ProductUuid, category: CategoryUuid) -> bool;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn product_of(&self, sku: SkuUuid) -> Option<ProductUuid> {
        (**self).product_of(sku)
    }

    fn in_category(&self, product: ProductUuid, category: CategoryUuid) -> bool {
        (**self).in_category(product, category)
    }
}

/// Catalog held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    skus: FxHashMap<SkuUuid, ProductUuid>,
    categories: FxHashMap<ProductUuid, SmallVec<[CategoryUuid; 4]>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product and the categories it's listed under.
    ///
    /// Registering the same product twice replaces its categories.
    pub fn add_product(
        &mut self,
        product: ProductUuid,
        categories: impl IntoIterator<Item = CategoryUuid>,
    ) -> &mut Self {
        self.categories
            .insert(product, categories.into_iter().collect());

        self
    }

    /// Register a stock unit under a product.
    pub fn add_sku(&mut self, sku: SkuUuid, product: ProductUuid) -> &mut Self {
        self.skus.insert(sku, product);
        self.categories.entry(product).or_default();

        self
    }
}

impl Catalog for InMemoryCatalog {
    fn product_of(&self, sku: SkuUuid) -> Option<ProductUuid> {
        self.skus.get(&sku).copied()
    }

    fn in_category(&self, product: ProductUuid, category: CategoryUuid) -> bool {
        self.categories
            .get(&product)
            .is_some_and(|categories| categories.contains(&category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_sku_to_product() {
        let product = ProductUuid::new();
        let sku = SkuUuid::new();

        let mut catalog = InMemoryCatalog::new();
        catalog.add_product(product, []).add_sku(sku, product);

        assert_eq!(catalog.product_of(sku), Some(product));
        assert_eq!(catalog.product_of(SkuUuid::new()), None);
    }

    #[test]
    fn category_membership_is_per_product() {
        let shirts = CategoryUuid::new();
        let sale = CategoryUuid::new();
        let tee = ProductUuid::new();
        let mug = ProductUuid::new();

        let mut catalog = InMemoryCatalog::new();
        catalog.add_product(tee, [shirts, sale]).add_product(mug, []);

        assert!(catalog.in_category(tee, shirts));
        assert!(catalog.in_category(tee, sale));
        assert!(!catalog.in_category(mug, sale));
        assert!(!catalog.in_category(ProductUuid::new(), shirts));
    }

    #[test]
    fn adding_sku_registers_unknown_product() {
        let product = ProductUuid::new();

        let (first, second) = (SkuUuid::new(), SkuUuid::new());

        let mut catalog = InMemoryCatalog::new();
        catalog.add_sku(first, product).add_sku(second, product);

        assert_eq!(catalog.product_of(first), Some(product));
        assert_eq!(catalog.product_of(second), Some(product));
        assert!(!catalog.in_category(product, CategoryUuid::new()));
    }

    #[test]
    fn re_adding_product_replaces_categories() {
        let old = CategoryUuid::new();
        let new = CategoryUuid::new();
        let product = ProductUuid::new();

        let mut catalog = InMemoryCatalog::new();
        catalog.add_product(product, [old]).add_product(product, [new]);

        assert!(!catalog.in_category(product, old));
        assert!(catalog.in_category(product, new));
    }
}
