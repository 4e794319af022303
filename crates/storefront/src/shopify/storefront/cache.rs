//! Cache types for Storefront API responses.

use lookout_core::{Collection, CollectionRef, Product, ProductId};

/// Cache key for products and collections.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    CollectionProducts { collection: CollectionRef, first: u32 },
    Collections { first: u32 },
}

/// Cached value types.
///
/// `CollectionProducts(None)` records that the collection does not exist.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    CollectionProducts(Option<Vec<Product>>),
    Collections(Vec<Collection>),
}
