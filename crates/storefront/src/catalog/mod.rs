//! Catalog gateway: read-only product and collection lookups.
//!
//! Wraps a [`CatalogSource`] (the Shopify client in production) and turns
//! remote failures into values the wizard can render. Callers never receive
//! an error from a routine lookup: failures and timeouts are logged and
//! reported as [`CatalogLookup::Unavailable`], `None` or an empty list.

pub mod tiers;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lookout_core::{CameraLevel, Collection, CollectionId, CollectionRef, Product, ProductId, VariantId};
use tracing::{debug, info, instrument, warn};

use crate::shopify::ShopifyError;

pub use tiers::{ADDON_HANDLES, fallback_handles, resolve_tier_collection};

/// Largest page the platform returns for one listing.
pub const PAGE_SIZE: u32 = 250;

/// Read access to the remote catalog.
pub trait CatalogSource: Send + Sync + 'static {
    /// First page of collections visible to the storefront.
    fn collections(
        &self,
        first: u32,
    ) -> impl Future<Output = Result<Vec<Collection>, ShopifyError>> + Send;

    /// Products of a collection, or `None` if the collection does not exist.
    fn collection_products(
        &self,
        collection: &CollectionRef,
        first: u32,
    ) -> impl Future<Output = Result<Option<Vec<Product>>, ShopifyError>> + Send;

    /// A single product, or `None` if it does not exist.
    fn product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, ShopifyError>> + Send;
}

/// Outcome of a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLookup {
    /// At least one product.
    Products(Vec<Product>),
    /// The lookup worked but found nothing.
    Empty,
    /// The lookup failed or timed out.
    Unavailable,
}

impl CatalogLookup {
    fn from_products(products: Vec<Product>) -> Self {
        if products.is_empty() {
            Self::Empty
        } else {
            Self::Products(products)
        }
    }

    /// Products found, empty for `Empty` and `Unavailable`.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        match self {
            Self::Products(products) => products,
            Self::Empty | Self::Unavailable => Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Catalog lookups with timeouts, tier matching and fallbacks.
pub struct CatalogGateway<S> {
    source: Arc<S>,
    timeout: Duration,
    addon_collection: Option<CollectionId>,
}

impl<S> Clone for CatalogGateway<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            timeout: self.timeout,
            addon_collection: self.addon_collection.clone(),
        }
    }
}

impl<S: CatalogSource> CatalogGateway<S> {
    /// Create a gateway over a catalog source.
    #[must_use]
    pub const fn new(
        source: Arc<S>,
        timeout: Duration,
        addon_collection: Option<CollectionId>,
    ) -> Self {
        Self {
            source,
            timeout,
            addon_collection,
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ShopifyError>>,
    ) -> Result<T, ShopifyError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ShopifyError::Timeout(self.timeout.as_secs()))?
    }

    /// All collections visible to the storefront (first page).
    #[instrument(skip(self))]
    pub async fn list_collections(&self) -> Vec<Collection> {
        self.fetch_collections().await.unwrap_or_default()
    }

    async fn fetch_collections(&self) -> Result<Vec<Collection>, ShopifyError> {
        self.bounded(self.source.collections(PAGE_SIZE))
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to list collections"))
    }

    /// Products in a collection addressed by ID or handle.
    #[instrument(skip(self), fields(collection = %collection))]
    pub async fn list_products_by_collection(&self, collection: &CollectionRef) -> CatalogLookup {
        match self
            .bounded(self.source.collection_products(collection, PAGE_SIZE))
            .await
        {
            Ok(Some(products)) => CatalogLookup::from_products(products),
            Ok(None) => {
                debug!("Collection not found");
                CatalogLookup::Empty
            }
            Err(e) => {
                warn!(error = %e, "Failed to list collection products");
                CatalogLookup::Unavailable
            }
        }
    }

    /// A single product, `None` when absent or on failure.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Option<Product> {
        match self.bounded(self.source.product(id)).await {
            Ok(product) => product,
            Err(e) => {
                warn!(error = %e, "Failed to fetch product");
                None
            }
        }
    }

    /// First variant available for sale in a collection, else the first
    /// variant of the first product that has one.
    #[instrument(skip(self), fields(collection = %collection))]
    pub async fn first_available_variant(&self, collection: &CollectionRef) -> Option<VariantId> {
        let products = self.list_products_by_collection(collection).await.into_products();

        products
            .iter()
            .flat_map(|product| &product.variants)
            .find(|variant| variant.available_for_sale)
            .or_else(|| products.iter().find_map(|product| product.variants.first()))
            .map(|variant| variant.id.clone())
    }

    /// Products for a tier: title-matched collection first, then fallback
    /// handles. The first non-empty result wins.
    ///
    /// A failed collection listing turns an otherwise empty result into
    /// `Unavailable`, since the matched collection was never tried.
    #[instrument(skip(self), fields(level = %level))]
    pub async fn tier_products(&self, level: CameraLevel) -> CatalogLookup {
        let (collections, listing_failed) = match self.fetch_collections().await {
            Ok(collections) => (collections, false),
            Err(_) => (Vec::new(), true),
        };

        let mut candidates = Vec::new();
        let matched = resolve_tier_collection(level, &collections);
        if let Some(collection) = matched {
            info!(collection = %collection.title, "Tier matched collection");
            candidates.push(CollectionRef::Id(collection.id.clone()));
        }
        candidates.extend(
            fallback_handles(level)
                .iter()
                .filter(|handle| matched.is_none_or(|c| c.handle != **handle))
                .map(|handle| CollectionRef::Handle((*handle).to_string())),
        );

        match self.first_non_empty(&candidates).await {
            CatalogLookup::Empty if listing_failed => CatalogLookup::Unavailable,
            lookup => lookup,
        }
    }

    /// Add-on products: configured collection first, then conventional handles.
    #[instrument(skip(self))]
    pub async fn addon_products(&self) -> CatalogLookup {
        let candidates: Vec<CollectionRef> = self
            .addon_collection
            .iter()
            .cloned()
            .map(CollectionRef::Id)
            .chain(
                ADDON_HANDLES
                    .iter()
                    .map(|handle| CollectionRef::Handle((*handle).to_string())),
            )
            .collect();

        self.first_non_empty(&candidates).await
    }

    /// Try candidates in order. `Unavailable` only if every attempt failed.
    async fn first_non_empty(&self, candidates: &[CollectionRef]) -> CatalogLookup {
        let mut any_answered = false;
        for candidate in candidates {
            match self.list_products_by_collection(candidate).await {
                CatalogLookup::Products(products) => {
                    debug!(collection = %candidate, count = products.len(), "Using collection");
                    return CatalogLookup::Products(products);
                }
                CatalogLookup::Empty => any_answered = true,
                CatalogLookup::Unavailable => {}
            }
        }

        if any_answered || candidates.is_empty() {
            CatalogLookup::Empty
        } else {
            CatalogLookup::Unavailable
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use lookout_core::{CurrencyCode, Money, Variant};

    use super::*;

    /// In-memory catalog keyed by collection identifier.
    #[derive(Default)]
    struct FakeCatalog {
        collections: Vec<Collection>,
        products: HashMap<String, Vec<Product>>,
        failing: Vec<String>,
        collections_fail: bool,
        slow: bool,
        calls: Mutex<Vec<String>>,
    }

    impl CatalogSource for FakeCatalog {
        async fn collections(&self, _first: u32) -> Result<Vec<Collection>, ShopifyError> {
            if self.collections_fail {
                return Err(ShopifyError::Timeout(10));
            }
            Ok(self.collections.clone())
        }

        async fn collection_products(
            &self,
            collection: &CollectionRef,
            _first: u32,
        ) -> Result<Option<Vec<Product>>, ShopifyError> {
            let key = collection.as_str().to_string();
            self.calls.lock().unwrap().push(key.clone());
            if self.slow {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.contains(&key) {
                return Err(ShopifyError::NotFound(key));
            }
            Ok(self.products.get(&key).cloned())
        }

        async fn product(&self, id: &ProductId) -> Result<Option<Product>, ShopifyError> {
            Ok(self
                .products
                .values()
                .flatten()
                .find(|p| &p.id == id)
                .cloned())
        }
    }

    fn product(n: u64, available: &[bool]) -> Product {
        Product {
            id: ProductId::from_numeric(n),
            handle: format!("camera-{n}"),
            name: format!("Camera {n}"),
            description: String::new(),
            base_price: Money::zero(CurrencyCode::GBP),
            image: None,
            variants: available
                .iter()
                .zip(1u64..)
                .map(|(available, v)| Variant {
                    id: VariantId::from_numeric(n * 100 + v),
                    name: "Colour".to_string(),
                    value: format!("Option {v}"),
                    price: Money::zero(CurrencyCode::GBP),
                    compare_at_price: None,
                    available_for_sale: *available,
                    quantity_available: None,
                })
                .collect(),
        }
    }

    fn collection(n: u64, title: &str, handle: &str) -> Collection {
        Collection {
            id: CollectionId::from_numeric(n),
            handle: handle.to_string(),
            title: title.to_string(),
            description: String::new(),
            image: None,
        }
    }

    fn gateway(catalog: FakeCatalog) -> CatalogGateway<FakeCatalog> {
        CatalogGateway::new(Arc::new(catalog), Duration::from_secs(1), None)
    }

    #[tokio::test]
    async fn test_tier_uses_matched_collection() {
        let mut catalog = FakeCatalog {
            collections: vec![
                collection(1, "Entry Level", "entry-level"),
                collection(2, "Mid Range Pro", "mid-range-pro"),
            ],
            ..FakeCatalog::default()
        };
        catalog.products.insert(
            CollectionId::from_numeric(2).to_string(),
            vec![product(7, &[true])],
        );

        let lookup = gateway(catalog).tier_products(CameraLevel::Mid).await;
        assert_eq!(lookup.into_products()[0].id, ProductId::from_numeric(7));
    }

    #[tokio::test]
    async fn test_tier_falls_back_to_handles_when_match_is_empty() {
        let mut catalog = FakeCatalog {
            collections: vec![collection(1, "High End", "high-end-cams")],
            ..FakeCatalog::default()
        };
        catalog
            .products
            .insert(CollectionId::from_numeric(1).to_string(), vec![]);
        catalog
            .products
            .insert("highend".to_string(), vec![product(9, &[true])]);

        let gw = gateway(catalog);
        let lookup = gw.tier_products(CameraLevel::High).await;
        assert_eq!(lookup.into_products().len(), 1);

        let calls = gw.source.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec!["gid://shopify/Collection/1", "high-end", "highend"]
        );
    }

    #[tokio::test]
    async fn test_tier_all_empty_is_empty_not_unavailable() {
        let lookup = gateway(FakeCatalog::default())
            .tier_products(CameraLevel::Entry)
            .await;
        assert_eq!(lookup, CatalogLookup::Empty);
    }

    #[tokio::test]
    async fn test_tier_all_failing_is_unavailable() {
        let catalog = FakeCatalog {
            failing: fallback_handles(CameraLevel::Entry)
                .iter()
                .map(ToString::to_string)
                .collect(),
            ..FakeCatalog::default()
        };
        let lookup = gateway(catalog).tier_products(CameraLevel::Entry).await;
        assert!(lookup.is_unavailable());
    }

    #[tokio::test]
    async fn test_list_collections_degrades_to_empty() {
        let listed = FakeCatalog {
            collections: vec![collection(1, "High End", "high-end")],
            ..FakeCatalog::default()
        };
        assert_eq!(gateway(listed).list_collections().await.len(), 1);

        let failing = FakeCatalog {
            collections_fail: true,
            ..FakeCatalog::default()
        };
        assert!(gateway(failing).list_collections().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_collection_listing_is_unavailable() {
        let catalog = FakeCatalog {
            collections_fail: true,
            ..FakeCatalog::default()
        };
        let lookup = gateway(catalog).tier_products(CameraLevel::Mid).await;
        assert!(lookup.is_unavailable());
    }

    #[tokio::test]
    async fn test_failed_collection_listing_still_uses_handles() {
        let mut catalog = FakeCatalog {
            collections_fail: true,
            ..FakeCatalog::default()
        };
        catalog
            .products
            .insert("midrange".to_string(), vec![product(7, &[true])]);
        let lookup = gateway(catalog).tier_products(CameraLevel::Mid).await;
        assert_eq!(lookup.into_products().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let catalog = FakeCatalog {
            slow: true,
            ..FakeCatalog::default()
        };
        let gw = CatalogGateway::new(Arc::new(catalog), Duration::from_millis(20), None);
        let lookup = gw
            .list_products_by_collection(&CollectionRef::parse("extras"))
            .await;
        assert!(lookup.is_unavailable());
    }

    #[tokio::test]
    async fn test_addons_prefer_configured_collection() {
        let mut catalog = FakeCatalog::default();
        catalog.products.insert(
            CollectionId::from_numeric(55).to_string(),
            vec![product(3, &[true])],
        );
        catalog
            .products
            .insert("add-ons".to_string(), vec![product(4, &[true])]);

        let gw = CatalogGateway::new(
            Arc::new(catalog),
            Duration::from_secs(1),
            Some(CollectionId::from_numeric(55)),
        );
        let products = gw.addon_products().await.into_products();
        assert_eq!(products[0].id, ProductId::from_numeric(3));
    }

    #[tokio::test]
    async fn test_addons_walk_handles_in_order() {
        let mut catalog = FakeCatalog::default();
        catalog
            .products
            .insert("accessories".to_string(), vec![product(5, &[true])]);
        catalog
            .products
            .insert("add".to_string(), vec![product(6, &[true])]);

        let products = gateway(catalog).addon_products().await.into_products();
        assert_eq!(products[0].id, ProductId::from_numeric(5));
    }

    #[tokio::test]
    async fn test_first_available_variant() {
        let mut catalog = FakeCatalog::default();
        catalog.products.insert(
            "extras".to_string(),
            vec![product(1, &[false]), product(2, &[false, true])],
        );
        let gw = gateway(catalog);
        assert_eq!(
            gw.first_available_variant(&CollectionRef::parse("extras")).await,
            Some(VariantId::from_numeric(202))
        );
    }

    #[tokio::test]
    async fn test_first_available_variant_falls_back_to_first() {
        let mut catalog = FakeCatalog::default();
        catalog.products.insert(
            "extras".to_string(),
            vec![product(1, &[]), product(2, &[false, false])],
        );
        let gw = gateway(catalog);
        assert_eq!(
            gw.first_available_variant(&CollectionRef::parse("extras")).await,
            Some(VariantId::from_numeric(201))
        );
    }

    #[tokio::test]
    async fn test_get_product_missing_is_none() {
        assert!(
            gateway(FakeCatalog::default())
                .get_product(&ProductId::from_numeric(1))
                .await
                .is_none()
        );
    }
}
