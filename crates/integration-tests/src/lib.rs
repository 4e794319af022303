//! Integration tests for Lookout.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lookout-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_reconciler` - Cart ordering, merging and failure semantics
//! - `wizard_flow` - Step transitions, tier lookups and checkout handoff
//! - `http_api` - The wizard driven over HTTP with a cookie-carrying client
//!
//! Every scenario runs against [`InMemoryShop`], a commerce backend that keeps
//! carts in memory and can delay or fail individual calls.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lookout_core::{
    Cart, CartCost, CartId, CartLine, CartLineId, Collection, CollectionId, CollectionRef,
    CurrencyCode, Money, Product, ProductId, Variant, VariantId,
};
use lookout_storefront::cart::CartBackend;
use lookout_storefront::catalog::{CatalogGateway, CatalogSource};
use lookout_storefront::shopify::ShopifyError;
use lookout_storefront::shopify::types::{CartLineInput, CartLineUpdateInput};
use lookout_storefront::wizard::Wizard;
use rust_decimal::Decimal;

/// Timeout used by every scenario.
pub const TIMEOUT: Duration = Duration::from_secs(2);

/// Money in pounds.
pub fn gbp(amount: &str) -> Money {
    Money::new(Decimal::from_str(amount).unwrap(), CurrencyCode::GBP)
}

/// A camera with variants `(variant number, option value, price)`.
pub fn camera(n: u64, name: &str, variants: &[(u64, &str, &str)]) -> Product {
    Product {
        id: ProductId::from_numeric(n),
        handle: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        description: format!("{name} security camera"),
        base_price: variants
            .first()
            .map_or_else(|| gbp("0"), |(_, _, price)| gbp(price)),
        image: None,
        variants: variants
            .iter()
            .map(|(id, value, price)| Variant {
                id: VariantId::from_numeric(*id),
                name: (*value).to_string(),
                value: (*value).to_string(),
                price: gbp(price),
                compare_at_price: None,
                available_for_sale: true,
                quantity_available: Some(10),
            })
            .collect(),
    }
}

/// Catalog entry for a variant.
#[derive(Debug, Clone)]
struct Listed {
    product_id: ProductId,
    product_title: String,
    variant_title: String,
    price: Money,
}

/// In-memory Storefront stand-in.
#[derive(Default)]
pub struct InMemoryShop {
    collections: Vec<Collection>,
    listings: HashMap<String, Vec<Product>>,
    failing_listings: HashSet<String>,
    listing_delays: HashMap<String, Duration>,
    variants: HashMap<VariantId, Listed>,
    carts: Mutex<HashMap<CartId, Cart>>,
    mutation_delays: Mutex<VecDeque<Duration>>,
    failing_mutations: AtomicUsize,
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
}

impl InMemoryShop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection, reachable by ID and by handle.
    #[must_use]
    pub fn with_collection(
        mut self,
        n: u64,
        handle: &str,
        title: &str,
        products: Vec<Product>,
    ) -> Self {
        let id = CollectionId::from_numeric(n);
        self.collections.push(Collection {
            id: id.clone(),
            handle: handle.to_string(),
            title: title.to_string(),
            description: String::new(),
            image: None,
        });
        self.with_listing(id.as_str(), products.clone())
            .with_listing(handle, products)
    }

    /// Products under a collection ID or handle.
    #[must_use]
    pub fn with_listing(mut self, key: &str, products: Vec<Product>) -> Self {
        for product in &products {
            for variant in &product.variants {
                self.variants.insert(
                    variant.id.clone(),
                    Listed {
                        product_id: product.id.clone(),
                        product_title: product.name.clone(),
                        variant_title: variant.value.clone(),
                        price: variant.price,
                    },
                );
            }
        }
        self.listings.insert(key.to_string(), products);
        self
    }

    /// Listing calls for `key` fail.
    #[must_use]
    pub fn with_failing_listing(mut self, key: &str) -> Self {
        self.failing_listings.insert(key.to_string());
        self
    }

    /// Listing calls for `key` take `delay`.
    #[must_use]
    pub fn with_slow_listing(mut self, key: &str, delay: Duration) -> Self {
        self.listing_delays.insert(key.to_string(), delay);
        self
    }

    /// The next mutations wait these delays, in order, before applying.
    pub fn delay_next_mutations(&self, delays: &[Duration]) {
        self.mutation_delays
            .lock()
            .unwrap()
            .extend(delays.iter().copied());
    }

    /// The next `count` mutations fail without touching any cart.
    pub fn fail_next_mutations(&self, count: usize) {
        self.failing_mutations.store(count, Ordering::SeqCst);
    }

    /// Backend calls made so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Live remote cart, bypassing the reconciler.
    pub fn remote_cart(&self, id: &CartId) -> Option<Cart> {
        self.carts.lock().unwrap().get(id).cloned()
    }

    /// Wizard backed by this shop.
    pub fn wizard(self: &Arc<Self>) -> Wizard<Self> {
        let catalog = CatalogGateway::new(Arc::clone(self), TIMEOUT, None);
        Wizard::new(catalog, Arc::clone(self), TIMEOUT)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn before_mutation(&self, name: &str) -> Result<(), ShopifyError> {
        self.record(name.to_string());
        let delay = self.mutation_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing_mutations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ShopifyError::UserError(format!("{name} rejected")));
        }
        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn append(&self, cart: &mut Cart, lines: Vec<CartLineInput>) -> Result<(), ShopifyError> {
        for input in lines {
            let variant_id = VariantId::new(input.merchandise_id);
            let listed = self
                .variants
                .get(&variant_id)
                .cloned()
                .ok_or_else(|| ShopifyError::UserError(format!("unknown merchandise {variant_id}")))?;
            cart.lines.push(CartLine {
                line_id: CartLineId::from_numeric(self.next_id()),
                product_id: listed.product_id,
                variant_id,
                product_title: listed.product_title,
                variant_title: listed.variant_title,
                quantity: input.quantity,
                unit_price: listed.price,
                line_total: listed.price,
            });
        }
        Ok(())
    }

    fn apply(
        &self,
        cart_id: &CartId,
        change: impl FnOnce(&mut Cart) -> Result<(), ShopifyError>,
    ) -> Result<Cart, ShopifyError> {
        let mut carts = self.carts.lock().unwrap();
        let current = carts
            .get(cart_id)
            .ok_or_else(|| ShopifyError::NotFound(cart_id.to_string()))?;

        // All-or-nothing, like the real mutations
        let mut next = current.clone();
        change(&mut next)?;
        reprice(&mut next);
        carts.insert(cart_id.clone(), next.clone());
        Ok(next)
    }
}

fn reprice(cart: &mut Cart) {
    let mut subtotal = Money::zero(CurrencyCode::GBP);
    for line in &mut cart.lines {
        line.line_total = line.unit_price.times(line.quantity);
        subtotal = subtotal.checked_add(line.line_total).unwrap();
    }
    cart.cost = CartCost {
        subtotal,
        tax: None,
        total: subtotal,
    };
}

impl CatalogSource for InMemoryShop {
    async fn collections(&self, _first: u32) -> Result<Vec<Collection>, ShopifyError> {
        self.record("collections".to_string());
        Ok(self.collections.clone())
    }

    async fn collection_products(
        &self,
        collection: &CollectionRef,
        _first: u32,
    ) -> Result<Option<Vec<Product>>, ShopifyError> {
        let key = collection.as_str();
        self.record(format!("products:{key}"));
        if let Some(delay) = self.listing_delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_listings.contains(key) {
            return Err(ShopifyError::RateLimited(2));
        }
        Ok(self.listings.get(key).cloned())
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, ShopifyError> {
        self.record(format!("product:{id}"));
        Ok(self
            .listings
            .values()
            .flatten()
            .find(|p| &p.id == id)
            .cloned())
    }
}

impl CartBackend for InMemoryShop {
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        self.before_mutation("cartCreate").await?;
        let n = self.next_id();
        let mut cart = Cart {
            id: CartId::new(format!("gid://shopify/Cart/it{n}?key=k{n}")),
            checkout_url: format!("https://lookout-cameras.myshopify.com/cart/c/it{n}?key=k{n}"),
            lines: Vec::new(),
            cost: CartCost::zero(CurrencyCode::GBP),
        };
        self.append(&mut cart, lines)?;
        reprice(&mut cart);
        self.carts
            .lock()
            .unwrap()
            .insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        self.before_mutation("cartLinesAdd").await?;
        self.apply(cart_id, |cart| self.append(cart, lines))
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        self.before_mutation("cartLinesUpdate").await?;
        self.apply(cart_id, |cart| {
            for update in lines {
                let id = CartLineId::new(update.id);
                let line = cart
                    .lines
                    .iter_mut()
                    .find(|l| l.line_id == id)
                    .ok_or_else(|| ShopifyError::UserError(format!("unknown line {id}")))?;
                line.quantity = update.quantity;
            }
            cart.lines.retain(|l| l.quantity > 0);
            Ok(())
        })
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        self.before_mutation("cartLinesRemove").await?;
        self.apply(cart_id, |cart| {
            cart.lines.retain(|l| !line_ids.contains(&l.line_id));
            Ok(())
        })
    }

    async fn cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        self.record("cart".to_string());
        Ok(self.remote_cart(cart_id))
    }
}

/// The catalog used by most scenarios.
///
/// Three tier collections titled the way merchants tend to title them, plus
/// an add-on collection under a conventional handle.
pub fn standard_shop() -> InMemoryShop {
    InMemoryShop::new()
        .with_collection(
            1,
            "entry-level",
            "Entry Level",
            vec![camera(1, "Watchman", &[(101, "White / 1080p", "49.00")])],
        )
        .with_collection(
            2,
            "mid-range-pro",
            "Mid Range Pro",
            vec![
                camera(
                    2,
                    "Sentinel",
                    &[
                        (201, "Black / 2K", "89.00"),
                        (202, "Black / 4K", "119.00"),
                        (203, "White / 2K", "89.00"),
                    ],
                ),
                camera(3, "Sentinel Dome", &[(301, "White", "99.00")]),
            ],
        )
        .with_collection(
            3,
            "high-end",
            "High End",
            vec![camera(4, "Overwatch", &[(401, "Graphite / 8K / PoE", "349.00")])],
        )
        .with_listing(
            "add-extras",
            vec![
                camera(5, "Mounting Bracket", &[(501, "Standard", "12.50")]),
                camera(6, "64GB SD Card", &[(601, "Default", "15.00")]),
            ],
        )
}
