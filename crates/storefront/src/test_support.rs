//! In-memory commerce backend for unit tests.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use lookout_core::{
    Cart, CartCost, CartId, CartLine, CartLineId, Collection, CollectionId, CollectionRef,
    CurrencyCode, Money, Product, ProductId, Variant, VariantId,
};
use rust_decimal::Decimal;

use crate::cart::CartBackend;
use crate::catalog::CatalogSource;
use crate::shopify::ShopifyError;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput};

pub fn money(amount: &str) -> Money {
    Money::new(Decimal::from_str(amount).unwrap(), CurrencyCode::GBP)
}

/// Product `n` with variants `(variant number, option value, price)`.
pub fn product(n: u64, variants: &[(u64, &str, &str)]) -> Product {
    Product {
        id: ProductId::from_numeric(n),
        handle: format!("product-{n}"),
        name: format!("Product {n}"),
        description: String::new(),
        base_price: variants
            .first()
            .map_or_else(|| money("0"), |(_, _, price)| money(price)),
        image: None,
        variants: variants
            .iter()
            .map(|(id, value, price)| Variant {
                id: VariantId::from_numeric(*id),
                name: (*value).to_string(),
                value: (*value).to_string(),
                price: money(price),
                compare_at_price: None,
                available_for_sale: true,
                quantity_available: None,
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    collections: Vec<Collection>,
    listings: HashMap<String, Vec<Product>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    prices: HashMap<VariantId, (ProductId, Money)>,
    carts: Mutex<HashMap<CartId, Cart>>,
    next_id: AtomicU64,
    creates: AtomicUsize,
    fail_next: AtomicBool,
}

impl MemoryStore {
    /// Store selling `(product, variant, price)` triples.
    pub fn with_prices(entries: &[(u64, u64, &str)]) -> Self {
        let mut store = Self::default();
        for (p, v, price) in entries {
            store.prices.insert(
                VariantId::from_numeric(*v),
                (ProductId::from_numeric(*p), money(price)),
            );
        }
        store
    }

    /// Register a collection by numeric id and handle.
    #[must_use]
    pub fn collection(mut self, n: u64, handle: &str, title: &str, products: Vec<Product>) -> Self {
        let id = CollectionId::from_numeric(n);
        self.collections.push(Collection {
            id: id.clone(),
            handle: handle.to_string(),
            title: title.to_string(),
            description: String::new(),
            image: None,
        });
        self.listing(id.as_str(), products.clone()).listing(handle, products)
    }

    /// Register products under a collection id or handle.
    #[must_use]
    pub fn listing(mut self, key: &str, products: Vec<Product>) -> Self {
        for product in &products {
            for variant in &product.variants {
                self.prices
                    .insert(variant.id.clone(), (product.id.clone(), variant.price));
            }
        }
        self.listings.insert(key.to_string(), products);
        self
    }

    #[must_use]
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    #[must_use]
    pub fn delayed(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    pub fn fail_next_mutation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), ShopifyError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ShopifyError::UserError("injected failure".to_string()));
        }
        Ok(())
    }

    fn mutate(
        &self,
        cart_id: &CartId,
        apply: impl FnOnce(&mut Cart, &Self),
    ) -> Result<Cart, ShopifyError> {
        self.check_failure()?;
        let mut carts = self.carts.lock().unwrap();
        let cart = carts
            .get_mut(cart_id)
            .ok_or_else(|| ShopifyError::NotFound(cart_id.to_string()))?;
        apply(cart, self);
        reprice(cart);
        Ok(cart.clone())
    }

    fn append(&self, cart: &mut Cart, lines: Vec<CartLineInput>) {
        for input in lines {
            let variant_id = VariantId::new(input.merchandise_id);
            let (product_id, price) = self
                .prices
                .get(&variant_id)
                .cloned()
                .unwrap_or_else(|| (ProductId::from_numeric(0), money("0")));
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            cart.lines.push(CartLine {
                line_id: CartLineId::from_numeric(n),
                product_title: format!("Product {}", product_id.numeric().unwrap_or(0)),
                product_id,
                variant_title: variant_id.to_string(),
                variant_id,
                quantity: input.quantity,
                unit_price: price,
                line_total: price,
            });
        }
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

impl CatalogSource for MemoryStore {
    async fn collections(&self, _first: u32) -> Result<Vec<Collection>, ShopifyError> {
        Ok(self.collections.clone())
    }

    async fn collection_products(
        &self,
        collection: &CollectionRef,
        _first: u32,
    ) -> Result<Option<Vec<Product>>, ShopifyError> {
        let key = collection.as_str();
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(key) {
            return Err(ShopifyError::graphql("listing failed"));
        }
        Ok(self.listings.get(key).cloned())
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, ShopifyError> {
        Ok(self
            .listings
            .values()
            .flatten()
            .find(|p| &p.id == id)
            .cloned())
    }
}

impl CartBackend for MemoryStore {
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        self.check_failure()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut cart = Cart {
            id: CartId::new(format!("gid://shopify/Cart/c{n}")),
            checkout_url: format!("https://shop.example/cart/c/c{n}"),
            lines: Vec::new(),
            cost: CartCost::zero(CurrencyCode::GBP),
        };
        self.append(&mut cart, lines);
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
        self.mutate(cart_id, |cart, store| store.append(cart, lines))
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate(cart_id, |cart, _| {
            for update in lines {
                let id = CartLineId::new(update.id);
                if update.quantity == 0 {
                    cart.lines.retain(|line| line.line_id != id);
                } else if let Some(line) = cart.lines.iter_mut().find(|l| l.line_id == id) {
                    line.quantity = update.quantity;
                }
            }
        })
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        self.mutate(cart_id, |cart, _| {
            cart.lines.retain(|line| !line_ids.contains(&line.line_id));
        })
    }

    async fn cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        Ok(self.carts.lock().unwrap().get(cart_id).cloned())
    }
}
