//! Shopify Storefront API client implementation.
//!
//! Sends hand-written documents as `graphql_client::QueryBody` over `reqwest`
//! 0.13. Caches products and collections using `moka` (5-minute TTL).

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{QueryBody, Response};
use lookout_core::{Cart, CartId, CartLineId, Collection, CollectionRef, Product, ProductId};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::cart::CartBackend;
use crate::catalog::CatalogSource;
use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput, CartMutationPayload};
use crate::shopify::ShopifyError;

use cache::{CacheKey, CacheValue};
use conversions::{
    convert_cart, convert_collection, convert_product, convert_products, convert_user_errors,
};
use queries::{
    add_cart_lines, create_cart, get_cart, get_collection_products_by_handle,
    get_collection_products_by_id, get_collections, get_product, remove_cart_lines,
    update_cart_lines,
};

/// Header carrying the private Storefront access token.
const PRIVATE_TOKEN_HEADER: &str = "Shopify-Storefront-Private-Token";

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides access to products, collections, and cart operations.
/// Products and collections are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    timeout: Duration,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyStorefrontConfig, timeout: Duration) -> Result<Self, ShopifyError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: config.endpoint(),
                access_token: config.storefront_private_token.expose_secret().to_string(),
                timeout,
                cache,
            }),
        })
    }

    /// Execute a GraphQL operation.
    async fn execute<V, T>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<T, ShopifyError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let request_body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(PRIVATE_TOKEN_HEADER, &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::graphql(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<T> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = operation_name,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, operation = operation_name, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(errors));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql("No data in response")
        })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ShopifyError {
        if error.is_timeout() {
            ShopifyError::Timeout(self.inner.timeout.as_secs())
        } else {
            ShopifyError::Http(error)
        }
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get a product by its global ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, ShopifyError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let data: get_product::Data = self
            .execute(
                get_product::OPERATION_NAME,
                get_product::QUERY,
                get_product::Variables {
                    id: id.to_string(),
                },
            )
            .await?;

        let Some(node) = data.product else {
            return Ok(None);
        };
        let product = convert_product(node)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(Some(product))
    }

    /// Get the first page of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(&self, first: u32) -> Result<Vec<Collection>, ShopifyError> {
        let first = first.min(queries::MAX_PAGE_SIZE);
        let cache_key = CacheKey::Collections { first };

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let data: get_collections::Data = self
            .execute(
                get_collections::OPERATION_NAME,
                get_collections::QUERY,
                get_collections::Variables { first },
            )
            .await?;

        let collections: Vec<Collection> = data
            .collections
            .into_nodes()
            .map(convert_collection)
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(collections.clone()))
            .await;

        Ok(collections)
    }

    /// Get the first page of products in a collection, by ID or handle.
    ///
    /// Returns `Ok(None)` if the collection does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(collection = %collection))]
    pub async fn get_collection_products(
        &self,
        collection: &CollectionRef,
        first: u32,
    ) -> Result<Option<Vec<Product>>, ShopifyError> {
        let first = first.min(queries::MAX_PAGE_SIZE);
        let cache_key = CacheKey::CollectionProducts {
            collection: collection.clone(),
            first,
        };

        if let Some(CacheValue::CollectionProducts(products)) =
            self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collection products");
            return Ok(products);
        }

        let node = match collection {
            CollectionRef::Id(id) => {
                let data: get_collection_products_by_id::Data = self
                    .execute(
                        get_collection_products_by_id::OPERATION_NAME,
                        get_collection_products_by_id::QUERY,
                        get_collection_products_by_id::Variables {
                            id: id.to_string(),
                            first,
                        },
                    )
                    .await?;
                data.collection
            }
            CollectionRef::Handle(handle) => {
                let data: get_collection_products_by_handle::Data = self
                    .execute(
                        get_collection_products_by_handle::OPERATION_NAME,
                        get_collection_products_by_handle::QUERY,
                        get_collection_products_by_handle::Variables {
                            handle: handle.clone(),
                            first,
                        },
                    )
                    .await?;
                data.collection
            }
        };

        let products = node.map(|collection| {
            debug!(
                handle = %collection.handle,
                count = collection.products.edges.len(),
                "Collection products fetched"
            );
            convert_products(collection.products.into_nodes())
        });

        self.inner
            .cache
            .insert(cache_key, CacheValue::CollectionProducts(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart, optionally with initial lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let data: create_cart::Data = self
            .execute(
                create_cart::OPERATION_NAME,
                create_cart::QUERY,
                create_cart::Variables {
                    input: create_cart::CartInput { lines },
                },
            )
            .await?;

        cart_from_payload(data.cart_create, "Failed to create cart")
    }

    /// Get an existing cart. Returns `Ok(None)` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        let data: get_cart::Data = self
            .execute(
                get_cart::OPERATION_NAME,
                get_cart::QUERY,
                get_cart::Variables {
                    cart_id: cart_id.to_string(),
                },
            )
            .await?;

        data.cart.map(convert_cart).transpose()
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data: add_cart_lines::Data = self
            .execute(
                add_cart_lines::OPERATION_NAME,
                add_cart_lines::QUERY,
                add_cart_lines::Variables {
                    cart_id: cart_id.to_string(),
                    lines,
                },
            )
            .await?;

        cart_from_payload(data.cart_lines_add, "Failed to add to cart")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data: update_cart_lines::Data = self
            .execute(
                update_cart_lines::OPERATION_NAME,
                update_cart_lines::QUERY,
                update_cart_lines::Variables {
                    cart_id: cart_id.to_string(),
                    lines,
                },
            )
            .await?;

        cart_from_payload(data.cart_lines_update, "Failed to update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        let data: remove_cart_lines::Data = self
            .execute(
                remove_cart_lines::OPERATION_NAME,
                remove_cart_lines::QUERY,
                remove_cart_lines::Variables {
                    cart_id: cart_id.to_string(),
                    line_ids: line_ids.into_iter().map(String::from).collect(),
                },
            )
            .await?;

        cart_from_payload(data.cart_lines_remove, "Failed to remove from cart")
    }
}

/// Unwrap a cart mutation payload, surfacing user errors first.
fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    failure: &str,
) -> Result<Cart, ShopifyError> {
    if let Some(result) = payload {
        if !result.user_errors.is_empty() {
            return Err(ShopifyError::UserError(convert_user_errors(
                result.user_errors,
            )));
        }

        if let Some(cart) = result.cart {
            return convert_cart(cart);
        }
    }

    Err(ShopifyError::graphql(failure))
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl CatalogSource for StorefrontClient {
    async fn collections(&self, first: u32) -> Result<Vec<Collection>, ShopifyError> {
        self.get_collections(first).await
    }

    async fn collection_products(
        &self,
        collection: &CollectionRef,
        first: u32,
    ) -> Result<Option<Vec<Product>>, ShopifyError> {
        self.get_collection_products(collection, first).await
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>, ShopifyError> {
        self.get_product(id).await
    }
}

impl CartBackend for StorefrontClient {
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        Self::create_cart(self, lines).await
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        self.add_to_cart(cart_id, lines).await
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        self.update_cart(cart_id, lines).await
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<Cart, ShopifyError> {
        self.remove_from_cart(cart_id, line_ids).await
    }

    async fn cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        self.get_cart(cart_id).await
    }
}
