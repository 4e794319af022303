//! Wire types for Shopify Storefront API responses and mutation inputs.
//!
//! These mirror the JSON the API returns for the documents in
//! `storefront::queries`. Nullable fields stay `Option` here and are resolved
//! in the conversion functions, never further downstream.

use serde::{Deserialize, Serialize};

// =============================================================================
// Shared Types
// =============================================================================

/// Monetary amount as returned by the API (`MoneyV2`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyV2 {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Product or collection image.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub url: String,
    pub alt_text: Option<String>,
}

/// Relay-style connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

impl<T> Connection<T> {
    /// Unwrap edges into their nodes.
    pub fn into_nodes(self) -> impl Iterator<Item = T> {
        self.edges.into_iter().map(|edge| edge.node)
    }
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            page_info: None,
        }
    }
}

/// One edge of a connection.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// Pagination information.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Product as selected by the product fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_range: PriceRangeNode,
    #[serde(default)]
    pub images: Connection<ImageNode>,
    #[serde(default)]
    pub variants: Connection<VariantNode>,
}

/// Price range of a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeNode {
    pub min_variant_price: MoneyV2,
}

/// Product variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantNode {
    pub id: String,
    pub title: String,
    pub price: Option<MoneyV2>,
    pub compare_at_price: Option<MoneyV2>,
    #[serde(default)]
    pub available_for_sale: bool,
    pub quantity_available: Option<i64>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

/// Selected option on a variant (e.g., Colour: Black).
#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// Collection without its products.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<ImageNode>,
}

/// Collection with its first page of products.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionProductsNode {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub products: Connection<ProductNode>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Cart as selected by the cart fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNode {
    pub id: String,
    pub checkout_url: String,
    pub lines: Connection<CartLineNode>,
    pub cost: CartCostNode,
}

/// Line in a cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineNode {
    pub id: String,
    pub quantity: i64,
    pub merchandise: Option<MerchandiseNode>,
    pub cost: CartLineCostNode,
}

/// The product variant a cart line refers to.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseNode {
    pub id: String,
    pub title: String,
    pub product: MerchandiseProductNode,
}

/// Product summary embedded in a cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchandiseProductNode {
    pub id: String,
    pub title: String,
}

/// Cost of a cart line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostNode {
    pub amount_per_quantity: MoneyV2,
    pub total_amount: MoneyV2,
}

/// Cost breakdown of a cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostNode {
    pub subtotal_amount: MoneyV2,
    pub total_amount: MoneyV2,
    pub total_tax_amount: Option<MoneyV2>,
}

/// Result of any cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartNode>,
    #[serde(default)]
    pub user_errors: Vec<CartUserError>,
}

/// User error from a cart mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct CartUserError {
    pub code: Option<String>,
    pub message: String,
    #[serde(default)]
    pub field: Option<Vec<String>>,
}

// =============================================================================
// Mutation Inputs
// =============================================================================

/// Input for adding a line to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: u32,
}

impl CartLineInput {
    #[must_use]
    pub fn new(merchandise_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            merchandise_id: merchandise_id.into(),
            quantity,
        }
    }
}

/// Input for changing the quantity of an existing line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: u32,
}

impl CartLineUpdateInput {
    #[must_use]
    pub fn new(id: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            quantity,
        }
    }
}
