//! Product type conversion functions.

use lookout_core::{Money, OPTION_SEPARATOR, Product, ProductId, Variant, VariantId};
use tracing::warn;

use crate::shopify::ShopifyError;
use crate::shopify::types::{ProductNode, VariantNode};

use super::collections::convert_image;
use super::convert_money;

/// Convert a product node.
///
/// # Errors
///
/// Returns `ShopifyError::InvalidMoney` if the product's minimum price
/// cannot be parsed. Individual variants with a bad price fall back to it.
pub fn convert_product(node: ProductNode) -> Result<Product, ShopifyError> {
    let base_price = convert_money(&node.price_range.min_variant_price)?;

    let variants = node
        .variants
        .into_nodes()
        .map(|variant| convert_variant(variant, base_price))
        .collect();

    Ok(Product {
        id: ProductId::new(node.id),
        handle: node.handle,
        name: node.title,
        description: node.description,
        base_price,
        image: node.images.into_nodes().next().map(convert_image),
        variants,
    })
}

/// Convert a list of product nodes, dropping any that cannot be converted.
pub fn convert_products(nodes: impl IntoIterator<Item = ProductNode>) -> Vec<Product> {
    nodes
        .into_iter()
        .filter_map(|node| {
            let id = node.id.clone();
            convert_product(node)
                .inspect_err(|e| warn!(product_id = %id, error = %e, "Skipping product"))
                .ok()
        })
        .collect()
}

fn convert_variant(node: VariantNode, base_price: Money) -> Variant {
    let value = node
        .selected_options
        .iter()
        .map(|option| option.value.as_str())
        .collect::<Vec<_>>()
        .join(OPTION_SEPARATOR);

    let price = node
        .price
        .as_ref()
        .and_then(|price| {
            convert_money(price)
                .inspect_err(|e| warn!(variant_id = %node.id, error = %e, "Using base price"))
                .ok()
        })
        .unwrap_or(base_price);

    // Compare-at is display-only, a bad value is simply not shown
    let compare_at_price = node
        .compare_at_price
        .as_ref()
        .and_then(|price| convert_money(price).ok());

    Variant {
        id: VariantId::new(node.id),
        value: if value.is_empty() {
            node.title.clone()
        } else {
            value
        },
        name: node.title,
        price,
        compare_at_price,
        available_for_sale: node.available_for_sale,
        quantity_available: node.quantity_available,
    }
}
