//! Cart type conversion functions.

use lookout_core::{Cart, CartCost, CartId, CartLine, CartLineId, ProductId, VariantId};
use tracing::warn;

use crate::shopify::ShopifyError;
use crate::shopify::types::{CartLineNode, CartNode, CartUserError};

use super::convert_money;

/// Shopify's placeholder title for variants of single-variant products.
const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// Convert a cart node into a snapshot.
///
/// # Errors
///
/// Returns `ShopifyError::InvalidMoney` if any cost field cannot be parsed.
/// A partially parsed cart is never returned.
pub fn convert_cart(node: CartNode) -> Result<Cart, ShopifyError> {
    let cost = CartCost {
        subtotal: convert_money(&node.cost.subtotal_amount)?,
        tax: node
            .cost
            .total_tax_amount
            .as_ref()
            .map(convert_money)
            .transpose()?,
        total: convert_money(&node.cost.total_amount)?,
    };

    let mut lines = Vec::with_capacity(node.lines.edges.len());
    for line in node.lines.into_nodes() {
        if let Some(line) = convert_cart_line(line)? {
            lines.push(line);
        }
    }

    Ok(Cart {
        id: CartId::new(node.id),
        checkout_url: node.checkout_url,
        lines,
        cost,
    })
}

fn convert_cart_line(node: CartLineNode) -> Result<Option<CartLine>, ShopifyError> {
    let Some(merchandise) = node.merchandise else {
        warn!(line_id = %node.id, "Cart line without product variant merchandise");
        return Ok(None);
    };

    let quantity = u32::try_from(node.quantity).unwrap_or(0);
    let variant_title = if merchandise.title == DEFAULT_VARIANT_TITLE {
        String::new()
    } else {
        merchandise.title
    };

    Ok(Some(CartLine {
        line_id: CartLineId::new(node.id),
        product_id: ProductId::new(merchandise.product.id),
        variant_id: VariantId::new(merchandise.id),
        product_title: merchandise.product.title,
        variant_title,
        quantity,
        unit_price: convert_money(&node.cost.amount_per_quantity)?,
        line_total: convert_money(&node.cost.total_amount)?,
    }))
}

/// Join user errors into one message.
pub fn convert_user_errors(errors: Vec<CartUserError>) -> String {
    errors
        .into_iter()
        .map(|e| match e.code {
            Some(code) => format!("{} ({code})", e.message),
            None => e.message,
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_json(tax: serde_json::Value, line_amount: &str) -> CartNode {
        serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Cart/c1",
            "checkoutUrl": "https://lookout-cameras.myshopify.com/cart/c/c1",
            "lines": {"edges": [
                {"node": {
                    "id": "gid://shopify/CartLine/1?cart=c1",
                    "quantity": 2,
                    "merchandise": {
                        "id": "gid://shopify/ProductVariant/11",
                        "title": "Default Title",
                        "product": {"id": "gid://shopify/Product/1", "title": "Turret 4K"}
                    },
                    "cost": {
                        "amountPerQuantity": {"amount": line_amount, "currencyCode": "GBP"},
                        "totalAmount": {"amount": "298.00", "currencyCode": "GBP"}
                    }
                }}
            ]},
            "cost": {
                "subtotalAmount": {"amount": "298.00", "currencyCode": "GBP"},
                "totalAmount": {"amount": "298.00", "currencyCode": "GBP"},
                "totalTaxAmount": tax
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_convert_cart() {
        let cart = convert_cart(cart_json(serde_json::Value::Null, "149.00")).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.lines[0].variant_title, "");
        assert_eq!(cart.cost.tax, None);
    }

    #[test]
    fn test_convert_cart_with_tax() {
        let tax = serde_json::json!({"amount": "49.67", "currencyCode": "GBP"});
        let cart = convert_cart(cart_json(tax, "149.00")).unwrap();
        assert!(cart.cost.tax.is_some());
    }

    #[test]
    fn test_convert_cart_rejects_bad_money() {
        let result = convert_cart(cart_json(serde_json::Value::Null, "oops"));
        assert!(matches!(result, Err(ShopifyError::InvalidMoney(_))));
    }

    #[test]
    fn test_convert_user_errors() {
        let message = convert_user_errors(vec![
            CartUserError {
                code: Some("INVALID".to_string()),
                message: "Merchandise does not exist".to_string(),
                field: None,
            },
            CartUserError {
                code: None,
                message: "Quantity too high".to_string(),
                field: Some(vec!["lines".to_string()]),
            },
        ]);
        assert_eq!(
            message,
            "Merchandise does not exist (INVALID); Quantity too high"
        );
    }
}
