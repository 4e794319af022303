//! Cart snapshot types and the order summary derived from them.
//!
//! The remote cart is the source of truth. A [`Cart`] is the last snapshot the
//! platform acknowledged; an [`OrderSummary`] is a read-only projection of one
//! and is always rebuilt wholesale rather than edited.

use serde::{Deserialize, Serialize};

use super::id::{CartId, CartLineId, ProductId, VariantId};
use super::price::{CurrencyCode, Money};

/// Handle to the session's remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartHandle {
    pub id: CartId,
    pub checkout_url: Option<String>,
}

/// One (variant, quantity) entry in the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_title: String,
    pub variant_title: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Cost breakdown reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    pub subtotal: Money,
    /// Absent until the platform has enough information to estimate tax.
    pub tax: Option<Money>,
    pub total: Money,
}

impl CartCost {
    /// Zero cost in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            subtotal: Money::zero(currency_code),
            tax: None,
            total: Money::zero(currency_code),
        }
    }
}

/// Snapshot of the remote cart as last acknowledged by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub checkout_url: String,
    pub lines: Vec<CartLine>,
    pub cost: CartCost,
}

impl Cart {
    /// The handle identifying this cart.
    #[must_use]
    pub fn handle(&self) -> CartHandle {
        CartHandle {
            id: self.id.clone(),
            checkout_url: Some(self.checkout_url.clone()).filter(|url| !url.is_empty()),
        }
    }

    /// Line holding the given (product, variant) pair, if any.
    #[must_use]
    pub fn line_for(&self, product_id: &ProductId, variant_id: &VariantId) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| &line.product_id == product_id && &line.variant_id == variant_id)
    }

    /// Line by ID.
    #[must_use]
    pub fn line(&self, line_id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.line_id == line_id)
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One row of the order summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub title: String,
    pub variant_title: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            line_id: line.line_id.clone(),
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            title: line.product_title.clone(),
            variant_title: line.variant_title.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        }
    }
}

/// Order summary shown before checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderSummary {
    /// Summary of a cart that does not exist yet.
    #[must_use]
    pub const fn empty(currency_code: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            subtotal: Money::zero(currency_code),
            tax: Money::zero(currency_code),
            total: Money::zero(currency_code),
        }
    }

    /// Project a cart snapshot. Missing tax is reported as zero.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        let cost = cart.cost;
        Self {
            items: cart.lines.iter().map(OrderItem::from).collect(),
            subtotal: cost.subtotal,
            tax: cost
                .tax
                .unwrap_or_else(|| Money::zero(cost.subtotal.currency_code)),
            total: cost.total,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of item quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
