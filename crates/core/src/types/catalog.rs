//! Catalog types: products, variants and collections.
//!
//! These are the normalized shapes the wizard works with. Optional remote
//! fields are resolved once at the gateway boundary so nothing downstream has
//! to second-guess them.

use serde::{Deserialize, Serialize};

use super::id::{CollectionId, GID_PREFIX, ProductId, VariantId};
use super::price::Money;

/// Separator between option values in a variant's `value`.
pub const OPTION_SEPARATOR: &str = " / ";

/// A purchasable product with its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub name: String,
    pub description: String,
    /// Lowest variant price, shown before a variant is chosen.
    pub base_price: Money,
    pub image: Option<Image>,
    pub variants: Vec<Variant>,
}

impl Product {
    /// A product without variants cannot be added to a cart.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// First variant available for sale, else the first variant.
    #[must_use]
    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| v.available_for_sale)
            .or_else(|| self.variants.first())
    }
}

/// A single purchasable option combination of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub name: String,
    /// Option values joined with `" / "`, e.g. `"Black / 4K"`.
    pub value: String,
    pub price: Money,
    /// Display-only strikethrough price.
    pub compare_at_price: Option<Money>,
    pub available_for_sale: bool,
    pub quantity_available: Option<i64>,
}

impl Variant {
    /// Individual option values in position order.
    #[must_use]
    pub fn option_values(&self) -> Vec<&str> {
        if self.value.is_empty() {
            return Vec::new();
        }
        self.value.split(OPTION_SEPARATOR).map(str::trim).collect()
    }

    /// Whether the compare-at price is above the selling price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.compare_at_price.is_some_and(|compare| {
            compare.currency_code == self.price.currency_code && compare.amount > self.price.amount
        })
    }
}

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A platform grouping of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub image: Option<Image>,
}

/// How a collection is addressed: by global ID or by handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CollectionRef {
    Id(CollectionId),
    Handle(String),
}

impl CollectionRef {
    /// Decide whether an identifier is a collection global ID or a handle.
    #[must_use]
    pub fn parse(identifier: &str) -> Self {
        let identifier = identifier.trim();
        if identifier
            .strip_prefix(GID_PREFIX)
            .is_some_and(|rest| rest.starts_with(CollectionId::RESOURCE))
        {
            Self::Id(CollectionId::new(identifier))
        } else {
            Self::Handle(identifier.to_string())
        }
    }

    /// String form used for logging and cache keys.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id(id) => id.as_str(),
            Self::Handle(handle) => handle,
        }
    }
}

impl From<CollectionId> for CollectionRef {
    fn from(id: CollectionId) -> Self {
        Self::Id(id)
    }
}

impl std::fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::price::CurrencyCode;

    fn money(amount: &str) -> Money {
        Money::parse(amount, "GBP").unwrap()
    }

    fn variant(id: u64, value: &str, available: bool) -> Variant {
        Variant {
            id: VariantId::from_numeric(id),
            name: value.to_string(),
            value: value.to_string(),
            price: money("100.00"),
            compare_at_price: None,
            available_for_sale: available,
            quantity_available: None,
        }
    }

    fn product(variants: Vec<Variant>) -> Product {
        Product {
            id: ProductId::from_numeric(1),
            handle: "dome-4k".to_string(),
            name: "Dome 4K".to_string(),
            description: String::new(),
            base_price: Money::zero(CurrencyCode::GBP),
            image: None,
            variants,
        }
    }

    #[test]
    fn test_product_without_variants_is_not_orderable() {
        assert!(!product(vec![]).is_orderable());
        assert!(product(vec![variant(1, "Black", true)]).is_orderable());
    }

    #[test]
    fn test_default_variant_prefers_available() {
        let p = product(vec![variant(1, "Black", false), variant(2, "White", true)]);
        assert_eq!(p.default_variant().unwrap().id, VariantId::from_numeric(2));

        let p = product(vec![variant(1, "Black", false)]);
        assert_eq!(p.default_variant().unwrap().id, VariantId::from_numeric(1));
    }

    #[test]
    fn test_option_values() {
        assert_eq!(
            variant(1, "Black / 4K / PoE", true).option_values(),
            vec!["Black", "4K", "PoE"]
        );
        assert!(variant(1, "", true).option_values().is_empty());
    }

    #[test]
    fn test_is_discounted() {
        let mut v = variant(1, "Black", true);
        assert!(!v.is_discounted());
        v.compare_at_price = Some(money("120.00"));
        assert!(v.is_discounted());
        v.compare_at_price = Some(money("90.00"));
        assert!(!v.is_discounted());
    }

    #[test]
    fn test_collection_ref_parse() {
        assert_eq!(
            CollectionRef::parse("gid://shopify/Collection/672209174854"),
            CollectionRef::Id(CollectionId::from_numeric(672_209_174_854))
        );
        assert_eq!(
            CollectionRef::parse("entry-level"),
            CollectionRef::Handle("entry-level".to_string())
        );
        // Other resource types are not collection IDs
        assert!(matches!(
            CollectionRef::parse("gid://shopify/Product/1"),
            CollectionRef::Handle(_)
        ));
    }
}
