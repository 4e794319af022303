//! Newtype IDs for type-safe Shopify entity references.
//!
//! Shopify identifies every resource with a global ID string such as
//! `gid://shopify/ProductVariant/4412`. Use the `define_gid!` macro to create
//! wrappers that prevent accidentally passing a product ID where a variant ID
//! is expected.

/// Prefix shared by every Shopify global ID.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Macro to define a type-safe Shopify global ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `from_numeric()`, `as_str()`, `numeric()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use lookout_core::define_gid;
/// define_gid!(ProductId, "Product");
/// define_gid!(VariantId, "ProductVariant");
///
/// let product = ProductId::from_numeric(1);
/// assert_eq!(product.as_str(), "gid://shopify/Product/1");
///
/// // These are different types, so this won't compile:
/// // let _: VariantId = product;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Shopify resource type name used in the global ID.
            pub const RESOURCE: &'static str = $resource;

            /// Wrap an existing global ID string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Build a global ID from the numeric part shown in Shopify admin URLs.
            #[must_use]
            pub fn from_numeric(id: u64) -> Self {
                Self(format!("{}{}/{}", $crate::types::id::GID_PREFIX, $resource, id))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Trailing numeric segment, if the ID has the expected shape.
            #[must_use]
            pub fn numeric(&self) -> Option<u64> {
                self.0
                    .strip_prefix($crate::types::id::GID_PREFIX)?
                    .strip_prefix($resource)?
                    .strip_prefix('/')?
                    .split('?')
                    .next()?
                    .parse()
                    .ok()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_gid!(ProductId, "Product");
define_gid!(VariantId, "ProductVariant");
define_gid!(CollectionId, "Collection");
define_gid!(CartId, "Cart");
define_gid!(CartLineId, "CartLine");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_numeric() {
        let id = CollectionId::from_numeric(672_209_174_854);
        assert_eq!(id.as_str(), "gid://shopify/Collection/672209174854");
        assert_eq!(id.numeric(), Some(672_209_174_854));
    }

    #[test]
    fn test_numeric_rejects_other_resource() {
        let id = ProductId::new("gid://shopify/ProductVariant/12");
        assert_eq!(id.numeric(), None);
    }

    #[test]
    fn test_numeric_ignores_query_suffix() {
        // Cart line IDs carry a query string with the cart key
        let id = CartLineId::new("gid://shopify/CartLine/77?cart=abc");
        assert_eq!(id.numeric(), Some(77));
    }

    #[test]
    fn test_serde_transparent() {
        let id = VariantId::from_numeric(5);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/ProductVariant/5\"");
        let back: VariantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display() {
        let id = CartId::new("gid://shopify/Cart/c1-abc");
        assert_eq!(id.to_string(), "gid://shopify/Cart/c1-abc");
    }
}
