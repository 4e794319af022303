//! GraphQL documents for the Shopify Storefront API.
//!
//! Each operation has a document, a `Variables` struct and a `Data` struct.
//! Fragments are spliced into documents at compile time with `concat!`.

use serde::{Deserialize, Serialize};

use crate::shopify::types::{
    CartMutationPayload, CartNode, CollectionNode, CollectionProductsNode, Connection, ProductNode,
};
use crate::shopify::types::{CartLineInput, CartLineUpdateInput};

/// Page size used for catalog listings (Shopify's maximum).
pub const MAX_PAGE_SIZE: u32 = 250;

macro_rules! money_fields {
    () => {
        "fragment MoneyFields on MoneyV2 { amount currencyCode }"
    };
}

macro_rules! product_fields {
    () => {
        r"
fragment ProductFields on Product {
  id
  handle
  title
  description
  priceRange { minVariantPrice { ...MoneyFields } }
  images(first: 1) { edges { node { url altText } } }
  variants(first: 100) {
    edges {
      node {
        id
        title
        price { ...MoneyFields }
        compareAtPrice { ...MoneyFields }
        availableForSale
        quantityAvailable
        selectedOptions { name value }
      }
    }
  }
}
"
    };
}

macro_rules! cart_fields {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        merchandise {
          ... on ProductVariant {
            id
            title
            product { id title }
          }
        }
        cost {
          amountPerQuantity { ...MoneyFields }
          totalAmount { ...MoneyFields }
        }
      }
    }
  }
  cost {
    subtotalAmount { ...MoneyFields }
    totalAmount { ...MoneyFields }
    totalTaxAmount { ...MoneyFields }
  }
}
"
    };
}

macro_rules! cart_payload {
    () => {
        "cart { ...CartFields } userErrors { code field message }"
    };
}

// =============================================================================
// Catalog Queries
// =============================================================================

pub mod get_product {
    use super::{Deserialize, ProductNode, Serialize};

    pub const OPERATION_NAME: &str = "GetProduct";
    pub const QUERY: &str = concat!(
        "query GetProduct($id: ID!) { product(id: $id) { ...ProductFields } }",
        product_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Data {
        pub product: Option<ProductNode>,
    }
}

pub mod get_collections {
    use super::{CollectionNode, Connection, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCollections";
    pub const QUERY: &str = r"
query GetCollections($first: Int!) {
  collections(first: $first) {
    edges { node { id handle title description image { url altText } } }
    pageInfo { hasNextPage endCursor }
  }
}
";

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: u32,
    }

    #[derive(Debug, Deserialize)]
    pub struct Data {
        pub collections: Connection<CollectionNode>,
    }
}

pub mod get_collection_products_by_id {
    use super::{CollectionProductsNode, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCollectionProductsById";
    pub const QUERY: &str = concat!(
        r"
query GetCollectionProductsById($id: ID!, $first: Int!) {
  collection(id: $id) {
    id
    handle
    title
    products(first: $first) {
      edges { node { ...ProductFields } }
      pageInfo { hasNextPage endCursor }
    }
  }
}
",
        product_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
        pub first: u32,
    }

    #[derive(Debug, Deserialize)]
    pub struct Data {
        pub collection: Option<CollectionProductsNode>,
    }
}

pub mod get_collection_products_by_handle {
    use super::{CollectionProductsNode, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCollectionProductsByHandle";
    pub const QUERY: &str = concat!(
        r"
query GetCollectionProductsByHandle($handle: String!, $first: Int!) {
  collection(handle: $handle) {
    id
    handle
    title
    products(first: $first) {
      edges { node { ...ProductFields } }
      pageInfo { hasNextPage endCursor }
    }
  }
}
",
        product_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
        pub first: u32,
    }

    #[derive(Debug, Deserialize)]
    pub struct Data {
        pub collection: Option<CollectionProductsNode>,
    }
}

// =============================================================================
// Cart Queries and Mutations
// =============================================================================

pub mod get_cart {
    use super::{CartNode, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCart";
    pub const QUERY: &str = concat!(
        "query GetCart($cartId: ID!) { cart(id: $cartId) { ...CartFields } }",
        cart_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Data {
        pub cart: Option<CartNode>,
    }
}

pub mod create_cart {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = concat!(
        "mutation CreateCart($input: CartInput!) { cartCreate(input: $input) { ",
        cart_payload!(),
        " } }",
        cart_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Data {
        pub cart_create: Option<CartMutationPayload>,
    }
}

pub mod add_cart_lines {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "AddCartLines";
    pub const QUERY: &str = concat!(
        "mutation AddCartLines($cartId: ID!, $lines: [CartLineInput!]!) { cartLinesAdd(cartId: $cartId, lines: $lines) { ",
        cart_payload!(),
        " } }",
        cart_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Data {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

pub mod update_cart_lines {
    use super::{CartLineUpdateInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = concat!(
        "mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) { cartLinesUpdate(cartId: $cartId, lines: $lines) { ",
        cart_payload!(),
        " } }",
        cart_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Data {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

pub mod remove_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "RemoveCartLines";
    pub const QUERY: &str = concat!(
        "mutation RemoveCartLines($cartId: ID!, $lineIds: [ID!]!) { cartLinesRemove(cartId: $cartId, lineIds: $lineIds) { ",
        cart_payload!(),
        " } }",
        cart_fields!(),
        money_fields!()
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Data {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}
