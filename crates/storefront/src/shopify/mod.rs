//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Hand-written GraphQL documents sent as `graphql_client::QueryBody`
//! - Responses decoded as `graphql_client::Response<T>` into wire types
//! - Wire types converted once into `lookout_core` types
//! - Shopify is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use lookout_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify, config.request_timeout)?;
//!
//! let collections = client.get_collections(250).await?;
//! let cart = client
//!     .create_cart(vec![CartLineInput::new(&variant_id, 1)])
//!     .await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;

use graphql_client::PathFragment;
use lookout_core::MoneyError;
use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<graphql_client::Error>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// The call did not complete in time.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// A monetary field could not be parsed.
    #[error("Invalid money value: {0}")]
    InvalidMoney(#[from] MoneyError),
}

impl ShopifyError {
    /// Shorthand for a single-message GraphQL error.
    pub(crate) fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![graphql_client::Error {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }])
    }
}

/// One line per error: message, dotted path, first source location.
fn format_graphql_errors(errors: &[graphql_client::Error]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    let describe = |e: &graphql_client::Error| {
        let mut parts = Vec::new();
        if !e.message.is_empty() {
            parts.push(e.message.clone());
        }
        if let Some(path) = e.path.as_deref().filter(|p| !p.is_empty()) {
            let dotted = path
                .iter()
                .map(|fragment| match fragment {
                    PathFragment::Key(key) => key.clone(),
                    PathFragment::Index(index) => index.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".");
            parts.push(format!("path: {dotted}"));
        }
        if let Some(at) = e.locations.as_deref().and_then(<[_]>::first) {
            parts.push(format!("at line {}:{}", at.line, at.column));
        }
        parts
    };

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let parts = describe(e);
            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
