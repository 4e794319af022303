//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use lookout_core::CollectionId;
use moka::future::Cache;

use crate::catalog::CatalogGateway;
use crate::config::LookoutConfig;
use crate::shopify::{ShopifyError, StorefrontClient};
use crate::wizard::{Commerce, Wizard};

/// Upper bound on concurrently held wizard sessions.
const MAX_SESSIONS: u64 = 10_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and owns the commerce client,
/// the catalog gateway and one [`Wizard`] per browser session.
pub struct AppState<P = StorefrontClient> {
    inner: Arc<AppStateInner<P>>,
}

struct AppStateInner<P> {
    platform: Arc<P>,
    catalog: CatalogGateway<P>,
    request_timeout: Duration,
    wizards: Cache<String, Arc<Wizard<P>>>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AppState<StorefrontClient> {
    /// Create the production state backed by the Shopify Storefront API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &LookoutConfig) -> Result<Self, ShopifyError> {
        let client = StorefrontClient::new(&config.shopify, config.request_timeout)?;
        Ok(Self::new(
            Arc::new(client),
            config.request_timeout,
            config.session_idle,
            config.catalog.addon_collection_id.clone(),
        ))
    }
}

impl<P: Commerce> AppState<P> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `platform` - Catalog and cart backend
    /// * `request_timeout` - Bound on every remote call
    /// * `session_idle` - Idle time after which a session's wizard is dropped
    /// * `addon_collection` - Collection tried first for add-ons
    #[must_use]
    pub fn new(
        platform: Arc<P>,
        request_timeout: Duration,
        session_idle: Duration,
        addon_collection: Option<CollectionId>,
    ) -> Self {
        let catalog = CatalogGateway::new(Arc::clone(&platform), request_timeout, addon_collection);
        let wizards = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(session_idle)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                platform,
                catalog,
                request_timeout,
                wizards,
            }),
        }
    }

    /// The wizard for a session key, starting one if none is live.
    ///
    /// Dropping an idle wizard drops its cart reconciler, which stops the
    /// reconciler's worker task.
    pub async fn wizard(&self, key: &str) -> Arc<Wizard<P>> {
        self.inner
            .wizards
            .get_with(key.to_string(), async {
                tracing::debug!(
                    session = %key,
                    live = self.session_count(),
                    "Starting wizard session"
                );
                Arc::new(Wizard::new(
                    self.inner.catalog.clone(),
                    Arc::clone(&self.inner.platform),
                    self.inner.request_timeout,
                ))
            })
            .await
    }

    /// Number of live wizard sessions (approximate).
    #[must_use]
    pub fn session_count(&self) -> u64 {
        self.inner.wizards.entry_count()
    }
}
