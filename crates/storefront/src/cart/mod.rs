//! Cart reconciler: the only writer of the remote cart.
//!
//! A [`CartReconciler`] is a cheap handle to a single worker task that owns
//! the session's cart handle and the last snapshot the platform acknowledged.
//! Every command, mutation or read, goes through one in-order queue, so a
//! `summarize()` issued after a mutation always observes it and relative
//! quantity changes are computed against the latest acknowledged state.
//!
//! ```text
//! handle ──mpsc──▶ worker ──▶ CartBackend (Shopify)
//!    ▲                │
//!    └────oneshot─────┘
//! ```

mod worker;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lookout_core::{Cart, CartHandle, CartId, CartLineId, OrderSummary, ProductId, VariantId};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::shopify::ShopifyError;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput};

use worker::{CartWorker, Command};

/// Commands buffered before senders wait.
const QUEUE_CAPACITY: usize = 64;

/// Write access to the remote cart.
pub trait CartBackend: Send + Sync + 'static {
    /// Create a cart holding the given lines (possibly none).
    fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Append lines.
    fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Set line quantities.
    fn update_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Remove lines.
    fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Fetch the live cart, `None` if it no longer exists.
    fn cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<Option<Cart>, ShopifyError>> + Send;
}

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The remote call failed or timed out. Local state is unchanged.
    #[error("Cart update failed: {0}")]
    Remote(#[from] ShopifyError),

    /// The line is not in the cart.
    #[error("Line not in cart: {0}")]
    LineNotFound(CartLineId),

    /// Quantity must be at least one.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// The operation needs a cart and none exists yet.
    #[error("No cart has been created")]
    NoCart,

    /// The platform returned no usable checkout URL.
    #[error("Checkout URL unavailable: {0}")]
    CheckoutUrl(String),

    /// The reconciler has shut down.
    #[error("Cart reconciler is no longer running")]
    Closed,
}

type Reply<T> = oneshot::Sender<Result<T, CartError>>;

/// Outcome of a mutation that was queued without waiting for it.
#[derive(Debug)]
pub struct PendingMutation<T> {
    rx: oneshot::Receiver<Result<T, CartError>>,
}

impl<T> PendingMutation<T> {
    /// Wait for the reconciler to apply (or reject) the mutation.
    ///
    /// # Errors
    ///
    /// Returns the mutation's error, or `CartError::Closed` if the
    /// reconciler stopped before replying.
    pub async fn outcome(self) -> Result<T, CartError> {
        self.rx.await.map_err(|_| CartError::Closed)?
    }
}

/// Handle to a session's cart worker.
///
/// Cloning the handle is cheap; the worker stops when the last handle drops.
#[derive(Clone, Debug)]
pub struct CartReconciler {
    tx: mpsc::Sender<Command>,
}

impl CartReconciler {
    /// Spawn a worker on the current Tokio runtime.
    ///
    /// `timeout` bounds every remote call the worker makes.
    #[must_use]
    pub fn spawn<B: CartBackend>(backend: Arc<B>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(CartWorker::new(backend, timeout).run(rx));
        Self { tx }
    }

    async fn enqueue<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> PendingMutation<T> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(make(reply)).await.is_err() {
            // Sender dropped with the command, the receiver reports Closed
            tracing::warn!("Cart reconciler closed, command dropped");
        }
        PendingMutation { rx }
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, CartError> {
        self.enqueue(make).await.outcome().await
    }

    /// The existing cart handle, creating an empty cart if there is none.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` if the cart cannot be created.
    pub async fn ensure_cart(&self) -> Result<CartHandle, CartError> {
        self.request(|reply| Command::EnsureCart { reply }).await
    }

    /// Add `quantity` of a variant, merging into an existing line for the
    /// same (product, variant).
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for zero, or `CartError::Remote`.
    pub async fn add_or_increment(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        self.enqueue_add_or_increment(product_id, variant_id, quantity)
            .await
            .outcome()
            .await
    }

    /// Queue [`add_or_increment`](Self::add_or_increment) without waiting.
    pub async fn enqueue_add_or_increment(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> PendingMutation<Cart> {
        self.enqueue(|reply| Command::AddOrIncrement {
            product_id,
            variant_id,
            quantity,
            reply,
        })
        .await
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// Returns the updated cart, or `None` if no cart exists.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` when raising a missing line, or `CartError::Remote`.
    pub async fn set_quantity(
        &self,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<Option<Cart>, CartError> {
        self.enqueue_set_quantity(line_id, quantity)
            .await
            .outcome()
            .await
    }

    /// Queue [`set_quantity`](Self::set_quantity) without waiting.
    pub async fn enqueue_set_quantity(
        &self,
        line_id: CartLineId,
        quantity: i64,
    ) -> PendingMutation<Option<Cart>> {
        self.enqueue(|reply| Command::SetQuantity {
            line_id,
            quantity,
            reply,
        })
        .await
    }

    /// Change a line's quantity by `delta`, removing it at zero.
    ///
    /// The new quantity is computed by the worker from the latest acknowledged
    /// snapshot, so rapid repeated adjustments compose.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` for a positive delta on a missing
    /// line, or `CartError::Remote`.
    pub async fn adjust_quantity(
        &self,
        line_id: CartLineId,
        delta: i64,
    ) -> Result<Option<Cart>, CartError> {
        self.enqueue_adjust_quantity(line_id, delta)
            .await
            .outcome()
            .await
    }

    /// Queue [`adjust_quantity`](Self::adjust_quantity) without waiting.
    pub async fn enqueue_adjust_quantity(
        &self,
        line_id: CartLineId,
        delta: i64,
    ) -> PendingMutation<Option<Cart>> {
        self.enqueue(|reply| Command::AdjustQuantity {
            line_id,
            delta,
            reply,
        })
        .await
    }

    /// Remove a line. Removing a line that is already gone is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` if the removal fails.
    pub async fn remove(&self, line_id: CartLineId) -> Result<Option<Cart>, CartError> {
        self.enqueue_remove(line_id).await.outcome().await
    }

    /// Queue [`remove`](Self::remove) without waiting.
    pub async fn enqueue_remove(&self, line_id: CartLineId) -> PendingMutation<Option<Cart>> {
        self.enqueue(|reply| Command::Remove { line_id, reply })
            .await
    }

    /// Re-fetch the live cart and project it. No cart gives an empty summary.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` if the cart cannot be fetched.
    pub async fn summarize(&self) -> Result<OrderSummary, CartError> {
        self.summarize_revision().await.map(|(_, summary)| summary)
    }

    /// [`summarize`](Self::summarize) tagged with a counter that grows with
    /// queue order, so callers can drop a summary older than one they hold.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Remote` if the cart cannot be fetched.
    pub async fn summarize_revision(&self) -> Result<(u64, OrderSummary), CartError> {
        self.request(|reply| Command::Summarize { reply }).await
    }

    /// Hosted checkout URL. Cached for the cart's lifetime once fetched.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCart` before the first add, or
    /// `CartError::CheckoutUrl` / `CartError::Remote` if it cannot be obtained.
    pub async fn checkout_url(&self) -> Result<Url, CartError> {
        self.request(|reply| Command::CheckoutUrl { reply }).await
    }
}
