//! Selection state machine driving the ordering wizard.
//!
//! ```text
//! category-select → tier-select → product-select → addon-select → order-summary → checkout-handoff
//! ```
//!
//! Each session owns one [`Wizard`]. Its state sits behind a Tokio mutex that
//! is held only for local bookkeeping, never across a remote call. Catalog
//! lookups run as background tasks and commit only if the wizard is still at
//! the `(generation, step)` they were started for; every transition bumps the
//! generation. Cart writes go through the session's [`CartReconciler`].

mod view;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lookout_core::{
    CameraLevel, CameraType, Cart, CartLineId, OptionMatrix, OrderSummary, Product, ProductId,
    Selection, VariantId, WizardStep,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, instrument, warn};
use url::Url;

use crate::cart::{CartBackend, CartError, CartReconciler, PendingMutation};
use crate::catalog::{CatalogGateway, CatalogLookup, CatalogSource};
use crate::error::add_breadcrumb;

pub use view::{Notice, NoticeKind, OptionPicker, PendingIntent, ProductView, WizardView};

/// Errors returned by wizard gestures.
#[derive(Debug, Error)]
pub enum WizardError {
    /// The gesture is not available at the current step.
    #[error("Cannot {action} during {step}")]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },

    /// The product is not among those shown at this step.
    #[error("Product not offered here: {0}")]
    UnknownProduct(ProductId),

    /// The variant does not belong to the product.
    #[error("Variant {variant} does not belong to product {product}")]
    UnknownVariant {
        product: ProductId,
        variant: VariantId,
    },

    /// No variant matches the chosen option values.
    #[error("No variant matches the selected options")]
    NoMatchingVariant,

    /// The value is not offered at that option position.
    #[error("Option {index} cannot be set to {value:?}")]
    InvalidOption { index: usize, value: String },

    /// The product has no variants.
    #[error("Product cannot be ordered: {0}")]
    NotOrderable(ProductId),

    /// Checkout needs at least one line.
    #[error("The cart is empty")]
    EmptyCart,

    /// A cart operation failed. A notice has been recorded.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Wizard position a background result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    generation: u64,
    step: WizardStep,
}

#[derive(Debug, Clone, Copy)]
enum LookupTarget {
    Tier(CameraLevel),
    Addons,
}

/// A running catalog lookup.
///
/// Dropping it detaches the task; the result still commits if it is current.
#[derive(Debug)]
pub struct LookupTask(JoinHandle<bool>);

impl LookupTask {
    /// Wait for the lookup. Returns whether its result was applied.
    pub async fn wait(self) -> bool {
        self.0.await.unwrap_or(false)
    }
}

/// A queued add-to-cart whose outcome is still being tracked.
#[derive(Debug)]
pub struct IntentHandle {
    pub id: u64,
    task: JoinHandle<()>,
}

impl IntentHandle {
    /// Wait until the outcome has been recorded (and any failure notice raised).
    pub async fn settled(self) {
        if let Err(e) = self.task.await {
            warn!(intent_id = self.id, error = %e, "Intent watcher failed");
        }
    }
}

/// Result of selecting a product variant.
#[derive(Debug)]
pub struct ProductAdded {
    pub intent: IntentHandle,
    /// Add-on lookup started by moving on from product-select.
    pub lookup: Option<LookupTask>,
}

struct WizardState {
    selection: Selection,
    generation: u64,
    products: Vec<Product>,
    /// Option values picked per product card.
    picks: HashMap<ProductId, Vec<String>>,
    loading: bool,
    summary: Option<OrderSummary>,
    summary_revision: u64,
    notices: Vec<Notice>,
    pending: Vec<PendingIntent>,
    next_id: u64,
    cart: CartReconciler,
    /// Bumped by "new order" so late results for a discarded cart are ignored.
    cart_epoch: u64,
    checkout_url: Option<Url>,
}

impl WizardState {
    fn new(cart: CartReconciler) -> Self {
        Self {
            selection: Selection::default(),
            generation: 0,
            products: Vec::new(),
            picks: HashMap::new(),
            loading: false,
            summary: None,
            summary_revision: 0,
            notices: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
            cart,
            cart_epoch: 0,
            checkout_url: None,
        }
    }

    const fn step(&self) -> WizardStep {
        self.selection.current_step
    }

    const fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            generation: self.generation,
            step: self.selection.current_step,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn expect_step(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step() == step {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                step: self.step(),
                action,
            })
        }
    }

    fn transition(&mut self, step: WizardStep) -> Fingerprint {
        debug!(from = %self.step(), to = %step, "Wizard transition");
        self.generation += 1;
        self.selection.current_step = step;
        self.fingerprint()
    }

    /// Enter a step whose product list comes from a lookup.
    fn begin_lookup(&mut self, step: WizardStep) -> Fingerprint {
        self.products.clear();
        self.picks.clear();
        self.loading = true;
        self.transition(step)
    }

    fn commit_lookup(&mut self, fingerprint: Fingerprint, lookup: CatalogLookup) -> bool {
        if self.fingerprint() != fingerprint {
            debug!(
                step = %fingerprint.step,
                generation = fingerprint.generation,
                "Discarding stale lookup result"
            );
            return false;
        }

        self.loading = false;
        if lookup.is_unavailable() {
            self.notify(
                NoticeKind::CatalogUnavailable,
                "We couldn't load products right now. Please try again.",
            );
        }
        self.products = lookup.into_products();
        true
    }

    fn apply_summary(&mut self, epoch: u64, revision: u64, summary: OrderSummary) {
        if epoch == self.cart_epoch && revision > self.summary_revision {
            self.summary_revision = revision;
            self.summary = Some(summary);
        }
    }

    fn notify(&mut self, kind: NoticeKind, message: &str) {
        let id = self.next_id();
        self.notices.push(Notice {
            id,
            kind,
            message: message.to_string(),
            blocking: kind.is_blocking(),
        });
    }

    fn has_items(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// A commerce platform the wizard reads products from and writes carts to.
pub trait Commerce: CatalogSource + CartBackend {}

impl<T: CatalogSource + CartBackend> Commerce for T {}

/// One shopper's pass through the wizard.
pub struct Wizard<P> {
    catalog: CatalogGateway<P>,
    backend: Arc<P>,
    timeout: Duration,
    state: Arc<Mutex<WizardState>>,
}

impl<P: Commerce> Wizard<P> {
    /// Start a wizard at category-select with a fresh cart session.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(catalog: CatalogGateway<P>, backend: Arc<P>, timeout: Duration) -> Self {
        let cart = CartReconciler::spawn(Arc::clone(&backend), timeout);
        Self {
            catalog,
            backend,
            timeout,
            state: Arc::new(Mutex::new(WizardState::new(cart))),
        }
    }

    /// Choose a camera category. No network call.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidTransition` outside category-select.
    #[instrument(skip(self))]
    pub async fn select_category(&self, camera_type: CameraType) -> Result<(), WizardError> {
        {
            let mut state = self.state.lock().await;
            state.expect_step(WizardStep::CategorySelect, "choose a category")?;
            state.selection.camera_type = Some(camera_type);
            state.transition(WizardStep::TierSelect);
        }

        add_breadcrumb(
            "wizard",
            "Selected category",
            Some(&[("camera_type", camera_type.as_str())]),
        );
        Ok(())
    }

    /// Choose a tier and start loading its products.
    ///
    /// The wizard moves to product-select at once with the loading flag set.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidTransition` outside tier-select.
    #[instrument(skip(self))]
    pub async fn select_tier(&self, camera_level: CameraLevel) -> Result<LookupTask, WizardError> {
        let fingerprint = {
            let mut state = self.state.lock().await;
            state.expect_step(WizardStep::TierSelect, "choose a tier")?;
            state.selection.camera_level = Some(camera_level);
            state.begin_lookup(WizardStep::ProductSelect)
        };

        add_breadcrumb(
            "wizard",
            "Selected tier",
            Some(&[("camera_level", camera_level.as_str())]),
        );
        Ok(self.spawn_lookup(fingerprint, LookupTarget::Tier(camera_level)))
    }

    /// Variant matching the chosen option values of a listed product.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::UnknownProduct` or `WizardError::NoMatchingVariant`.
    pub async fn resolve_variant(
        &self,
        product_id: &ProductId,
        options: &[String],
    ) -> Result<VariantId, WizardError> {
        let state = self.state.lock().await;
        let product = state
            .products
            .iter()
            .find(|p| &p.id == product_id)
            .ok_or_else(|| WizardError::UnknownProduct(product_id.clone()))?;

        OptionMatrix::new(product)
            .resolve(options)
            .cloned()
            .ok_or(WizardError::NoMatchingVariant)
    }

    /// Change one option picker on a product card.
    ///
    /// Later positions reset to their first value compatible with the new
    /// choice. Returns the card's selections.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::UnknownProduct` or `WizardError::InvalidOption`.
    #[instrument(skip(self))]
    pub async fn pick_option(
        &self,
        product_id: &ProductId,
        index: usize,
        value: &str,
    ) -> Result<Vec<String>, WizardError> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .iter()
            .find(|p| &p.id == product_id)
            .ok_or_else(|| WizardError::UnknownProduct(product_id.clone()))?;

        let matrix = OptionMatrix::new(product);
        let current = state
            .picks
            .get(product_id)
            .cloned()
            .unwrap_or_else(|| matrix.initial_selections());
        if index >= matrix.option_count()
            || !matrix.values_at(index, &current).iter().any(|v| v == value)
        {
            return Err(WizardError::InvalidOption {
                index,
                value: value.to_string(),
            });
        }

        let next = matrix.select(&current, index, value);
        state.picks.insert(product_id.clone(), next.clone());
        Ok(next)
    }

    /// Add one of a variant to the cart.
    ///
    /// The add is queued and not awaited. From product-select the wizard moves
    /// on to addon-select and starts the add-on lookup; in addon-select it
    /// stays put so several add-ons can be picked. A failed add raises a notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the product or variant is not offered here.
    #[instrument(skip(self), fields(product_id = %product_id, variant_id = %variant_id))]
    pub async fn select_product_variant(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<ProductAdded, WizardError> {
        let (cart, epoch, intent_id, addon_lookup) = {
            let mut state = self.state.lock().await;
            let step = state.step();
            if !matches!(step, WizardStep::ProductSelect | WizardStep::AddonSelect) {
                return Err(WizardError::InvalidTransition {
                    step,
                    action: "add a product",
                });
            }

            let product = state
                .products
                .iter()
                .find(|p| p.id == product_id)
                .ok_or_else(|| WizardError::UnknownProduct(product_id.clone()))?;
            if !product.is_orderable() {
                return Err(WizardError::NotOrderable(product_id));
            }
            if product.variant(&variant_id).is_none() {
                return Err(WizardError::UnknownVariant {
                    product: product_id,
                    variant: variant_id,
                });
            }

            let intent_id = state.next_id();
            state.pending.push(PendingIntent {
                id: intent_id,
                product_id: product_id.clone(),
                variant_id: variant_id.clone(),
                quantity: 1,
            });
            let addon_lookup = (step == WizardStep::ProductSelect)
                .then(|| state.begin_lookup(WizardStep::AddonSelect));
            (state.cart.clone(), state.cart_epoch, intent_id, addon_lookup)
        };

        add_breadcrumb(
            "cart",
            "Added variant",
            Some(&[("variant_id", variant_id.as_str())]),
        );
        let pending = cart
            .enqueue_add_or_increment(product_id, variant_id, 1)
            .await;

        Ok(ProductAdded {
            intent: self.watch_intent(intent_id, epoch, cart, pending),
            lookup: addon_lookup.map(|fp| self.spawn_lookup(fp, LookupTarget::Addons)),
        })
    }

    /// Change a line's quantity by `delta` (the +/- controls).
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Cart` if the change or the summary refresh fails.
    #[instrument(skip(self))]
    pub async fn change_line_quantity(
        &self,
        line_id: CartLineId,
        delta: i64,
    ) -> Result<(), WizardError> {
        let (cart, epoch) = self.line_cart().await?;
        let result = cart.adjust_quantity(line_id, delta).await.map(drop);
        self.after_line_change(&cart, epoch, result).await
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Cart` if the change or the summary refresh fails.
    #[instrument(skip(self))]
    pub async fn set_line_quantity(
        &self,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<(), WizardError> {
        let (cart, epoch) = self.line_cart().await?;
        let result = cart.set_quantity(line_id, quantity).await.map(drop);
        self.after_line_change(&cart, epoch, result).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Cart` if the removal or the summary refresh fails.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, line_id: CartLineId) -> Result<(), WizardError> {
        let (cart, epoch) = self.line_cart().await?;
        let result = cart.remove(line_id).await.map(drop);
        self.after_line_change(&cart, epoch, result).await
    }

    /// Move from add-ons to the order summary, reloading the cart first.
    ///
    /// An empty add-on list never blocks.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidTransition` outside addon-select, or
    /// `WizardError::Cart` if the summary cannot be loaded (the step still changes).
    #[instrument(skip(self))]
    pub async fn advance(&self) -> Result<(), WizardError> {
        let (cart, epoch, fingerprint) = {
            let mut state = self.state.lock().await;
            state.expect_step(WizardStep::AddonSelect, "continue")?;
            state.loading = true;
            let fingerprint = state.transition(WizardStep::OrderSummary);
            (state.cart.clone(), state.cart_epoch, fingerprint)
        };

        let result = cart.summarize_revision().await;

        let mut state = self.state.lock().await;
        if state.fingerprint() != fingerprint {
            debug!("Discarding stale summary");
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok((revision, summary)) => {
                state.apply_summary(epoch, revision, summary);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load order summary");
                state.notify(
                    NoticeKind::CartUpdateFailed,
                    "We couldn't load your order summary. Please try again.",
                );
                Err(e.into())
            }
        }
    }

    /// Go back one step, resetting only what the abandoned step chose.
    ///
    /// Never touches the cart. Returning to a product list reloads it.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidTransition` at category-select.
    #[instrument(skip(self))]
    pub async fn retreat(&self) -> Result<Option<LookupTask>, WizardError> {
        let lookup = {
            let mut state = self.state.lock().await;
            let step = state.step();
            let Some(previous) = step.previous() else {
                return Err(WizardError::InvalidTransition {
                    step,
                    action: "go back",
                });
            };

            match step {
                WizardStep::TierSelect => {
                    state.selection.camera_type = None;
                    state.transition(previous);
                    None
                }
                WizardStep::ProductSelect => {
                    state.selection.camera_level = None;
                    state.products.clear();
                    state.loading = false;
                    state.transition(previous);
                    None
                }
                WizardStep::AddonSelect => match state.selection.camera_level {
                    Some(level) => Some((state.begin_lookup(previous), LookupTarget::Tier(level))),
                    None => {
                        state.transition(previous);
                        None
                    }
                },
                WizardStep::OrderSummary => {
                    Some((state.begin_lookup(previous), LookupTarget::Addons))
                }
                WizardStep::CheckoutHandoff | WizardStep::CategorySelect => {
                    state.transition(previous);
                    None
                }
            }
        };

        add_breadcrumb("wizard", "Went back", None);
        Ok(lookup.map(|(fp, target)| self.spawn_lookup(fp, target)))
    }

    /// Hand off to the hosted checkout.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::EmptyCart` without items, or `WizardError::Cart`
    /// with a blocking notice if no checkout URL can be obtained.
    #[instrument(skip(self))]
    pub async fn proceed_to_checkout(&self) -> Result<Url, WizardError> {
        let (cart, fingerprint) = {
            let state = self.state.lock().await;
            match state.step() {
                WizardStep::CheckoutHandoff => {
                    if let Some(url) = &state.checkout_url {
                        return Ok(url.clone());
                    }
                }
                WizardStep::OrderSummary => {}
                step => {
                    return Err(WizardError::InvalidTransition {
                        step,
                        action: "check out",
                    });
                }
            }
            if !state.has_items() {
                return Err(WizardError::EmptyCart);
            }
            (state.cart.clone(), state.fingerprint())
        };

        let result = cart.checkout_url().await;

        let mut state = self.state.lock().await;
        match result {
            Ok(url) => {
                state
                    .notices
                    .retain(|n| n.kind != NoticeKind::CheckoutUnavailable);
                if state.fingerprint() == fingerprint {
                    state.transition(WizardStep::CheckoutHandoff);
                    state.checkout_url = Some(url.clone());
                }
                add_breadcrumb("checkout", "Handed off to checkout", None);
                Ok(url)
            }
            Err(e) => {
                warn!(error = %e, "Checkout URL unavailable");
                state.notify(
                    NoticeKind::CheckoutUnavailable,
                    "Checkout is unavailable right now. Please try again in a moment.",
                );
                Err(e.into())
            }
        }
    }

    /// The checkout URL once the wizard has handed off. Never changes state.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::InvalidTransition` before checkout-handoff.
    pub async fn handoff_url(&self) -> Result<Url, WizardError> {
        let state = self.state.lock().await;
        match (&state.checkout_url, state.step()) {
            (Some(url), WizardStep::CheckoutHandoff) => Ok(url.clone()),
            (_, step) => Err(WizardError::InvalidTransition {
                step,
                action: "open checkout",
            }),
        }
    }

    /// Discard the selection and start a fresh cart session.
    #[instrument(skip(self))]
    pub async fn new_order(&self) {
        let cart = CartReconciler::spawn(Arc::clone(&self.backend), self.timeout);

        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        let cart_epoch = state.cart_epoch + 1;
        let next_id = state.next_id;
        *state = WizardState {
            generation,
            cart_epoch,
            next_id,
            ..WizardState::new(cart)
        };
        drop(state);

        add_breadcrumb("wizard", "Started a new order", None);
    }

    /// Remove a notice. Returns whether it existed.
    pub async fn dismiss_notice(&self, id: u64) -> bool {
        let mut state = self.state.lock().await;
        let before = state.notices.len();
        state.notices.retain(|n| n.id != id);
        state.notices.len() != before
    }

    /// Snapshot for rendering.
    pub async fn view(&self) -> WizardView {
        let state = self.state.lock().await;
        let step = state.step();

        let products = if matches!(step, WizardStep::ProductSelect | WizardStep::AddonSelect) {
            state
                .products
                .iter()
                .map(|p| {
                    ProductView::with_selections(p.clone(), state.picks.get(&p.id).map(Vec::as_slice))
                })
                .collect()
        } else {
            Vec::new()
        };

        WizardView {
            step,
            position: step.position(),
            selection: state.selection,
            products,
            loading: state.loading,
            summary: state.summary.clone(),
            notices: state.notices.clone(),
            pending: state.pending.clone(),
            can_advance: step == WizardStep::AddonSelect,
            can_checkout: step == WizardStep::OrderSummary && !state.loading && state.has_items(),
            checkout_url: state.checkout_url.as_ref().map(ToString::to_string),
        }
    }

    fn spawn_lookup(&self, fingerprint: Fingerprint, target: LookupTarget) -> LookupTask {
        let catalog = self.catalog.clone();
        let state = Arc::clone(&self.state);
        let span = tracing::debug_span!("wizard_lookup", step = %fingerprint.step);

        LookupTask(tokio::spawn(
            async move {
                let lookup = match target {
                    LookupTarget::Tier(level) => catalog.tier_products(level).await,
                    LookupTarget::Addons => catalog.addon_products().await,
                };
                state.lock().await.commit_lookup(fingerprint, lookup)
            }
            .instrument(span),
        ))
    }

    fn watch_intent(
        &self,
        id: u64,
        epoch: u64,
        cart: CartReconciler,
        pending: PendingMutation<Cart>,
    ) -> IntentHandle {
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let outcome = pending.outcome().await;

            {
                let mut state = state.lock().await;
                state.pending.retain(|intent| intent.id != id);
                if state.cart_epoch != epoch {
                    return;
                }
                if let Err(e) = outcome {
                    warn!(intent_id = id, error = %e, "Add to cart failed");
                    state.notify(
                        NoticeKind::CartUpdateFailed,
                        "We couldn't add that item to your cart. Please try again.",
                    );
                    return;
                }
            }

            // Queued behind the add, so the summary includes it
            match cart.summarize_revision().await {
                Ok((revision, summary)) => {
                    state.lock().await.apply_summary(epoch, revision, summary);
                }
                Err(e) => warn!(intent_id = id, error = %e, "Failed to refresh order summary"),
            }
        });
        IntentHandle { id, task }
    }

    async fn line_cart(&self) -> Result<(CartReconciler, u64), WizardError> {
        let state = self.state.lock().await;
        if state.step() == WizardStep::CheckoutHandoff {
            return Err(WizardError::InvalidTransition {
                step: state.step(),
                action: "change the cart",
            });
        }
        Ok((state.cart.clone(), state.cart_epoch))
    }

    async fn after_line_change(
        &self,
        cart: &CartReconciler,
        epoch: u64,
        result: Result<(), CartError>,
    ) -> Result<(), WizardError> {
        if let Err(e) = result {
            warn!(error = %e, "Cart line change failed");
            let mut state = self.state.lock().await;
            if state.cart_epoch == epoch {
                state.notify(
                    NoticeKind::CartUpdateFailed,
                    "We couldn't update your cart. Please try again.",
                );
            }
            return Err(e.into());
        }

        match cart.summarize_revision().await {
            Ok((revision, summary)) => {
                self.state
                    .lock()
                    .await
                    .apply_summary(epoch, revision, summary);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh order summary");
                let mut state = self.state.lock().await;
                if state.cart_epoch == epoch {
                    state.notify(
                        NoticeKind::CartUpdateFailed,
                        "We couldn't refresh your order summary.",
                    );
                }
                Err(e.into())
            }
        }
    }
}
