//! Read-only snapshot of a wizard for the presentation layer.

use lookout_core::{
    OptionMatrix, OrderSummary, Product, ProductId, Selection, VariantId, WizardStep,
};
use serde::Serialize;

/// Everything needed to render the current step.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub step: WizardStep,
    /// One-based step number for the progress bar.
    pub position: u8,
    pub selection: Selection,
    /// Tier products in product-select, add-ons in addon-select, empty otherwise.
    pub products: Vec<ProductView>,
    pub loading: bool,
    pub summary: Option<OrderSummary>,
    pub notices: Vec<Notice>,
    pub pending: Vec<PendingIntent>,
    pub can_advance: bool,
    pub can_checkout: bool,
    pub checkout_url: Option<String>,
}

/// A product card with its option pickers.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// False when the product has no variants; add-to-cart must be disabled.
    pub orderable: bool,
    pub options: Vec<OptionPicker>,
    pub selected_options: Vec<String>,
    /// Variant preselected by the card.
    pub selected_variant_id: Option<VariantId>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self::with_selections(product, None)
    }

    /// Card with the shopper's picks, or the first variant's options.
    #[must_use]
    pub fn with_selections(product: Product, picked: Option<&[String]>) -> Self {
        let matrix = OptionMatrix::new(&product);
        let selected_options =
            picked.map_or_else(|| matrix.initial_selections(), <[String]>::to_vec);
        let options = (0..matrix.option_count())
            .map(|index| OptionPicker {
                index,
                values: matrix.values_at(index, &selected_options),
            })
            .collect();
        let selected_variant_id = match picked {
            Some(_) => matrix.resolve(&selected_options).cloned(),
            None => matrix
                .resolve(&selected_options)
                .cloned()
                .or_else(|| product.default_variant().map(|v| v.id.clone())),
        };

        Self {
            orderable: product.is_orderable(),
            product,
            options,
            selected_options,
            selected_variant_id,
        }
    }
}

/// Values offered at one option position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionPicker {
    pub index: usize,
    pub values: Vec<String>,
}

/// What a notice is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
    CatalogUnavailable,
    CartUpdateFailed,
    CheckoutUnavailable,
}

impl NoticeKind {
    /// Blocking notices stop the shopper from finishing the current step.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::CheckoutUnavailable)
    }
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub blocking: bool,
}

/// A cart change that has been queued but not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingIntent {
    pub id: u64,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
}
