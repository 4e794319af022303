//! HTTP route handlers for the wizard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness
//!
//! # Wizard (JSON)
//! GET  /wizard                    - Current view
//! POST /wizard/category           - {camera_type}
//! POST /wizard/tier               - {camera_level}
//! POST /wizard/product            - {product_id, variant_id | options[]}
//! POST /wizard/product/option     - {product_id, index, value}
//! POST /wizard/lines/quantity     - {line_id, delta | quantity}
//! POST /wizard/lines/remove       - {line_id}
//! POST /wizard/advance            - Continue to order summary
//! POST /wizard/retreat            - Back one step
//! POST /wizard/new-order          - Start over
//! POST /wizard/notices/dismiss    - {notice_id}
//!
//! # Checkout
//! POST /wizard/checkout           - Checkout URL (JSON)
//! GET  /wizard/checkout           - Frame-breaking handoff page (after POST)
//! ```

pub mod wizard;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;
use crate::wizard::Commerce;

/// Create the wizard routes router.
pub fn wizard_routes<P: Commerce>() -> Router<AppState<P>> {
    Router::new()
        .route("/", get(wizard::show::<P>))
        .route("/category", post(wizard::select_category::<P>))
        .route("/tier", post(wizard::select_tier::<P>))
        .route("/product", post(wizard::select_product::<P>))
        .route("/product/option", post(wizard::pick_option::<P>))
        .route("/lines/quantity", post(wizard::change_quantity::<P>))
        .route("/lines/remove", post(wizard::remove_line::<P>))
        .route("/advance", post(wizard::advance::<P>))
        .route("/retreat", post(wizard::retreat::<P>))
        .route(
            "/checkout",
            get(wizard::checkout_page::<P>).post(wizard::checkout::<P>),
        )
        .route("/new-order", post(wizard::new_order::<P>))
        .route("/notices/dismiss", post(wizard::dismiss_notice::<P>))
}

/// Create all routes for the wizard service.
pub fn routes<P: Commerce>() -> Router<AppState<P>> {
    Router::new()
        .route("/health", get(health))
        .nest("/wizard", wizard_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify.
async fn health() -> &'static str {
    "ok"
}
