//! Wizard route handlers.
//!
//! Every action delegates to the session's [`Wizard`](crate::wizard::Wizard)
//! and answers with the fresh [`WizardView`]. Lookups started by an action run
//! in the background; clients poll `GET /wizard` while `loading` is set.

use askama::Template;
use askama_web::WebTemplate;
use axum::Json;
use lookout_core::{CameraLevel, CameraType, CartLineId, ProductId, VariantId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::CurrentWizard;
use crate::wizard::{Commerce, WizardView};

/// Category choice.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub camera_type: CameraType,
}

/// Tier choice.
#[derive(Debug, Deserialize)]
pub struct TierRequest {
    pub camera_level: CameraLevel,
}

/// Product choice, by variant ID or by option values.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub options: Vec<String>,
}

/// One option picker changed on a product card.
#[derive(Debug, Deserialize)]
pub struct OptionRequest {
    pub product_id: ProductId,
    pub index: usize,
    pub value: String,
}

/// Quantity change: exactly one of `delta` or `quantity`.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub line_id: CartLineId,
    pub delta: Option<i64>,
    pub quantity: Option<i64>,
}

/// Line removal.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub line_id: CartLineId,
}

/// Notice dismissal.
#[derive(Debug, Deserialize)]
pub struct DismissRequest {
    pub notice_id: u64,
}

/// Checkout handoff URL.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

/// Page that sends the top-level window to the hosted checkout.
#[derive(Template, WebTemplate)]
#[template(path = "checkout_handoff.html")]
pub struct CheckoutHandoffTemplate {
    pub checkout_url: String,
}

/// Current wizard view.
#[instrument(skip(wizard))]
pub async fn show<P: Commerce>(CurrentWizard(wizard): CurrentWizard<P>) -> Json<WizardView> {
    Json(wizard.view().await)
}

/// Choose a camera category.
#[instrument(skip(wizard))]
pub async fn select_category<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<WizardView>> {
    wizard.select_category(request.camera_type).await?;
    Ok(Json(wizard.view().await))
}

/// Choose a tier; products load in the background.
#[instrument(skip(wizard))]
pub async fn select_tier<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
    Json(request): Json<TierRequest>,
) -> Result<Json<WizardView>> {
    // The lookup commits on its own; the view reports loading until then
    drop(wizard.select_tier(request.camera_level).await?);
    Ok(Json(wizard.view().await))
}

/// Add a product (or add-on) to the cart.
#[instrument(skip(wizard))]
pub async fn select_product<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<WizardView>> {
    let variant_id = match request.variant_id {
        Some(variant_id) => variant_id,
        None if !request.options.is_empty() => {
            wizard
                .resolve_variant(&request.product_id, &request.options)
                .await?
        }
        None => {
            return Err(AppError::BadRequest(
                "variant_id or options is required".to_string(),
            ));
        }
    };

    drop(
        wizard
            .select_product_variant(request.product_id, variant_id)
            .await?,
    );
    Ok(Json(wizard.view().await))
}

/// Change an option picker; later pickers reset to compatible values.
#[instrument(skip(wizard))]
pub async fn pick_option<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
    Json(request): Json<OptionRequest>,
) -> Result<Json<WizardView>> {
    wizard
        .pick_option(&request.product_id, request.index, &request.value)
        .await?;
    Ok(Json(wizard.view().await))
}

/// Change a line's quantity.
#[instrument(skip(wizard))]
pub async fn change_quantity<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<WizardView>> {
    match (request.delta, request.quantity) {
        (Some(delta), None) => wizard.change_line_quantity(request.line_id, delta).await?,
        (None, Some(quantity)) => wizard.set_line_quantity(request.line_id, quantity).await?,
        _ => {
            return Err(AppError::BadRequest(
                "exactly one of delta or quantity is required".to_string(),
            ));
        }
    }
    Ok(Json(wizard.view().await))
}

/// Remove a line.
#[instrument(skip(wizard))]
pub async fn remove_line<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
    Json(request): Json<LineRequest>,
) -> Result<Json<WizardView>> {
    wizard.remove_line(request.line_id).await?;
    Ok(Json(wizard.view().await))
}

/// Continue from add-ons to the order summary.
#[instrument(skip(wizard))]
pub async fn advance<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
) -> Result<Json<WizardView>> {
    wizard.advance().await?;
    Ok(Json(wizard.view().await))
}

/// Go back one step.
#[instrument(skip(wizard))]
pub async fn retreat<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
) -> Result<Json<WizardView>> {
    drop(wizard.retreat().await?);
    Ok(Json(wizard.view().await))
}

/// Proceed to checkout, returning the hosted checkout URL.
#[instrument(skip(wizard))]
pub async fn checkout<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
) -> Result<Json<CheckoutResponse>> {
    let url = wizard.proceed_to_checkout().await?;
    Ok(Json(CheckoutResponse {
        checkout_url: url.into(),
    }))
}

/// Frame-breaking handoff page, once `POST /wizard/checkout` has handed off.
#[instrument(skip(wizard))]
pub async fn checkout_page<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
) -> Result<CheckoutHandoffTemplate> {
    let url = wizard.handoff_url().await?;
    Ok(CheckoutHandoffTemplate {
        checkout_url: url.into(),
    })
}

/// Start over with a fresh cart.
#[instrument(skip(wizard))]
pub async fn new_order<P: Commerce>(CurrentWizard(wizard): CurrentWizard<P>) -> Json<WizardView> {
    wizard.new_order().await;
    Json(wizard.view().await)
}

/// Dismiss a notice.
#[instrument(skip(wizard))]
pub async fn dismiss_notice<P: Commerce>(
    CurrentWizard(wizard): CurrentWizard<P>,
    Json(request): Json<DismissRequest>,
) -> Result<Json<WizardView>> {
    if !wizard.dismiss_notice(request.notice_id).await {
        return Err(AppError::NotFound(format!("notice {}", request.notice_id)));
    }
    Ok(Json(wizard.view().await))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore as SessionStore, SessionManagerLayer};

    use crate::routes::routes;
    use crate::state::AppState;
    use crate::test_support::{MemoryStore, product};

    fn app() -> Router {
        let store = MemoryStore::default().collection(
            1,
            "entry-level",
            "Entry Level",
            vec![product(1, &[(10, "Black / 1080p", "49.00")])],
        );
        let state = AppState::new(
            Arc::new(store),
            Duration::from_secs(1),
            Duration::from_secs(60),
            None,
        );
        routes()
            .layer(SessionManagerLayer::new(SessionStore::default()).with_secure(false))
            .with_state(state)
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, set_cookie, json)
    }

    #[tokio::test]
    async fn test_wizard_flow_over_http() {
        let app = app();
        let (status, cookie, view) = call(&app, "GET", "/wizard", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "category-select");
        let cookie = cookie.unwrap();

        let (status, _, view) = call(
            &app,
            "POST",
            "/wizard/category",
            Some(&cookie),
            Some(json!({ "camera_type": "residential" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "tier-select");
        assert_eq!(view["selection"]["camera_type"], "residential");

        let (status, _, view) = call(
            &app,
            "POST",
            "/wizard/tier",
            Some(&cookie),
            Some(json!({ "camera_level": "entry" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "product-select");

        // Products arrive in the background
        let mut products = Value::Null;
        for _ in 0..50 {
            let (_, _, view) = call(&app, "GET", "/wizard", Some(&cookie), None).await;
            if view["loading"] == false {
                products = view["products"].clone();
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(products.as_array().unwrap().len(), 1);
        assert_eq!(products[0]["orderable"], true);

        let (status, _, view) = call(
            &app,
            "POST",
            "/wizard/product",
            Some(&cookie),
            Some(json!({
                "product_id": "gid://shopify/Product/1",
                "options": ["Black", "1080p"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], "addon-select");
    }

    #[tokio::test]
    async fn test_invalid_gesture_is_conflict() {
        let app = app();
        let (status, _, body) = call(
            &app,
            "POST",
            "/wizard/tier",
            None,
            Some(json!({ "camera_level": "high" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("category-select"));
    }

    #[tokio::test]
    async fn test_checkout_page_does_not_check_out() {
        let app = app();
        let (_, cookie, _) = call(&app, "GET", "/wizard", None, None).await;
        let cookie = cookie.unwrap();

        let (status, _, _) = call(&app, "GET", "/wizard/checkout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, _, view) = call(&app, "GET", "/wizard", Some(&cookie), None).await;
        assert_eq!(view["step"], "category-select");
    }

    #[tokio::test]
    async fn test_pick_option_over_http() {
        let app = app();
        let (_, cookie, _) = call(&app, "GET", "/wizard", None, None).await;
        let cookie = cookie.unwrap();
        call(
            &app,
            "POST",
            "/wizard/category",
            Some(&cookie),
            Some(json!({ "camera_type": "rural" })),
        )
        .await;
        call(
            &app,
            "POST",
            "/wizard/tier",
            Some(&cookie),
            Some(json!({ "camera_level": "entry" })),
        )
        .await;
        for _ in 0..50 {
            let (_, _, view) = call(&app, "GET", "/wizard", Some(&cookie), None).await;
            if view["loading"] == false {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (status, _, view) = call(
            &app,
            "POST",
            "/wizard/product/option",
            Some(&cookie),
            Some(json!({ "product_id": "gid://shopify/Product/1", "index": 1, "value": "1080p" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["products"][0]["selected_options"], json!(["Black", "1080p"]));

        let (status, _, _) = call(
            &app,
            "POST",
            "/wizard/product/option",
            Some(&cookie),
            Some(json!({ "product_id": "gid://shopify/Product/1", "index": 0, "value": "Red" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_quantity_requires_one_field() {
        let app = app();
        let (status, _, _) = call(
            &app,
            "POST",
            "/wizard/lines/quantity",
            None,
            Some(json!({ "line_id": "gid://shopify/CartLine/1", "delta": 1, "quantity": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
