//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cart::CartError;
use crate::shopify::ShopifyError;
use crate::wizard::WizardError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// A wizard gesture was rejected or its cart call failed.
    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::Wizard(err) => match err {
                WizardError::InvalidTransition { .. } | WizardError::EmptyCart => {
                    StatusCode::CONFLICT
                }
                WizardError::UnknownProduct(_)
                | WizardError::UnknownVariant { .. }
                | WizardError::NoMatchingVariant
                | WizardError::InvalidOption { .. }
                | WizardError::NotOrderable(_) => StatusCode::UNPROCESSABLE_ENTITY,
                WizardError::Cart(cart) => match cart {
                    CartError::LineNotFound(_) => StatusCode::NOT_FOUND,
                    CartError::InvalidQuantity => StatusCode::UNPROCESSABLE_ENTITY,
                    CartError::NoCart => StatusCode::CONFLICT,
                    CartError::Remote(ShopifyError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
                    CartError::Remote(_) | CartError::CheckoutUrl(_) => StatusCode::BAD_GATEWAY,
                    CartError::Closed => StatusCode::INTERNAL_SERVER_ERROR,
                },
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the shopper.
    fn public_message(&self) -> String {
        match self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(_) => "External service error".to_string(),
            Self::Wizard(WizardError::Cart(err)) => match err {
                CartError::Remote(_) => "We couldn't update your cart. Please try again.".to_string(),
                CartError::CheckoutUrl(_) => {
                    "Checkout is unavailable right now. Please try again in a moment.".to_string()
                }
                CartError::Closed => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Wizard(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of wizard
/// steps leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("wizard", "Selected tier", Some(&[("camera_level", "mid")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
