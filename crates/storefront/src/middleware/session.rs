//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session only carries
//! a random wizard key; the wizard itself lives in [`AppState`].

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::config::LookoutConfig;
use crate::error::AppError;
use crate::state::AppState;
use crate::wizard::{Commerce, Wizard};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "lookout_session";

/// Session key holding the wizard key.
pub const WIZARD_KEY: &str = "wizard_key";

/// Create the session layer with an in-memory store.
///
/// Cookies expire after the same idle period as wizard sessions.
#[must_use]
pub fn create_session_layer(config: &LookoutConfig) -> SessionManagerLayer<MemoryStore> {
    let idle_seconds = i64::try_from(config.session_idle.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(idle_seconds),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Extractor for the current session's wizard.
///
/// Assigns a wizard key to the session on first use.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentWizard(wizard): CurrentWizard) -> Json<WizardView> {
///     Json(wizard.view().await)
/// }
/// ```
pub struct CurrentWizard<P = crate::shopify::StorefrontClient>(pub Arc<Wizard<P>>);

impl<P: Commerce> FromRequestParts<AppState<P>> for CurrentWizard<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P>,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let key = if let Some(key) = session.get::<String>(WIZARD_KEY).await? {
            key
        } else {
            let key = Uuid::new_v4().to_string();
            session.insert(WIZARD_KEY, &key).await?;
            key
        };

        Ok(Self(state.wizard(&key).await))
    }
}
