//! One-shot toast messages carried across a redirect.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::models::{Flash, session_keys};

/// Queue a toast for the next rendered page.
///
/// Toasts are cosmetic: a session failure is logged and the request goes
/// on.
pub async fn push_flash(session: &Session, flash: Flash) {
    let mut pending: Vec<Flash> = session
        .get(session_keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(flash);

    if let Err(e) = session.insert(session_keys::FLASHES, pending).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take and clear pending toasts.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(session_keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Extractor that drains pending toasts from the session.
///
/// # Example
///
/// ```rust,ignore
/// async fn page(Flashes(flashes): Flashes) -> impl IntoResponse {
///     PageTemplate { flashes }
/// }
/// ```
pub struct Flashes(pub Vec<Flash>);

impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flashes = match parts.extensions.get::<Session>() {
            Some(session) => take_flashes(session).await,
            None => Vec::new(),
        };

        Ok(Self(flashes))
    }
}
