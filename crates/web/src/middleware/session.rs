//! Session middleware configuration.
//!
//! Sessions live in process memory; the backend session token is the only
//! durable credential, so a restart just signs everyone out.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, KeyError, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::WebConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "scorekeep_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store and a signed cookie.
///
/// # Errors
///
/// Returns an error if the session secret is too short to be a signing key.
pub fn create_session_layer(
    config: &WebConfig,
) -> Result<SessionManagerLayer<MemoryStore, SignedCookie>, KeyError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
