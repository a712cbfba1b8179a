//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                      - Home (signed-in users go to their dashboard)
//! GET  /health                - Liveness
//! GET  /health/ready          - Readiness (backend reachable)
//!
//! # Auth
//! GET  /auth                  - Sign-in and sign-up forms
//! POST /auth/login            - Password sign-in
//! POST /auth/signup           - Account registration
//! POST /auth/logout           - Sign out
//!
//! # User dashboard (any signed-in account)
//! GET  /user                  - Stores with averages and own rating (?q=)
//! POST /user/ratings          - Submit or change a rating
//! POST /user/password         - Change password
//!
//! # Store owner dashboard (store_owner, admin)
//! GET  /store-owner           - Own store's ratings (?store_id= for admins)
//! POST /store-owner/password  - Change password
//!
//! # Admin dashboard (admin)
//! GET  /admin                 - Totals, users, stores (?user_q=, ?role=, ?store_q=)
//! POST /admin/users           - Create a user with a role
//! POST /admin/stores          - Create a store
//! ```

pub mod access;
pub mod admin;
pub mod auth;
pub mod health;
pub mod home;
pub mod store_owner;
pub mod user;

pub use access::access_denied;

use axum::{
    Router,
    http::Uri,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::{SIGN_IN_PATH, auth_rate_limiter, push_flash, renew_session};
use crate::models::{CurrentUser, Flash};
use crate::services::{NavLink, nav_links};
use crate::state::AppState;

/// Toast shown when a new password breaks the rules.
pub const PASSWORD_RULES_MESSAGE: &str =
    "Password must be 8-16 characters with 1 uppercase and 1 special character";

/// Shared layout data: title, navigation, signed-in badge and toasts.
pub struct PageChrome {
    pub title: String,
    pub nav: Vec<NavLink>,
    /// Header badge, `None` for visitors.
    pub user_name: Option<String>,
    /// Role shown next to the name ("store owner"), if any.
    pub role_label: Option<&'static str>,
    pub flashes: Vec<Flash>,
}

impl PageChrome {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        path: &str,
        user: Option<&CurrentUser>,
        flashes: Vec<Flash>,
    ) -> Self {
        Self {
            title: title.into(),
            nav: nav_links(user, path),
            user_name: user.map(|u| u.display_name().to_string()),
            role_label: user.and_then(|u| u.role).map(|role| role.label()),
            flashes,
        }
    }
}

/// Response to a form post whose backend token was rejected.
///
/// The post is not replayed: with a renewed session the user goes back to
/// `page` to submit again, otherwise to the sign-in page.
pub(crate) async fn token_rejected(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    page: &str,
) -> Response {
    if renew_session(state, session, user).await.is_some() {
        push_flash(
            session,
            Flash::error("Your session was refreshed. Please try again.").titled("Session refreshed"),
        )
        .await;
        Redirect::to(page).into_response()
    } else {
        Redirect::to(SIGN_IN_PATH).into_response()
    }
}

/// Create the auth routes router.
///
/// Credential posts sit behind the auth rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/", get(auth::auth_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the user dashboard router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(user::dashboard))
        .route("/ratings", post(user::submit_rating))
        .route("/password", post(user::update_password))
}

/// Create the store owner dashboard router.
pub fn store_owner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(store_owner::dashboard))
        .route("/password", post(store_owner::update_password))
}

/// Create the admin dashboard router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/users", post(admin::create_user))
        .route("/stores", post(admin::create_store))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/user", user_routes())
        .nest("/store-owner", store_owner_routes())
        .nest("/admin", admin_routes())
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
