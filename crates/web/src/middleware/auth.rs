//! Authentication and role extractors.
//!
//! `RequireAuth` and `OptionalAuth` read the signed-in user from the
//! session; `RequireRole<P>` additionally checks the user's role against a
//! [`RolePolicy`].
//!
//! A backend token close to expiry is refreshed before the handler runs. If
//! the refresh is refused the visitor is signed out.

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use scorekeep_core::Role;

use super::flash::push_flash;
use crate::models::{CurrentUser, Flash, session_keys};
use crate::routes::access_denied;
use crate::services::AccountService;
use crate::state::AppState;

/// Where signed-out visitors are sent.
pub const SIGN_IN_PATH: &str = "/auth";

async fn current_user(parts: &Parts, state: &AppState) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    let user = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()?;

    if user.needs_refresh(Utc::now()) {
        return renew_session(state, session, &user).await;
    }
    Some(user)
}

/// Swap the user's backend session for a fresh one.
///
/// Call when the backend rejects the access token. On success the session
/// holds the renewed user (roles re-read). Otherwise the user is signed out,
/// a toast asks them to sign in again, and `None` is returned.
pub async fn renew_session(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
) -> Option<CurrentUser> {
    let renewed = match &user.refresh_token {
        Some(refresh_token) => AccountService::new(state.supabase())
            .refresh(refresh_token)
            .await
            .map_err(|e| e.to_string()),
        None => Err("no refresh token".to_string()),
    };

    match renewed {
        Ok(fresh) => {
            if let Err(e) = session.insert(session_keys::CURRENT_USER, &fresh).await {
                tracing::warn!(error = %e, "Failed to store refreshed session");
            }
            tracing::debug!(user_id = %fresh.id, "Backend session refreshed");
            Some(fresh)
        }
        Err(reason) => {
            tracing::info!(user_id = %user.id, %reason, "Backend session expired");
            if let Err(e) = clear_current_user(session).await {
                tracing::warn!(error = %e, "Failed to clear expired session");
            }
            push_flash(
                session,
                Flash::error("Your session has expired. Please sign in again.")
                    .titled("Session expired"),
            )
            .await;
            None
        }
    }
}

/// Extractor that requires a signed-in user.
///
/// Signed-out requests are redirected to the sign-in page.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for the auth extractors.
pub enum AuthRejection {
    /// Not signed in.
    RedirectToSignIn,
    /// Signed in, but the role does not grant access.
    AccessDenied {
        user: Box<CurrentUser>,
        path: String,
        required: &'static str,
    },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to(SIGN_IN_PATH).into_response(),
            Self::AccessDenied {
                user,
                path,
                required,
            } => {
                tracing::info!(
                    user_id = %user.id,
                    role = ?user.role,
                    %path,
                    "Access denied"
                );
                access_denied(&user, &path, required)
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts, &AppState::from_ref(state))
            .await
            .map(Self)
            .ok_or(AuthRejection::RedirectToSignIn)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this never rejects.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts, &AppState::from_ref(state)).await))
    }
}

/// Which roles may use a page.
pub trait RolePolicy {
    /// Roles granted access.
    const ALLOWED: &'static [Role];
    /// Role name shown on the access-denied page.
    const REQUIRED: &'static str;
}

/// Admins only.
pub struct AdminOnly;

impl RolePolicy for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
    const REQUIRED: &'static str = "admin";
}

/// Store owners, plus admins managing a store on their behalf.
pub struct StoreOwnerOrAdmin;

impl RolePolicy for StoreOwnerOrAdmin {
    const ALLOWED: &'static [Role] = &[Role::StoreOwner, Role::Admin];
    const REQUIRED: &'static str = "store owner";
}

/// Extractor that requires a signed-in user whose role passes `P`.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_page(RequireRole(user, _): RequireRole<AdminOnly>) -> impl IntoResponse {
///     format!("Hello admin {}!", user.display_name())
/// }
/// ```
pub struct RequireRole<P>(pub CurrentUser, pub PhantomData<P>);

impl<S, P> FromRequestParts<S> for RequireRole<P>
where
    S: Send + Sync,
    AppState: FromRef<S>,
    P: RolePolicy,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, &AppState::from_ref(state))
            .await
            .ok_or(AuthRejection::RedirectToSignIn)?;

        if !user.has_any_role(P::ALLOWED) {
            return Err(AuthRejection::AccessDenied {
                user: Box::new(user),
                path: parts.uri.path().to_string(),
                required: P::REQUIRED,
            });
        }

        Ok(Self(user, PhantomData))
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session id first so a pre-sign-in id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the session on sign-out.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await
}
