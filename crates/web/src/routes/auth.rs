//! Authentication route handlers.
//!
//! Sign-in, sign-up and sign-out against the backend's auth API. Failures
//! redirect back to `/auth` with a toast.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use scorekeep_core::{Email, ValidationError};
use scorekeep_core::validation::{
    validate_address, validate_email, validate_form, validate_name, validate_password,
};

use super::PageChrome;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    Flashes, OptionalAuth, clear_current_user, push_flash, set_current_user,
};
use crate::models::{CurrentUser, Flash};
use crate::services::{AccountService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in / sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth.html")]
pub struct AuthTemplate {
    pub chrome: PageChrome,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the sign-in and sign-up forms.
pub async fn auth_page(OptionalAuth(user): OptionalAuth, Flashes(flashes): Flashes) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.home_path().unwrap_or("/")).into_response();
    }

    AuthTemplate {
        chrome: PageChrome::new("Sign In", "/auth", None, flashes),
    }
    .into_response()
}

/// Store the identity in the session and send the user to their dashboard.
async fn start_session(session: &Session, user: &CurrentUser) -> Response {
    if let Err(e) = set_current_user(session, user).await {
        tracing::error!(error = %e, "Failed to set session");
        push_flash(session, Flash::error("Could not start your session, please try again")).await;
        return Redirect::to("/auth").into_response();
    }

    set_sentry_user(&user.id, Some(&user.email));
    Redirect::to(user.home_path().unwrap_or("/")).into_response()
}

/// Handle sign-in form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(e) = validate_form([
        validate_email(&form.email),
        validate_password_present(&form.password),
    ]) {
        push_flash(&session, Flash::error(e.to_string())).await;
        return Redirect::to("/auth").into_response();
    }

    let password = SecretString::from(form.password);
    match AccountService::new(state.supabase())
        .sign_in(form.email.trim(), &password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = ?user.role, "Signed in");
            start_session(&session, &user).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            push_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/auth").into_response()
        }
    }
}

/// Sign-in only checks that a password was typed; the rules apply to new
/// passwords.
fn validate_password_present(password: &str) -> std::result::Result<(), ValidationError> {
    if password.is_empty() {
        Err(ValidationError::PasswordRequired)
    } else {
        Ok(())
    }
}

/// Handle sign-up form submission.
///
/// Name and address are stored as account metadata. When the backend
/// requires email confirmation no session is issued and the user is asked to
/// check their inbox.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    if let Err(e) = validate_form([
        validate_name(&form.name),
        validate_email(&form.email),
        validate_address(&form.address),
        validate_password(&form.password),
    ]) {
        push_flash(&session, Flash::error(e.to_string())).await;
        return Redirect::to("/auth").into_response();
    }

    let Ok(email) = Email::parse(&form.email) else {
        push_flash(&session, Flash::error("Please enter a valid email address")).await;
        return Redirect::to("/auth").into_response();
    };

    let account = crate::supabase::NewAccount {
        email,
        password: SecretString::from(form.password),
        name: form.name.trim().to_string(),
        address: form.address.trim().to_string(),
    };
    let redirect_to = format!("{}/", state.config().base_url.trim_end_matches('/'));

    match AccountService::new(state.supabase())
        .register(&account, Some(&redirect_to))
        .await
    {
        Ok(Registration::SignedIn(user)) => {
            tracing::info!(user_id = %user.id, "Account registered");
            push_flash(&session, Flash::success("Welcome to ScoreKeep!").titled("Account created"))
                .await;
            start_session(&session, &user).await
        }
        Ok(Registration::ConfirmationRequired) => {
            tracing::info!("Account registered, awaiting email confirmation");
            push_flash(
                &session,
                Flash::success("Please check your email to confirm your account, then sign in.")
                    .titled("Account created"),
            )
            .await;
            Redirect::to("/auth").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-up failed");
            push_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/auth").into_response()
        }
    }
}

/// Handle sign-out.
///
/// The backend session is revoked best-effort; the local session is always
/// cleared.
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Redirect> {
    if let Some(user) = user {
        if let Err(e) = state.supabase().sign_out(&user.access_token).await {
            tracing::warn!(error = %e, "Backend sign-out failed");
        }
        tracing::info!(user_id = %user.id, "Signed out");
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth"))
}
