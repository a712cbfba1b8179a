//! User dashboard route handlers.
//!
//! Any signed-in account may browse stores, rate them and change its
//! password here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use scorekeep_core::validation::{validate_password, validate_rating};
use scorekeep_core::{RatingValue, StoreId};

use super::{PASSWORD_RULES_MESSAGE, PageChrome, token_rejected};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{Flashes, RequireAuth, SIGN_IN_PATH, push_flash, renew_session};
use crate::models::{CurrentUser, Flash};
use crate::services::{StoreSummary, filter_stores, summarize_stores};
use crate::state::AppState;
use crate::supabase::{NewRating, SupabaseError};

const DASHBOARD_PATH: &str = "/user";

// =============================================================================
// Query / Form Types
// =============================================================================

/// Store filter.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub q: String,
}

/// Rating form data.
#[derive(Debug, Deserialize)]
pub struct RatingForm {
    pub store_id: StoreId,
    /// Empty when nothing was selected.
    pub rating: String,
}

/// Password change form data, shared with the store owner dashboard.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

// =============================================================================
// View Types
// =============================================================================

/// One entry of the 1-5 rating select.
pub struct ScoreOption {
    pub value: u8,
    pub selected: bool,
}

/// A store row as displayed on the dashboard.
pub struct StoreRow {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    /// Average with one decimal place.
    pub average: String,
    pub rating_count: usize,
    /// The caller's score, or "Not rated".
    pub my_rating: String,
    pub rated: bool,
    pub options: Vec<ScoreOption>,
}

impl From<&StoreSummary> for StoreRow {
    fn from(store: &StoreSummary) -> Self {
        let options = RatingValue::all()
            .map(|score| ScoreOption {
                value: score.get(),
                selected: store.my_rating == Some(i16::from(score)),
            })
            .collect();

        Self {
            id: store.id,
            name: store.name.clone(),
            address: store.address.clone(),
            average: format!("{:.1}", store.average),
            rating_count: store.rating_count,
            my_rating: store
                .my_rating
                .map_or_else(|| "Not rated".to_string(), |r| r.to_string()),
            rated: store.my_rating.is_some(),
            options,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// User dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "user.html")]
pub struct UserDashboardTemplate {
    pub chrome: PageChrome,
    pub query: String,
    pub stores: Vec<StoreRow>,
    /// Stores before filtering, for the "no matches" message.
    pub total_stores: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display all stores with their averages and the caller's own rating.
///
/// A rejected token is renewed once and the load retried.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAuth(mut user): RequireAuth,
    session: Session,
    Flashes(mut flashes): Flashes,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let client = state.supabase();
    let mut loaded = client.list_stores_with_ratings(&user.access_token).await;
    if loaded.as_ref().is_err_and(SupabaseError::is_unauthorized) {
        let Some(renewed) = renew_session(&state, &session, &user).await else {
            return Redirect::to(SIGN_IN_PATH).into_response();
        };
        user = renewed;
        loaded = client.list_stores_with_ratings(&user.access_token).await;
    }

    let summaries = match loaded {
        Ok(rows) => summarize_stores(rows, Some(user.id)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load stores");
            flashes.push(Flash::error("Failed to load stores"));
            Vec::new()
        }
    };

    let stores = filter_stores(&summaries, &query.q)
        .into_iter()
        .map(StoreRow::from)
        .collect();

    UserDashboardTemplate {
        chrome: PageChrome::new("User Dashboard", DASHBOARD_PATH, Some(&user), flashes),
        query: query.q,
        stores,
        total_stores: summaries.len(),
    }
    .into_response()
}

/// Submit or change the caller's rating of a store.
///
/// One rating per user and store; a second submission replaces the first.
#[instrument(skip_all, fields(user_id = %user.id, store_id = %form.store_id))]
pub async fn submit_rating(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<RatingForm>,
) -> Response {
    let rating = match form
        .rating
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|score| validate_rating(*score).is_ok())
        .and_then(|score| RatingValue::new(score).ok())
    {
        Some(rating) => rating,
        None => {
            push_flash(&session, Flash::error("Please select a rating")).await;
            return Redirect::to(DASHBOARD_PATH).into_response();
        }
    };

    let new_rating = NewRating {
        user_id: user.id,
        store_id: form.store_id,
        rating,
    };

    match state
        .supabase()
        .upsert_rating(&user.access_token, &new_rating)
        .await
    {
        Ok(()) => {
            tracing::info!(%rating, "Rating submitted");
            let store_id = form.store_id.to_string();
            add_breadcrumb("rating", "Rated store", Some(&[("store_id", store_id.as_str())]));
            push_flash(&session, Flash::success("Rating submitted successfully")).await;
        }
        Err(e) if e.is_unauthorized() => {
            return token_rejected(&state, &session, &user, DASHBOARD_PATH).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rating submission failed");
            push_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(DASHBOARD_PATH).into_response()
}

/// Change the caller's password.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<PasswordForm>,
) -> Response {
    change_password(&state, &user, &session, form.password, DASHBOARD_PATH).await
}

/// Validate and apply a new password, then go back to `page` with a toast
/// carrying the outcome.
pub(super) async fn change_password(
    state: &AppState,
    user: &CurrentUser,
    session: &Session,
    password: String,
    page: &str,
) -> Response {
    if validate_password(&password).is_err() {
        push_flash(session, Flash::error(PASSWORD_RULES_MESSAGE)).await;
        return Redirect::to(page).into_response();
    }

    let password = SecretString::from(password);
    match state
        .supabase()
        .update_password(&user.access_token, &password)
        .await
    {
        Ok(_) => {
            tracing::info!("Password updated");
            push_flash(session, Flash::success("Password updated successfully")).await;
        }
        Err(e) if e.is_unauthorized() => {
            return token_rejected(state, session, user, page).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Password update failed");
            push_flash(session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(page).into_response()
}
