//! Store owner dashboard route handlers.
//!
//! A store owner sees their own store. Admins reach the same page to manage
//! any store and pick it with `?store_id=`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use scorekeep_core::{Role, StoreId};

use super::user::{PasswordForm, change_password};
use super::{PageChrome, access_denied};
use crate::filters;
use crate::middleware::{Flashes, RequireRole, SIGN_IN_PATH, StoreOwnerOrAdmin, renew_session};
use crate::models::{CurrentUser, Flash};
use crate::services::{OwnerStoreSummary, rater_ids, summarize_owner_store};
use crate::state::AppState;
use crate::supabase::{Store, SupabaseError};

const DASHBOARD_PATH: &str = "/store-owner";

/// Store selection for admins.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub store_id: Option<String>,
}

impl DashboardQuery {
    /// The requested store; blank or malformed ids count as no choice.
    fn store_id(&self) -> Option<StoreId> {
        self.store_id.as_deref()?.trim().parse().ok()
    }
}

/// A rating row as displayed.
pub struct RatingRow {
    pub rater: String,
    pub score: i16,
    /// `m/d/yyyy`.
    pub date: String,
}

/// An entry of the admin store picker.
pub struct StoreChoice {
    pub id: StoreId,
    pub name: String,
    pub selected: bool,
}

/// The selected store with its ratings, ready for display.
pub struct StoreView {
    pub name: String,
    pub email: String,
    pub address: String,
    pub average: String,
    pub total: usize,
    pub ratings: Vec<RatingRow>,
}

impl From<OwnerStoreSummary> for StoreView {
    fn from(summary: OwnerStoreSummary) -> Self {
        Self {
            name: summary.store.name,
            email: summary.store.email,
            address: summary.store.address,
            average: format!("{:.1}", summary.average),
            total: summary.total,
            ratings: summary
                .ratings
                .into_iter()
                .map(|entry| RatingRow {
                    rater: entry.rater,
                    score: entry.rating,
                    date: entry.created_at.format("%-m/%-d/%Y").to_string(),
                })
                .collect(),
        }
    }
}

/// Store owner dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "store_owner.html")]
pub struct StoreOwnerTemplate {
    pub chrome: PageChrome,
    pub heading: &'static str,
    pub admin_access: bool,
    pub store: Option<StoreView>,
    /// Shown when `store` is `None`.
    pub empty_message: &'static str,
    pub choices: Vec<StoreChoice>,
    pub show_password_form: bool,
}

/// Display the store's average, total and individual ratings.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireRole(mut user, _): RequireRole<StoreOwnerOrAdmin>,
    session: Session,
    Flashes(mut flashes): Flashes,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let mut loaded = load_store(&state, &user, query.store_id()).await;
    if loaded.as_ref().is_err_and(SupabaseError::is_unauthorized) {
        let Some(renewed) = renew_session(&state, &session, &user).await else {
            return Redirect::to(SIGN_IN_PATH).into_response();
        };
        user = renewed;
        loaded = load_store(&state, &user, query.store_id()).await;
    }

    // Renewal re-reads the role.
    let admin_access = user.role == Some(Role::Admin);

    let (summary, stores) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load store data");
            flashes.push(Flash::error("Failed to load store data"));
            (None, Vec::new())
        }
    };

    let selected = summary.as_ref().map(|s| s.store.id);
    let choices = stores
        .into_iter()
        .map(|store| StoreChoice {
            selected: Some(store.id) == selected,
            id: store.id,
            name: store.name,
        })
        .collect();

    let (title, heading, empty_message) = if admin_access {
        (
            "Store Owner Profile Management",
            "Store Owner Profile Management",
            "No stores are currently registered in the system.",
        )
    } else {
        (
            "Store Owner Dashboard",
            "Store Owner Dashboard",
            "You don't have a store assigned to your account.",
        )
    };

    StoreOwnerTemplate {
        chrome: PageChrome::new(title, DASHBOARD_PATH, Some(&user), flashes),
        heading,
        admin_access,
        store: summary.map(StoreView::from),
        empty_message,
        choices,
        show_password_form: user.role == Some(Role::StoreOwner),
    }
    .into_response()
}

/// Fetch the store to show and, for admins, every store for the picker.
async fn load_store(
    state: &AppState,
    user: &CurrentUser,
    requested: Option<StoreId>,
) -> Result<(Option<OwnerStoreSummary>, Vec<Store>), SupabaseError> {
    let client = state.supabase();
    let token = &user.access_token;

    let (store, stores) = if user.role == Some(Role::Admin) {
        let stores = client.list_stores(token).await?;
        let store = match requested {
            Some(id) => client.store_by_id(token, id).await?,
            None => stores.first().cloned(),
        };
        (store, stores)
    } else {
        (client.store_for_owner(token, user.id).await?, Vec::new())
    };

    let Some(store) = store else {
        return Ok((None, stores));
    };

    let ratings = client.ratings_for_store(token, store.id).await?;
    let profiles = match client.profiles_for_users(token, &rater_ids(&ratings)).await {
        Ok(profiles) => profiles,
        Err(e) => {
            tracing::warn!(store_id = %store.id, error = %e, "Rater lookup failed");
            Vec::new()
        }
    };

    Ok((Some(summarize_owner_store(store, ratings, &profiles)), stores))
}

/// Change a store owner's password.
///
/// Admins managing a store do not change passwords from this page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireRole(user, _): RequireRole<StoreOwnerOrAdmin>,
    session: Session,
    Form(form): Form<PasswordForm>,
) -> Response {
    if user.role != Some(Role::StoreOwner) {
        return access_denied(&user, DASHBOARD_PATH, "store owner");
    }

    change_password(&state, &user, &session, form.password, DASHBOARD_PATH).await
}
