//! Admin dashboard route handlers.
//!
//! Platform totals, the user and store directories with their filters, and
//! the forms that create users and stores.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use futures::future::join_all;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use scorekeep_core::validation::{
    validate_address, validate_email, validate_form, validate_name, validate_password,
    validate_role, validate_store_name,
};
use scorekeep_core::{Email, Role, UserId};

use super::{PageChrome, token_rejected};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{AdminOnly, Flashes, RequireRole, SIGN_IN_PATH, push_flash, renew_session};
use crate::models::Flash;
use crate::services::{
    AccountService, RoleFilter, StoreSummary, UserEntry, build_user_directory, filter_stores,
    filter_users, summarize_stores,
};
use crate::state::AppState;
use crate::supabase::{AccessToken, NewAccount, NewStore, Profile, SupabaseClient, SupabaseError, Table};

const DASHBOARD_PATH: &str = "/admin";

// =============================================================================
// Query / Form Types
// =============================================================================

/// Table filters.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub user_q: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub store_q: String,
}

/// Create-user form data.
#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub role: String,
}

/// Create-store form data.
#[derive(Debug, Deserialize)]
pub struct CreateStoreForm {
    pub name: String,
    pub email: String,
    pub address: String,
    /// Blank for a store without an owner.
    #[serde(default)]
    pub owner_id: String,
}

// =============================================================================
// View Types
// =============================================================================

/// Platform totals.
#[derive(Debug, Default, Clone, Copy)]
pub struct Totals {
    pub users: u64,
    pub stores: u64,
    pub ratings: u64,
}

/// A row of the users table.
pub struct UserRow {
    pub name: String,
    pub email: String,
    pub address: String,
    /// Role labels, most privileged first.
    pub roles: String,
}

impl From<&UserEntry> for UserRow {
    fn from(entry: &UserEntry) -> Self {
        let roles = if entry.roles.is_empty() {
            "none".to_string()
        } else {
            entry
                .roles
                .iter()
                .map(|role| role.label())
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            name: entry.name.clone(),
            email: entry.email.clone(),
            address: entry.address.clone(),
            roles,
        }
    }
}

/// A row of the stores table.
pub struct StoreRow {
    pub name: String,
    pub email: String,
    pub address: String,
    pub average: String,
}

impl From<&StoreSummary> for StoreRow {
    fn from(store: &StoreSummary) -> Self {
        Self {
            name: store.name.clone(),
            email: store.email.clone(),
            address: store.address.clone(),
            average: format!("{:.1}", store.average),
        }
    }
}

/// An option of a `<select>`.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn role_filter_options(current: RoleFilter) -> Vec<SelectOption> {
    std::iter::once(RoleFilter::All)
        .chain(Role::ALL.into_iter().map(RoleFilter::Only))
        .map(|filter| SelectOption {
            value: filter.as_str().to_string(),
            label: match filter {
                RoleFilter::All => "All roles".to_string(),
                RoleFilter::Only(role) => role.label().to_string(),
            },
            selected: filter == current,
        })
        .collect()
}

fn role_options() -> Vec<SelectOption> {
    Role::ALL
        .into_iter()
        .map(|role| SelectOption {
            value: role.as_str().to_string(),
            label: role.label().to_string(),
            selected: role == Role::User,
        })
        .collect()
}

/// Accounts holding the store owner role, for the create-store form.
fn owner_options(users: &[UserEntry]) -> Vec<SelectOption> {
    users
        .iter()
        .filter(|u| u.roles.contains(&Role::StoreOwner))
        .map(|u| SelectOption {
            value: u.id.to_string(),
            label: u.name.clone(),
            selected: false,
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminDashboardTemplate {
    pub chrome: PageChrome,
    pub totals: Totals,
    pub user_q: String,
    pub store_q: String,
    pub role_filters: Vec<SelectOption>,
    pub users: Vec<UserRow>,
    pub stores: Vec<StoreRow>,
    pub roles: Vec<SelectOption>,
    pub owners: Vec<SelectOption>,
    /// Emails need the service-role key.
    pub emails_available: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Everything the dashboard shows, before filtering.
#[derive(Default)]
struct DashboardData {
    totals: Totals,
    users: Vec<UserEntry>,
    stores: Vec<StoreSummary>,
}

/// Display totals, users and stores.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireRole(mut user, _): RequireRole<AdminOnly>,
    session: Session,
    Flashes(mut flashes): Flashes,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let mut loaded = load_dashboard(state.supabase(), &user.access_token).await;
    if loaded.as_ref().is_err_and(SupabaseError::is_unauthorized) {
        let Some(renewed) = renew_session(&state, &session, &user).await else {
            return Redirect::to(SIGN_IN_PATH).into_response();
        };
        user = renewed;
        loaded = load_dashboard(state.supabase(), &user.access_token).await;
    }

    let data = match loaded {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load dashboard data");
            flashes.push(Flash::error("Failed to load dashboard data"));
            DashboardData::default()
        }
    };

    let role_filter = query.role.parse::<RoleFilter>().unwrap_or_default();

    AdminDashboardTemplate {
        chrome: PageChrome::new("Admin Dashboard", DASHBOARD_PATH, Some(&user), flashes),
        totals: data.totals,
        role_filters: role_filter_options(role_filter),
        users: filter_users(&data.users, &query.user_q, role_filter)
            .into_iter()
            .map(UserRow::from)
            .collect(),
        stores: filter_stores(&data.stores, &query.store_q)
            .into_iter()
            .map(StoreRow::from)
            .collect(),
        roles: role_options(),
        owners: owner_options(&data.users),
        emails_available: state.supabase().has_service_role(),
        user_q: query.user_q,
        store_q: query.store_q,
    }
    .into_response()
}

async fn load_dashboard(
    client: &SupabaseClient,
    token: &AccessToken,
) -> Result<DashboardData, SupabaseError> {
    let (users, stores, ratings, profiles, role_rows, store_rows) = tokio::try_join!(
        client.count(token, Table::Profiles),
        client.count(token, Table::Stores),
        client.count(token, Table::Ratings),
        client.list_profiles(token),
        client.list_user_roles(token),
        client.list_stores_with_ratings(token),
    )?;

    let emails = lookup_emails(client, &profiles).await;

    Ok(DashboardData {
        totals: Totals {
            users,
            stores,
            ratings,
        },
        users: build_user_directory(profiles, &role_rows, &emails),
        stores: summarize_stores(store_rows, None),
    })
}

/// Look up every account's email concurrently. Failed lookups are left out.
async fn lookup_emails(client: &SupabaseClient, profiles: &[Profile]) -> HashMap<UserId, String> {
    if !client.has_service_role() {
        return HashMap::new();
    }

    let lookups = profiles.iter().map(|profile| async move {
        (profile.user_id, client.admin_get_user(profile.user_id).await)
    });

    join_all(lookups)
        .await
        .into_iter()
        .filter_map(|(user_id, result)| match result {
            Ok(user) => user.email.map(|email| (user_id, email)),
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Email lookup failed");
                None
            }
        })
        .collect()
}

/// Create an account with the chosen role.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireRole(user, _): RequireRole<AdminOnly>,
    session: Session,
    Form(form): Form<CreateUserForm>,
) -> Response {
    if let Err(e) = validate_form([
        validate_name(&form.name),
        validate_email(&form.email),
        validate_address(&form.address),
        validate_password(&form.password),
        validate_role(&form.role),
    ]) {
        push_flash(&session, Flash::error(e.to_string())).await;
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let (Ok(email), Ok(role)) = (Email::parse(&form.email), form.role.parse::<Role>()) else {
        push_flash(&session, Flash::error("Please check the form and try again")).await;
        return Redirect::to(DASHBOARD_PATH).into_response();
    };

    let account = NewAccount {
        email,
        password: SecretString::from(form.password),
        name: form.name.trim().to_string(),
        address: form.address.trim().to_string(),
    };

    match AccountService::new(state.supabase())
        .create_user(&user.access_token, &account, role)
        .await
    {
        Ok(new_id) => {
            let new_id = new_id.to_string();
            add_breadcrumb(
                "admin",
                "Created user",
                Some(&[("user_id", new_id.as_str()), ("role", role.as_str())]),
            );
            push_flash(&session, Flash::success("User created successfully")).await;
        }
        Err(e) if e.is_unauthorized() => {
            return token_rejected(&state, &session, &user, DASHBOARD_PATH).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "User creation failed");
            push_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(DASHBOARD_PATH).into_response()
}

/// Create a store, optionally assigned to an owner.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_store(
    State(state): State<AppState>,
    RequireRole(user, _): RequireRole<AdminOnly>,
    session: Session,
    Form(form): Form<CreateStoreForm>,
) -> Response {
    if let Err(e) = validate_form([
        validate_store_name(&form.name),
        validate_email(&form.email),
        validate_address(&form.address),
    ]) {
        push_flash(&session, Flash::error(e.to_string())).await;
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let owner_id = match form.owner_id.trim() {
        "" => None,
        raw => match raw.parse::<UserId>() {
            Ok(id) => Some(id),
            Err(_) => {
                push_flash(&session, Flash::error("Invalid store owner selected")).await;
                return Redirect::to(DASHBOARD_PATH).into_response();
            }
        },
    };

    let store = NewStore {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        address: form.address.trim().to_string(),
        owner_id,
    };

    match state.supabase().insert_store(&user.access_token, &store).await {
        Ok(store) => {
            tracing::info!(store_id = %store.id, "Store created");
            push_flash(&session, Flash::success("Store created successfully")).await;
        }
        Err(e) if e.is_unauthorized() => {
            return token_rejected(&state, &session, &user, DASHBOARD_PATH).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Store creation failed");
            push_flash(&session, Flash::error(e.user_message())).await;
        }
    }

    Redirect::to(DASHBOARD_PATH).into_response()
}
