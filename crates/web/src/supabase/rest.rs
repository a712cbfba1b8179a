//! Row API (`/rest/v1`): profiles, roles, stores and ratings.
//!
//! Filters use the row API's operator syntax (`column=eq.value`,
//! `column=in.(a,b)`), passed as ordinary query parameters.

use reqwest::header::CONTENT_RANGE;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use scorekeep_core::{Role, StoreId, UserId};

use super::{
    AccessToken, NewRating, NewStore, Profile, Rating, Store, StoreWithRatings, SupabaseClient,
    SupabaseError, Table, UserRoleRow,
};

const PREFER: &str = "Prefer";

/// Columns read from `profiles`.
const PROFILE_COLUMNS: &str = "user_id,name,address";

/// Store columns plus each store's ratings.
const STORE_WITH_RATINGS: &str = "*,ratings(rating,user_id)";

/// Total row count from a `Content-Range` header (`0-24/310`, `*/0`).
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

impl SupabaseClient {
    fn table_url(&self, table: Table) -> Result<Url, SupabaseError> {
        self.endpoint(&format!("rest/v1/{}", table.as_str()))
    }

    /// GET a row set.
    async fn select<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        url: Url,
    ) -> Result<Vec<T>, SupabaseError> {
        let request = Self::bearer(self.inner.http.get(url), token);
        Self::decode(request.send().await?).await
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// The profile row for one user, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn profile_for_user(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> Result<Option<Profile>, SupabaseError> {
        let mut url = self.table_url(Table::Profiles)?;
        url.query_pairs_mut()
            .append_pair("select", PROFILE_COLUMNS)
            .append_pair("user_id", &eq(user_id))
            .append_pair("limit", "1");

        let rows: Vec<Profile> = self.select(token, url).await?;
        Ok(rows.into_iter().next())
    }

    /// Profiles for a set of users in one round trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token, user_ids), fields(count = user_ids.len()))]
    pub async fn profiles_for_users(
        &self,
        token: &AccessToken,
        user_ids: &[UserId],
    ) -> Result<Vec<Profile>, SupabaseError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = user_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.table_url(Table::Profiles)?;
        url.query_pairs_mut()
            .append_pair("select", PROFILE_COLUMNS)
            .append_pair("user_id", &format!("in.({ids})"));

        self.select(token, url).await
    }

    /// Every profile, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn list_profiles(&self, token: &AccessToken) -> Result<Vec<Profile>, SupabaseError> {
        let mut url = self.table_url(Table::Profiles)?;
        url.query_pairs_mut()
            .append_pair("select", PROFILE_COLUMNS)
            .append_pair("order", "name.asc");

        self.select(token, url).await
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Roles held by one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn roles_for_user(
        &self,
        token: &AccessToken,
        user_id: UserId,
    ) -> Result<Vec<Role>, SupabaseError> {
        let mut url = self.table_url(Table::UserRoles)?;
        url.query_pairs_mut()
            .append_pair("select", "user_id,role")
            .append_pair("user_id", &eq(user_id));

        let rows: Vec<UserRoleRow> = self.select(token, url).await?;
        Ok(rows.into_iter().map(|row| row.role).collect())
    }

    /// Every role assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn list_user_roles(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<UserRoleRow>, SupabaseError> {
        let mut url = self.table_url(Table::UserRoles)?;
        url.query_pairs_mut().append_pair("select", "user_id,role");

        self.select(token, url).await
    }

    /// Set a user's role.
    ///
    /// Sign-up creates a `user` row, so this is normally an update. When no
    /// row exists yet the role is inserted instead.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails.
    #[instrument(skip(self, token))]
    pub async fn set_user_role(
        &self,
        token: &AccessToken,
        user_id: UserId,
        role: Role,
    ) -> Result<(), SupabaseError> {
        let mut url = self.table_url(Table::UserRoles)?;
        url.query_pairs_mut().append_pair("user_id", &eq(user_id));

        let request = Self::bearer(self.inner.http.patch(url), token)
            .header(PREFER, "return=representation")
            .json(&serde_json::json!({ "role": role }));
        let updated: Vec<UserRoleRow> = Self::decode(request.send().await?).await?;

        if updated.is_empty() {
            tracing::debug!(%user_id, "No role row to update, inserting");
            let url = self.table_url(Table::UserRoles)?;
            let request = Self::bearer(self.inner.http.post(url), token)
                .header(PREFER, "return=minimal")
                .json(&serde_json::json!({ "user_id": user_id, "role": role }));
            Self::check(request.send().await?).await?;
        }

        Ok(())
    }

    // =========================================================================
    // Stores
    // =========================================================================

    /// Every store with its ratings embedded, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn list_stores_with_ratings(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<StoreWithRatings>, SupabaseError> {
        let mut url = self.table_url(Table::Stores)?;
        url.query_pairs_mut()
            .append_pair("select", STORE_WITH_RATINGS)
            .append_pair("order", "name.asc");

        self.select(token, url).await
    }

    /// Every store, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn list_stores(&self, token: &AccessToken) -> Result<Vec<Store>, SupabaseError> {
        let mut url = self.table_url(Table::Stores)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "name.asc");

        self.select(token, url).await
    }

    /// The store owned by `owner_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn store_for_owner(
        &self,
        token: &AccessToken,
        owner_id: UserId,
    ) -> Result<Option<Store>, SupabaseError> {
        let mut url = self.table_url(Table::Stores)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("owner_id", &eq(owner_id))
            .append_pair("limit", "1");

        let rows: Vec<Store> = self.select(token, url).await?;
        Ok(rows.into_iter().next())
    }

    /// A store by id, if visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn store_by_id(
        &self,
        token: &AccessToken,
        store_id: StoreId,
    ) -> Result<Option<Store>, SupabaseError> {
        let mut url = self.table_url(Table::Stores)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &eq(store_id))
            .append_pair("limit", "1");

        let rows: Vec<Store> = self.select(token, url).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a store and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the row (RLS, constraint).
    #[instrument(skip(self, token))]
    pub async fn insert_store(
        &self,
        token: &AccessToken,
        store: &NewStore,
    ) -> Result<Store, SupabaseError> {
        let url = self.table_url(Table::Stores)?;
        let request = Self::bearer(self.inner.http.post(url), token)
            .header(PREFER, "return=representation")
            .json(store);

        let rows: Vec<Store> = Self::decode(request.send().await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::Parse("insert returned no store row".to_string()))
    }

    // =========================================================================
    // Ratings
    // =========================================================================

    /// Ratings for one store, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn ratings_for_store(
        &self,
        token: &AccessToken,
        store_id: StoreId,
    ) -> Result<Vec<Rating>, SupabaseError> {
        let mut url = self.table_url(Table::Ratings)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("store_id", &eq(store_id))
            .append_pair("order", "created_at.desc");

        self.select(token, url).await
    }

    /// Create or replace the caller's rating for a store.
    ///
    /// One rating per (user, store): a second submission overwrites the
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    #[instrument(skip(self, token))]
    pub async fn upsert_rating(
        &self,
        token: &AccessToken,
        rating: &NewRating,
    ) -> Result<(), SupabaseError> {
        let mut url = self.table_url(Table::Ratings)?;
        url.query_pairs_mut()
            .append_pair("on_conflict", "user_id,store_id");

        let request = Self::bearer(self.inner.http.post(url), token)
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .json(rating);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    // =========================================================================
    // Counts
    // =========================================================================

    /// Exact number of rows in `table` visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no
    /// usable `Content-Range` header.
    #[instrument(skip(self, token))]
    pub async fn count(&self, token: &AccessToken, table: Table) -> Result<u64, SupabaseError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("select", "*");

        let request = Self::bearer(self.inner.http.head(url), token).header(PREFER, "count=exact");
        let response = Self::check(request.send().await?).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                SupabaseError::Parse(format!("missing row count for {}", table.as_str()))
            })
    }
}
