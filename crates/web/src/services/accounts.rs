//! Account flows that span several backend calls.
//!
//! Sign-in resolves the session into a [`CurrentUser`] (role and display
//! name included), and so does every token refresh, which keeps role changes
//! from going stale. Admin user creation provisions the account and then
//! sets its role.

use chrono::{TimeDelta, Utc};
use secrecy::SecretString;
use tracing::instrument;

use scorekeep_core::{Role, UserId};

use crate::models::CurrentUser;
use crate::supabase::{
    AccessToken, AuthSession, NewAccount, RefreshToken, SignUpOutcome, SupabaseClient,
    SupabaseError,
};

/// Result of a self-service sign-up.
#[derive(Debug)]
pub enum Registration {
    /// The backend issued a session straight away.
    SignedIn(CurrentUser),
    /// The account exists but the email must be confirmed first.
    ConfirmationRequired,
}

/// Account service over the backend client.
pub struct AccountService<'a> {
    client: &'a SupabaseClient,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the role lookup
    /// fails.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, SupabaseError> {
        let session = self.client.sign_in_with_password(email, password).await?;
        self.resolve(session).await
    }

    /// Replace an expiring session.
    ///
    /// Roles and the display name are looked up again with the new token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is rejected or the role lookup
    /// fails.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &RefreshToken) -> Result<CurrentUser, SupabaseError> {
        let session = self.client.refresh_session(refresh_token).await?;
        self.resolve(session).await
    }

    /// Self-service sign-up.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the account.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(
        &self,
        account: &NewAccount,
        redirect_to: Option<&str>,
    ) -> Result<Registration, SupabaseError> {
        match self.client.sign_up(account, redirect_to).await? {
            SignUpOutcome::SignedIn(session) => {
                Ok(Registration::SignedIn(self.resolve(session).await?))
            }
            SignUpOutcome::ConfirmationRequired(_) => Ok(Registration::ConfirmationRequired),
        }
    }

    /// Create an account on behalf of an admin and give it `role`.
    ///
    /// With the service-role key the account is created pre-confirmed.
    /// Without it the public sign-up endpoint is used; the new session is
    /// discarded, so the admin stays signed in as themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be created or its role cannot
    /// be set.
    #[instrument(skip(self, admin_token, account), fields(email = %account.email))]
    pub async fn create_user(
        &self,
        admin_token: &AccessToken,
        account: &NewAccount,
        role: Role,
    ) -> Result<UserId, SupabaseError> {
        let user_id = if self.client.has_service_role() {
            self.client.admin_create_user(account).await?.id
        } else {
            tracing::info!("No service role key, creating account through sign-up");
            self.client.sign_up(account, None).await?.user().id
        };

        self.client.set_user_role(admin_token, user_id, role).await?;
        tracing::info!(%user_id, %role, "Account created");
        Ok(user_id)
    }

    /// Turn a fresh session into the identity kept in the cookie session.
    async fn resolve(&self, session: AuthSession) -> Result<CurrentUser, SupabaseError> {
        let token = session.access_token;
        let user = session.user;
        let expires_at = session
            .expires_in
            .map(|secs| Utc::now() + TimeDelta::seconds(secs));

        let roles = self.client.roles_for_user(&token, user.id).await?;

        let name = match self.client.profile_for_user(&token, user.id).await {
            Ok(profile) => profile.map(|p| p.name),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Profile lookup failed");
                None
            }
        }
        .or(user.user_metadata.name);

        Ok(CurrentUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name,
            role: Role::effective(roles),
            access_token: token,
            refresh_token: session.refresh_token,
            expires_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use scorekeep_core::Email;

    use super::*;
    use crate::supabase::test_support::client_for;

    const USER_ID: &str = "8d0e3c47-0b3d-4a8e-9d55-6c0f4f1f9b11";

    fn account() -> NewAccount {
        NewAccount {
            email: Email::parse("newcomer@example.com").unwrap(),
            password: SecretString::from("Str0ng!Pass"),
            name: "A Brand New Store Owner".to_string(),
            address: "3 Station Road".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_resolves_highest_role_and_name() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/token");
            then.status(200).json_body(json!({
                "access_token": "user-token",
                "user": { "id": USER_ID, "email": "owner@example.com" }
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/user_roles")
                .header("authorization", "Bearer user-token");
            then.status(200).json_body(json!([
                { "user_id": USER_ID, "role": "user" },
                { "user_id": USER_ID, "role": "store_owner" }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(200)
                .json_body(json!([{ "user_id": USER_ID, "name": "Owner Of The Corner Shop" }]));
        });

        let client = client_for(&server.base_url(), false);
        let user = AccountService::new(&client)
            .sign_in("owner@example.com", &SecretString::from("Str0ng!Pass"))
            .await
            .unwrap();

        assert_eq!(user.role, Some(Role::StoreOwner));
        assert_eq!(user.name.as_deref(), Some("Owner Of The Corner Shop"));
        assert_eq!(user.email, "owner@example.com");
    }

    #[tokio::test]
    async fn test_sign_in_tolerates_missing_profile() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/token");
            then.status(200).json_body(json!({
                "access_token": "user-token",
                "user": {
                    "id": USER_ID,
                    "email": "rater@example.com",
                    "user_metadata": { "name": "Name From Sign Up Metadata" }
                }
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/user_roles");
            then.status(200).json_body(json!([]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(500).json_body(json!({ "message": "boom" }));
        });

        let client = client_for(&server.base_url(), false);
        let user = AccountService::new(&client)
            .sign_in("rater@example.com", &SecretString::from("Str0ng!Pass"))
            .await
            .unwrap();

        assert_eq!(user.role, None);
        assert_eq!(user.name.as_deref(), Some("Name From Sign Up Metadata"));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let server = MockServer::start();
        let refresh = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "refresh_token")
                .json_body(json!({ "refresh_token": "old-refresh" }));
            then.status(200).json_body(json!({
                "access_token": "new-token",
                "refresh_token": "new-refresh",
                "expires_in": 3600,
                "user": { "id": USER_ID, "email": "owner@example.com" }
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/user_roles")
                .header("authorization", "Bearer new-token");
            then.status(200).json_body(json!([{ "user_id": USER_ID, "role": "admin" }]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(200)
                .json_body(json!([{ "user_id": USER_ID, "name": "Owner Of The Corner Shop" }]));
        });

        let client = client_for(&server.base_url(), false);
        let before = Utc::now();
        let user = AccountService::new(&client)
            .refresh(&RefreshToken::new("old-refresh".to_string()))
            .await
            .unwrap();

        refresh.assert();
        assert_eq!(user.role, Some(Role::Admin));
        assert_eq!(user.access_token.expose(), "new-token");
        assert!(!user.needs_refresh(Utc::now()));
        assert!(user.expires_at.unwrap() >= before + TimeDelta::seconds(3600));
        assert_eq!(user.refresh_token.unwrap().expose(), "new-refresh");
    }

    #[tokio::test]
    async fn test_register_without_session_needs_confirmation() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/signup");
            then.status(200).json_body(json!({ "id": USER_ID, "email": "newcomer@example.com" }));
        });

        let client = client_for(&server.base_url(), false);
        let outcome = AccountService::new(&client)
            .register(&account(), None)
            .await
            .unwrap();

        assert!(matches!(outcome, Registration::ConfirmationRequired));
    }

    #[tokio::test]
    async fn test_create_user_sets_role_of_new_account() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST).path("/auth/v1/admin/users");
            then.status(200).json_body(json!({ "id": USER_ID, "email": "newcomer@example.com" }));
        });
        let role = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/user_roles")
                .query_param("user_id", format!("eq.{USER_ID}"))
                .header("authorization", "Bearer admin-token")
                .json_body(json!({ "role": "store_owner" }));
            then.status(200)
                .json_body(json!([{ "user_id": USER_ID, "role": "store_owner" }]));
        });

        let client = client_for(&server.base_url(), true);
        let id = AccountService::new(&client)
            .create_user(
                &AccessToken::new("admin-token".to_string()),
                &account(),
                Role::StoreOwner,
            )
            .await
            .unwrap();

        create.assert();
        role.assert();
        assert_eq!(id.to_string(), USER_ID);
    }

    #[tokio::test]
    async fn test_create_user_falls_back_to_sign_up() {
        let server = MockServer::start();
        let signup = server.mock(|when, then| {
            when.method(POST).path("/auth/v1/signup");
            then.status(200).json_body(json!({
                "access_token": "newcomer-token",
                "user": { "id": USER_ID, "email": "newcomer@example.com" }
            }));
        });
        server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/user_roles")
                .header("authorization", "Bearer admin-token");
            then.status(200).json_body(json!([{ "user_id": USER_ID, "role": "user" }]));
        });

        let client = client_for(&server.base_url(), false);
        let id = AccountService::new(&client)
            .create_user(
                &AccessToken::new("admin-token".to_string()),
                &account(),
                Role::User,
            )
            .await
            .unwrap();

        signup.assert();
        assert_eq!(id.to_string(), USER_ID);
    }
}
