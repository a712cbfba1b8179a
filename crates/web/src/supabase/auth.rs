//! Auth API (`/auth/v1`): sessions, sign-up and user administration.

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use scorekeep_core::UserId;

use super::{
    AccessToken, AuthSession, AuthUser, NewAccount, RefreshToken, SignUpOutcome, SignUpResponse,
    SupabaseClient, SupabaseError,
};

impl SupabaseClient {
    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] with the backend's message (e.g.
    /// "Invalid login credentials") when the credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let response = self.inner.http.post(url).json(&body).send().await?;
        Self::decode(response).await
    }

    /// Trade a refresh token for a new session.
    ///
    /// Refresh tokens are single-use: the returned session carries the
    /// replacement.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] when the refresh token is unknown,
    /// already used or revoked.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let body = serde_json::json!({ "refresh_token": refresh_token.expose() });

        let response = self.inner.http.post(url).json(&body).send().await?;
        Self::decode(response).await
    }

    /// Register a new account through the public sign-up endpoint.
    ///
    /// Name and address travel as user metadata; the backend copies them
    /// into the `profiles` row.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] when the backend refuses the sign-up
    /// (e.g. "User already registered").
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn sign_up(
        &self,
        account: &NewAccount,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let mut url = self.endpoint("auth/v1/signup")?;
        if let Some(redirect_to) = redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        }

        let response = self
            .inner
            .http
            .post(url)
            .json(&account.signup_body())
            .send()
            .await?;
        let raw: SignUpResponse = Self::decode(response).await?;
        Ok(raw.into())
    }

    /// Revoke the session behind `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, token: &AccessToken) -> Result<(), SupabaseError> {
        let url = self.endpoint("auth/v1/logout")?;
        let request = Self::bearer(self.inner.http.post(url), token);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        token: &AccessToken,
        password: &SecretString,
    ) -> Result<AuthUser, SupabaseError> {
        let url = self.endpoint("auth/v1/user")?;
        let body = serde_json::json!({ "password": password.expose_secret() });

        let request = Self::bearer(self.inner.http.put(url), token).json(&body);
        Self::decode(request.send().await?).await
    }

    /// Look up any user by id. Needs the service-role key.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingServiceKey`] without a service key, or
    /// an API error when the user does not exist.
    #[instrument(skip(self))]
    pub async fn admin_get_user(&self, user_id: UserId) -> Result<AuthUser, SupabaseError> {
        let url = self.endpoint(&format!("auth/v1/admin/users/{user_id}"))?;
        let request = self.as_service(self.inner.http.get(url))?;
        Self::decode(request.send().await?).await
    }

    /// Create a pre-confirmed user. Needs the service-role key.
    ///
    /// Unlike [`Self::sign_up`] this never touches the caller's session.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingServiceKey`] without a service key, or
    /// an API error when the backend refuses the account.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn admin_create_user(&self, account: &NewAccount) -> Result<AuthUser, SupabaseError> {
        let url = self.endpoint("auth/v1/admin/users")?;
        let request = self
            .as_service(self.inner.http.post(url))?
            .json(&account.admin_body());
        Self::decode(request.send().await?).await
    }

    /// Liveness probe against the auth API.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), SupabaseError> {
        let url = self.endpoint("auth/v1/health")?;
        let request = Self::bearer(self.inner.http.get(url), &self.anon_token());
        Self::check(request.send().await?).await?;
        Ok(())
    }
}
