//! Row and payload types exchanged with the hosted backend.
//!
//! Field names follow the backend's column names so rows deserialize
//! without renames.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use scorekeep_core::{Email, RatingId, RatingValue, Role, StoreId, UserId};

// =============================================================================
// Auth
// =============================================================================

/// Bearer token for one signed-in user (or the service role).
///
/// Stored in the session, so it serializes as a plain string. `Debug` never
/// prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw bearer token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Long-lived token that trades for a new [`AccessToken`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken([REDACTED])")
    }
}

/// Metadata attached to an auth user at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// An auth user as returned by the auth API.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// A signed-in session.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    /// Lifetime of `access_token` in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// Result of a sign-up.
///
/// Projects with email confirmation enabled answer with the bare user and no
/// session.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired(AuthUser),
}

impl SignUpOutcome {
    /// The created user, whichever shape the backend answered with.
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        match self {
            Self::SignedIn(session) => &session.user,
            Self::ConfirmationRequired(user) => user,
        }
    }
}

/// Raw sign-up body; the session shape is tried first.
#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

impl From<SignUpResponse> for SignUpOutcome {
    fn from(raw: SignUpResponse) -> Self {
        match raw {
            SignUpResponse::Session(session) => Self::SignedIn(session),
            SignUpResponse::User(user) => Self::ConfirmationRequired(user),
        }
    }
}

/// Everything needed to create an account.
///
/// `Debug` is implemented manually to keep the password out of logs.
#[derive(Clone)]
pub struct NewAccount {
    pub email: Email,
    pub password: SecretString,
    pub name: String,
    pub address: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

impl NewAccount {
    /// Body for the public sign-up endpoint.
    pub(super) fn signup_body(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email.as_str(),
            "password": self.password.expose_secret(),
            "data": { "name": self.name, "address": self.address },
        })
    }

    /// Body for the admin create-user endpoint (pre-confirmed).
    pub(super) fn admin_body(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email.as_str(),
            "password": self.password.expose_secret(),
            "email_confirm": true,
            "user_metadata": { "name": self.name, "address": self.address },
        })
    }
}

// =============================================================================
// Tables
// =============================================================================

/// Tables this app reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Profiles,
    Stores,
    Ratings,
    UserRoles,
}

impl Table {
    /// Table name in the REST path.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Stores => "stores",
            Self::Ratings => "ratings",
            Self::UserRoles => "user_roles",
        }
    }
}

/// A `profiles` row.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// A `user_roles` row.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleRow {
    pub user_id: UserId,
    pub role: Role,
}

/// A `stores` row.
#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

/// A rating embedded in a store select (`ratings(rating, user_id)`).
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedRating {
    pub rating: i16,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// A store together with its embedded ratings.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreWithRatings {
    #[serde(flatten)]
    pub store: Store,
    #[serde(default)]
    pub ratings: Vec<EmbeddedRating>,
}

/// A `ratings` row.
#[derive(Debug, Clone, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

/// Payload for a rating upsert.
#[derive(Debug, Clone, Serialize)]
pub struct NewRating {
    pub user_id: UserId,
    pub store_id: StoreId,
    pub rating: RatingValue,
}

/// Payload for a store insert.
#[derive(Debug, Clone, Serialize)]
pub struct NewStore {
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOi.secret.sig".to_string());
        assert_eq!(format!("{token:?}"), "AccessToken([REDACTED])");
    }

    #[test]
    fn test_signup_response_with_session() {
        let body = serde_json::json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "ref",
            "user": {
                "id": "8d0e3c47-0b3d-4a8e-9d55-6c0f4f1f9b11",
                "email": "someone@example.com",
                "user_metadata": { "name": "Someone", "address": "1 Road" }
            }
        });
        let outcome: SignUpOutcome = serde_json::from_value::<SignUpResponse>(body)
            .unwrap()
            .into();
        let SignUpOutcome::SignedIn(session) = &outcome else {
            panic!("expected a session");
        };
        assert_eq!(session.refresh_token.as_ref().unwrap().expose(), "ref");
        assert_eq!(session.expires_in, Some(3600));
        assert_eq!(format!("{:?}", session.refresh_token), "Some(RefreshToken([REDACTED]))");
        assert_eq!(outcome.user().email.as_deref(), Some("someone@example.com"));
    }

    #[test]
    fn test_signup_response_without_session() {
        let body = serde_json::json!({
            "id": "8d0e3c47-0b3d-4a8e-9d55-6c0f4f1f9b11",
            "email": "someone@example.com",
            "confirmation_sent_at": "2024-05-01T10:00:00Z"
        });
        let outcome: SignUpOutcome = serde_json::from_value::<SignUpResponse>(body)
            .unwrap()
            .into();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
    }

    #[test]
    fn test_store_with_embedded_ratings() {
        let body = serde_json::json!({
            "id": "5b7f2a8e-3c1d-4e9f-8a6b-2d4c6e8f0a1b",
            "name": "Corner Books",
            "email": "hello@cornerbooks.test",
            "address": "12 High Street",
            "owner_id": null,
            "created_at": "2024-05-01T10:00:00+00:00",
            "ratings": [
                { "rating": 4, "user_id": "8d0e3c47-0b3d-4a8e-9d55-6c0f4f1f9b11" },
                { "rating": 2 }
            ]
        });
        let row: StoreWithRatings = serde_json::from_value(body).unwrap();
        assert_eq!(row.store.name, "Corner Books");
        assert!(row.store.owner_id.is_none());
        assert_eq!(row.ratings.len(), 2);
        assert!(row.ratings[1].user_id.is_none());
    }

    #[test]
    fn test_new_store_omits_missing_owner() {
        let store = NewStore {
            name: "Corner Books".to_string(),
            email: "hello@cornerbooks.test".to_string(),
            address: "12 High Street".to_string(),
            owner_id: None,
        };
        let json = serde_json::to_value(&store).unwrap();
        assert!(json.get("owner_id").is_none());
    }

    #[test]
    fn test_new_account_debug_hides_password() {
        let account = NewAccount {
            email: Email::parse("someone@example.com").unwrap(),
            password: SecretString::from("Hunter2!Hunter2"),
            name: "Someone With A Long Enough Name".to_string(),
            address: "1 Road".to_string(),
        };
        let debug = format!("{account:?}");
        assert!(!debug.contains("Hunter2"));
        assert!(debug.contains("someone@example.com"));
    }
}
