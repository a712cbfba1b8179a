//! Session-related types.
//!
//! Types stored in the session for authentication state and toasts.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use scorekeep_core::{Role, UserId};

use crate::supabase::{AccessToken, RefreshToken};

/// Refresh this many seconds before the backend token runs out.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Session-stored user identity.
///
/// Written at sign-in and rewritten on every token refresh; the role is
/// re-read then, not on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth user id.
    pub id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Display name from the profile, when one exists.
    pub name: Option<String>,
    /// Highest-privilege role held, `None` when no role row exists.
    pub role: Option<Role>,
    /// Bearer token forwarded on every backend call.
    pub access_token: AccessToken,
    /// Trades for a new `access_token` once it expires.
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    /// When `access_token` stops being accepted, if the backend said.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CurrentUser {
    /// Name for the header; falls back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }

    /// Whether the user's role is one of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role.is_some_and(|role| roles.contains(&role))
    }

    /// Whether the access token is expired or about to be at `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - TimeDelta::seconds(REFRESH_MARGIN_SECS) <= now)
    }

    /// Dashboard this user lands on, if their role has one.
    #[must_use]
    pub fn home_path(&self) -> Option<&'static str> {
        self.role.map(Role::home_path)
    }
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Destructive,
}

impl FlashLevel {
    /// CSS modifier used by the toast markup.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "toast--success",
            Self::Destructive => "toast--destructive",
        }
    }
}

/// A one-shot toast shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub title: String,
    pub description: String,
}

impl Flash {
    /// A "Success" toast.
    #[must_use]
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            title: "Success".to_string(),
            description: description.into(),
        }
    }

    /// An "Error" toast.
    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Destructive,
            title: "Error".to_string(),
            description: description.into(),
        }
    }

    /// Replace the default title.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending toasts.
    pub const FLASHES: &str = "flashes";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(role: Option<Role>, name: Option<&str>) -> CurrentUser {
        CurrentUser {
            id: UserId::new(uuid::Uuid::new_v4()),
            email: "someone@example.com".to_string(),
            name: name.map(String::from),
            role,
            access_token: AccessToken::new("token".to_string()),
            refresh_token: Some(RefreshToken::new("refresh".to_string())),
            expires_at: None,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(None, None).display_name(), "someone@example.com");
        assert_eq!(user(None, Some("  ")).display_name(), "someone@example.com");
        assert_eq!(
            user(None, Some("Someone Signed In Here")).display_name(),
            "Someone Signed In Here"
        );
    }

    #[test]
    fn test_home_path_follows_role() {
        assert_eq!(user(Some(Role::Admin), None).home_path(), Some("/admin"));
        assert_eq!(user(Some(Role::StoreOwner), None).home_path(), Some("/store-owner"));
        assert_eq!(user(None, None).home_path(), None);
    }

    #[test]
    fn test_needs_refresh_near_expiry() {
        let now = Utc::now();
        let mut current = user(Some(Role::User), None);
        assert!(!current.needs_refresh(now));

        current.expires_at = Some(now + TimeDelta::minutes(30));
        assert!(!current.needs_refresh(now));

        current.expires_at = Some(now + TimeDelta::seconds(30));
        assert!(current.needs_refresh(now));

        current.expires_at = Some(now - TimeDelta::minutes(5));
        assert!(current.needs_refresh(now));
    }

    #[test]
    fn test_current_user_survives_session_round_trip() {
        let original = user(Some(Role::StoreOwner), Some("Store Owner With A Name"));
        let json = serde_json::to_string(&original).unwrap();
        let restored: CurrentUser = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.role, Some(Role::StoreOwner));
        assert_eq!(restored.access_token.expose(), "token");
        assert_eq!(restored.refresh_token.unwrap().expose(), "refresh");
    }

    #[test]
    fn test_flash_builders() {
        let flash = Flash::error("Failed to load stores");
        assert_eq!(flash.level, FlashLevel::Destructive);
        assert_eq!(flash.title, "Error");
        assert_eq!(flash.description, "Failed to load stores");

        let flash = Flash::success("Check your email").titled("Account created");
        assert_eq!(flash.title, "Account created");
        assert_eq!(flash.level.css_class(), "toast--success");
    }
}
