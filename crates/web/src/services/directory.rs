//! Admin directory of accounts, plus the text filters used by the
//! dashboard tables.
//!
//! Filtering happens in memory on rows already fetched for the page.

use std::collections::HashMap;
use std::str::FromStr;

use scorekeep_core::{Role, RoleParseError, UserId};

use super::ratings::StoreSummary;
use crate::supabase::{Profile, UserRoleRow};

/// One account row on the admin dashboard.
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub id: UserId,
    pub name: String,
    /// Blank when the email could not be looked up.
    pub email: String,
    pub address: String,
    pub roles: Vec<Role>,
}

/// Join profiles with their role rows and looked-up emails.
///
/// Profiles keep their order; roles are listed most privileged first.
#[must_use]
pub fn build_user_directory(
    profiles: Vec<Profile>,
    role_rows: &[UserRoleRow],
    emails: &HashMap<UserId, String>,
) -> Vec<UserEntry> {
    let mut roles_by_user: HashMap<UserId, Vec<Role>> = HashMap::new();
    for row in role_rows {
        roles_by_user.entry(row.user_id).or_default().push(row.role);
    }

    profiles
        .into_iter()
        .map(|profile| {
            let mut roles = roles_by_user.remove(&profile.user_id).unwrap_or_default();
            roles.sort_unstable_by(|a, b| b.cmp(a));
            roles.dedup();

            UserEntry {
                id: profile.user_id,
                email: emails.get(&profile.user_id).cloned().unwrap_or_default(),
                name: profile.name,
                address: profile.address,
                roles,
            }
        })
        .collect()
}

/// Role filter on the admin users table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

impl RoleFilter {
    /// Query-string value (`all` or a role name).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(role) => role.as_str(),
        }
    }

    fn admits(self, roles: &[Role]) -> bool {
        match self {
            Self::All => true,
            Self::Only(role) => roles.contains(&role),
        }
    }
}

impl FromStr for RoleFilter {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

/// Case-insensitive substring match; an empty needle matches everything.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(needle)
}

/// Stores whose name or address contains `query`.
///
/// The query is matched as typed, surrounding spaces included.
#[must_use]
pub fn filter_stores<'a>(stores: &'a [StoreSummary], query: &str) -> Vec<&'a StoreSummary> {
    let needle = query.to_lowercase();
    stores
        .iter()
        .filter(|s| contains_folded(&s.name, &needle) || contains_folded(&s.address, &needle))
        .collect()
}

/// Accounts whose name or email contains `query` and whose roles pass
/// `role`.
#[must_use]
pub fn filter_users<'a>(users: &'a [UserEntry], query: &str, role: RoleFilter) -> Vec<&'a UserEntry> {
    let needle = query.to_lowercase();
    users
        .iter()
        .filter(|u| contains_folded(&u.name, &needle) || contains_folded(&u.email, &needle))
        .filter(|u| role.admits(&u.roles))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use scorekeep_core::StoreId;

    use super::*;

    fn uid(n: u128) -> UserId {
        UserId::new(uuid::Uuid::from_u128(n))
    }

    fn profile(n: u128, name: &str) -> Profile {
        Profile {
            user_id: uid(n),
            name: name.to_string(),
            address: format!("{n} Long Road"),
        }
    }

    fn summary(name: &str, address: &str) -> StoreSummary {
        StoreSummary {
            id: StoreId::new(uuid::Uuid::new_v4()),
            name: name.to_string(),
            email: String::new(),
            address: address.to_string(),
            average: 0.0,
            rating_count: 0,
            my_rating: None,
        }
    }

    fn directory() -> Vec<UserEntry> {
        let profiles = vec![
            profile(1, "Alice The Administrator"),
            profile(2, "Bob Who Owns A Bookshop"),
            profile(3, "Carol Who Rates Things"),
        ];
        let roles = vec![
            UserRoleRow { user_id: uid(1), role: Role::User },
            UserRoleRow { user_id: uid(1), role: Role::Admin },
            UserRoleRow { user_id: uid(2), role: Role::StoreOwner },
        ];
        let emails = HashMap::from([
            (uid(1), "alice@example.com".to_string()),
            (uid(2), "bob@books.test".to_string()),
        ]);
        build_user_directory(profiles, &roles, &emails)
    }

    #[test]
    fn test_directory_joins_roles_and_emails() {
        let users = directory();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].roles, vec![Role::Admin, Role::User]);
        assert_eq!(users[1].email, "bob@books.test");
        assert!(users[2].email.is_empty());
        assert!(users[2].roles.is_empty());
    }

    #[test]
    fn test_role_filter_parsing() {
        assert_eq!("all".parse::<RoleFilter>().unwrap(), RoleFilter::All);
        assert_eq!("".parse::<RoleFilter>().unwrap(), RoleFilter::All);
        assert_eq!(
            "store_owner".parse::<RoleFilter>().unwrap(),
            RoleFilter::Only(Role::StoreOwner)
        );
        assert!("owner".parse::<RoleFilter>().is_err());
    }

    #[test]
    fn test_filter_users_by_text_and_role() {
        let users = directory();

        let by_email = filter_users(&users, "BOOKS.test", RoleFilter::All);
        assert_eq!(by_email.len(), 1);

        let admins = filter_users(&users, "", RoleFilter::Only(Role::Admin));
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].name, "Alice The Administrator");

        assert!(filter_users(&users, " alice", RoleFilter::All).is_empty());

        let none = filter_users(&users, "carol", RoleFilter::Only(Role::StoreOwner));
        assert!(none.is_empty());
    }

    #[test]
    fn test_filter_stores_by_name_or_address() {
        let stores = vec![
            summary("Corner Books", "12 High Street"),
            summary("Green Grocer", "4 Market Square"),
        ];

        assert_eq!(filter_stores(&stores, "").len(), 2);
        assert_eq!(filter_stores(&stores, "market").len(), 1);
        assert_eq!(filter_stores(&stores, "CORNER").len(), 1);
        assert_eq!(filter_stores(&stores, "high street").len(), 1);
        assert!(filter_stores(&stores, " corner ").is_empty());
        assert!(filter_stores(&stores, "bakery").is_empty());
    }
}
