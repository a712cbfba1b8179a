//! Business logic between the route handlers and the backend client.
//!
//! # Services
//!
//! - `accounts` - sign-in, sign-up and admin account creation
//! - `directory` - admin user directory and table filters
//! - `navigation` - header links per role
//! - `ratings` - per-store rating aggregates

pub mod accounts;
pub mod directory;
pub mod navigation;
pub mod ratings;

pub use accounts::{AccountService, Registration};
pub use directory::{RoleFilter, UserEntry, build_user_directory, filter_stores, filter_users};
pub use navigation::{NavLink, nav_links};
pub use ratings::{
    ANONYMOUS_RATER, OwnerStoreSummary, RaterEntry, StoreSummary, rater_ids, summarize_owner_store,
    summarize_stores,
};
