//! Header navigation.

use scorekeep_core::Role;

use crate::models::CurrentUser;

/// One header link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    /// Whether this link points at the page being rendered.
    pub active: bool,
}

impl NavLink {
    const fn new(label: &'static str, href: &'static str) -> Self {
        Self {
            label,
            href,
            active: false,
        }
    }
}

/// Links visible to `user` (or a visitor), with the current page marked.
///
/// Home is always shown. Any signed-in account sees the user dashboard;
/// store owners and admins also see the store owner dashboard; only admins
/// see the admin dashboard.
#[must_use]
pub fn nav_links(user: Option<&CurrentUser>, current_path: &str) -> Vec<NavLink> {
    let mut links = vec![NavLink::new("Home", "/")];

    if let Some(user) = user {
        links.push(NavLink::new("User Dashboard", "/user"));

        if user.has_any_role(&[Role::StoreOwner, Role::Admin]) {
            links.push(NavLink::new("Store Owner Dashboard", "/store-owner"));
        }
        if user.has_any_role(&[Role::Admin]) {
            links.push(NavLink::new("Admin Dashboard", "/admin"));
        }
    }

    for link in &mut links {
        link.active = link.href == current_path;
    }
    links
}
