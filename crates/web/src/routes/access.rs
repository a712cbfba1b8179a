//! The page shown when a signed-in user lacks the required role.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::PageChrome;
use crate::filters;
use crate::models::CurrentUser;

/// Access denied page template.
#[derive(Template, WebTemplate)]
#[template(path = "access_denied.html")]
pub struct AccessDeniedTemplate {
    pub chrome: PageChrome,
    /// The user's role, or "none".
    pub current_role: &'static str,
    pub required_role: &'static str,
}

/// Render the access-denied page with a 403 status.
#[must_use]
pub fn access_denied(user: &CurrentUser, path: &str, required_role: &'static str) -> Response {
    let template = AccessDeniedTemplate {
        chrome: PageChrome::new("Access Denied", path, Some(user), Vec::new()),
        current_role: user.role.map_or("none", |role| role.label()),
        required_role,
    };

    (StatusCode::FORBIDDEN, template).into_response()
}
