//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;
use tracing::instrument;

use super::PageChrome;
use crate::filters;
use crate::middleware::{OptionalAuth, take_flashes};

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: PageChrome,
    pub signed_in: bool,
}

/// Display the landing page, or send a signed-in user to their dashboard.
///
/// Toasts are only taken when the page is rendered, so they survive the
/// redirect.
#[instrument(skip_all)]
pub async fn home(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if let Some(path) = user.as_ref().and_then(|u| u.home_path()) {
        return Redirect::to(path).into_response();
    }

    HomeTemplate {
        chrome: PageChrome::new(
            "Welcome to ScoreKeep",
            "/",
            user.as_ref(),
            take_flashes(&session).await,
        ),
        signed_in: user.is_some(),
    }
    .into_response()
}
