//! Integration tests for ScoreKeep.
//!
//! The full router (sessions, guards, templates) is driven in-process with
//! `tower::ServiceExt::oneshot`; an `httpmock` server stands in for the
//! hosted backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p scorekeep-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use httpmock::Mock;
use httpmock::prelude::*;
use secrecy::SecretString;
use serde_json::json;
use tower::ServiceExt;

use scorekeep_core::{Role, UserId};
use scorekeep_web::config::{SupabaseConfig, WebConfig};
use scorekeep_web::state::AppState;

/// Signed-in test account id.
pub const USER_ID: &str = "8d0e3c47-0b3d-4a8e-9d55-6c0f4f1f9b11";
/// Access token issued by [`TestApp::sign_in_as`].
pub const ACCESS_TOKEN: &str = "user-token";
/// Refresh token issued by [`TestApp::sign_in_as`].
pub const REFRESH_TOKEN: &str = "user-refresh";
/// Service-role key handed to the app when enabled.
pub const SERVICE_KEY: &str = "service-test-key";

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// The app plus a mock backend and a one-cookie jar.
pub struct TestApp {
    pub backend: MockServer,
    router: Router,
    cookie: Mutex<Option<String>>,
    /// The `user_roles` mock registered at sign-in.
    roles_mock: Option<usize>,
}

impl TestApp {
    /// App without a service-role key.
    #[must_use]
    pub fn new() -> Self {
        Self::build(false)
    }

    /// App with a service-role key.
    #[must_use]
    pub fn with_service_key() -> Self {
        Self::build(true)
    }

    fn build(with_service_key: bool) -> Self {
        let backend = MockServer::start();

        let config = WebConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("k7Qw2pZr9LmX4vTn8bYc1sHd6fJg3aUe".repeat(2)),
            supabase: SupabaseConfig {
                url: url::Url::parse(&backend.base_url()).expect("mock server url"),
                anon_key: SecretString::from("anon-test-key"),
                service_role_key: with_service_key.then(|| SecretString::from(SERVICE_KEY)),
                timeout: Duration::from_secs(5),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let state = AppState::new(config).expect("app state");
        let router = scorekeep_web::app(state).expect("router");

        Self {
            backend,
            router,
            cookie: Mutex::new(None),
            roles_mock: None,
        }
    }

    /// GET `path`.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::get(path);
        self.send(request, Body::empty()).await
    }

    /// POST a urlencoded form to `path`.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(path).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        self.send(request, Body::from(body)).await
    }

    async fn send(&self, mut request: axum::http::request::Builder, body: Body) -> TestResponse {
        let cookie = self.cookie.lock().expect("cookie jar").clone();
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).expect("request"))
            .await
            .expect("infallible router");

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            *self.cookie.lock().expect("cookie jar") = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Sign in through the login form as an account holding `role`.
    ///
    /// `role: None` signs in an account with no role rows. The backend issues
    /// [`ACCESS_TOKEN`] for an hour, refreshable with [`REFRESH_TOKEN`].
    pub async fn sign_in_as(&mut self, role: Option<Role>, name: &str) -> UserId {
        self.sign_in_expiring(role, name, 3600).await
    }

    /// Like [`Self::sign_in_as`], with the access token valid for
    /// `expires_in` seconds.
    pub async fn sign_in_expiring(&mut self, role: Option<Role>, name: &str, expires_in: i64) -> UserId {
        self.backend.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "password");
            then.status(200).json_body(json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "bearer",
                "expires_in": expires_in,
                "refresh_token": REFRESH_TOKEN,
                "user": { "id": USER_ID, "email": "member@example.com" }
            }));
        });

        self.set_role(role);

        self.backend.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("user_id", format!("eq.{USER_ID}"))
                .query_param("limit", "1");
            then.status(200).json_body(json!([
                { "user_id": USER_ID, "name": name, "address": "12 High Street" }
            ]));
        });

        let response = self
            .post_form(
                "/auth/login",
                &[("email", "member@example.com"), ("password", "Str0ng!Pass")],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);

        USER_ID.parse().expect("user id")
    }

    /// Replace the role rows the backend reports for the test account.
    pub fn set_role(&mut self, role: Option<Role>) {
        if let Some(id) = self.roles_mock.take() {
            Mock::new(id, &self.backend).delete();
        }

        let roles: Vec<_> = role
            .into_iter()
            .map(|role| json!({ "user_id": USER_ID, "role": role.as_str() }))
            .collect();
        let mock = self.backend.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/user_roles")
                .query_param("user_id", format!("eq.{USER_ID}"));
            then.status(200).json_body(json!(roles));
        });
        self.roles_mock = Some(mock.id);
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
