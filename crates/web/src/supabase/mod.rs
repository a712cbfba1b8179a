//! Client for the hosted backend (Supabase).
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against the two REST surfaces the app uses:
//!   the auth API (`/auth/v1`) and the row API (`/rest/v1`)
//! - The backend is the source of truth - NO local persistence, every page
//!   reads fresh rows
//! - Row calls carry the signed-in user's bearer token so the backend's
//!   row-level security decides what each caller may see or write
//!
//! # Example
//!
//! ```rust,ignore
//! use scorekeep_web::supabase::{SupabaseClient, Table};
//!
//! let client = SupabaseClient::new(&config.supabase)?;
//!
//! let session = client.sign_in_with_password(&email, &password).await?;
//! let stores = client.list_stores_with_ratings(&session.access_token).await?;
//! let total = client.count(&session.access_token, Table::Ratings).await?;
//! ```

mod auth;
mod rest;
pub mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The operation needs the service-role key, which is not configured.
    #[error("Service role key is not configured")]
    MissingServiceKey,

    /// A key could not be used as a header value.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl SupabaseError {
    /// Message suitable for a toast.
    ///
    /// Backend messages ("Invalid login credentials", "User already
    /// registered") are passed through; transport failures are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::MissingServiceKey => {
                "This action needs the service role key to be configured".to_string()
            }
            _ => "The service is unavailable, please try again".to_string(),
        }
    }

    /// Whether the backend rejected the bearer token (expired or revoked).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// HTTP status returned by the backend, if it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error bodies differ between the auth API and the row API; take whichever
/// field is present.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        [self.message, self.msg, self.error_description, self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

/// Client for the hosted backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    service_role_key: Option<SecretString>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url)
            .field("has_service_role_key", &self.inner.service_role_key.is_some())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the anon key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| SupabaseError::InvalidHeader(format!("anon key: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                http,
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                anon_key: config.anon_key.clone(),
                service_role_key: config.service_role_key.clone(),
            }),
        })
    }

    /// Whether admin-only auth operations are available.
    #[must_use]
    pub fn has_service_role(&self) -> bool {
        self.inner.service_role_key.is_some()
    }

    /// Bearer token for the service role, for operator tooling.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingServiceKey`] when no key is configured.
    pub fn service_token(&self) -> Result<AccessToken, SupabaseError> {
        self.inner
            .service_role_key
            .as_ref()
            .map(|key| AccessToken::new(key.expose_secret().to_string()))
            .ok_or(SupabaseError::MissingServiceKey)
    }

    /// Bearer token for anonymous calls.
    fn anon_token(&self) -> AccessToken {
        AccessToken::new(self.inner.anon_key.expose_secret().to_string())
    }

    /// Build an endpoint URL under the project URL.
    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(Url::parse(&format!("{}/{}", self.inner.base_url, path))?)
    }

    /// Attach a bearer token to a request.
    fn bearer(request: RequestBuilder, token: &AccessToken) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", token.expose()))
    }

    /// Attach the service-role key as both `apikey` and bearer token.
    fn as_service(&self, request: RequestBuilder) -> Result<RequestBuilder, SupabaseError> {
        let token = self.service_token()?;
        Ok(Self::bearer(request.header("apikey", token.expose()), &token))
    }

    /// Turn non-success responses into [`SupabaseError::Api`].
    async fn check(response: Response) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message)
            .or_else(|| (!text.trim().is_empty()).then(|| text.clone()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        Err(SupabaseError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Check the response and decode its JSON body.
    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, SupabaseError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SupabaseError::Parse(e.to_string()))
    }
}
