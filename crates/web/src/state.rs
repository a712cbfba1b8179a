//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::WebConfig;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    supabase: SupabaseClient,
}

impl AppState {
    /// Create the application state, building the backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: WebConfig) -> Result<Self, SupabaseError> {
        let supabase = SupabaseClient::new(&config.supabase)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, supabase }),
        })
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }
}
