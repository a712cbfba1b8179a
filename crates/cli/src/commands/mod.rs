//! Command implementations.
//!
//! Every command talks to the backend with the service-role key, so it
//! bypasses row-level security.

pub mod stats;
pub mod stores;
pub mod users;

use scorekeep_core::ValidationError;
use scorekeep_web::config::{ConfigError, SupabaseConfig};
use scorekeep_web::supabase::{SupabaseClient, SupabaseError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input failed a validation rule.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The backend rejected the call.
    #[error("Backend error: {0}")]
    Backend(#[from] SupabaseError),

    /// The owner id is not a UUID.
    #[error("Invalid owner id: {0}")]
    InvalidOwner(String),
}

/// Build a backend client from the environment.
///
/// # Errors
///
/// Returns an error if the settings are missing or the service-role key is
/// not configured.
pub fn connect() -> Result<SupabaseClient, CommandError> {
    dotenvy::dotenv().ok();

    let config = SupabaseConfig::from_env()?;
    let client = SupabaseClient::new(&config)?;
    client.service_token()?;
    Ok(client)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::time::Duration;

    use secrecy::SecretString;
    use scorekeep_web::config::SupabaseConfig;
    use scorekeep_web::supabase::SupabaseClient;

    pub const SERVICE_KEY: &str = "service-test-key";

    /// Service-role client pointed at a mock server.
    pub fn client_for(base_url: &str) -> SupabaseClient {
        let config = SupabaseConfig {
            url: url::Url::parse(base_url).unwrap(),
            anon_key: SecretString::from("anon-test-key"),
            service_role_key: Some(SecretString::from(SERVICE_KEY)),
            timeout: Duration::from_secs(5),
        };
        SupabaseClient::new(&config).unwrap()
    }
}
