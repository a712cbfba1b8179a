//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SCOREKEEP_BASE_URL` - Public URL for the site
//! - `SCOREKEEP_SESSION_SECRET` - Session signing secret (min 64 chars, high entropy)
//! - `SUPABASE_URL` - Project URL of the hosted backend (e.g., `https://abc.supabase.co`)
//! - `SUPABASE_ANON_KEY` - Public anon key, sent as `apikey` on every request
//!
//! ## Optional
//! - `SUPABASE_SERVICE_ROLE_KEY` - Enables admin user lookup and creation
//! - `SCOREKEEP_HOST` - Bind address (default: 127.0.0.1)
//! - `SCOREKEEP_PORT` - Listen port (default: 3000)
//! - `SUPABASE_TIMEOUT_SECS` - Per-request timeout for backend calls (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::str::FromStr;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Signed session cookies need a 64-byte key.
const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

/// Template text that must never reach a running server (case-insensitive).
const TEMPLATE_MARKERS: &[&str] = &[
    "your-", "your_", "changeme", "placeholder", "xxx", "insert", "put-your", "add-your",
];

/// Extra markers for the session secret only. Backend keys are generated
/// (`sb_secret_...`) and may legitimately contain these words.
const WEAK_SECRET_MARKERS: &[&str] = &["secret", "password", "example", "replace", "todo", "fixme"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Hosted backend configuration
    pub supabase: SupabaseConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Hosted backend (Supabase) configuration.
///
/// Implements `Debug` manually to redact key material.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, without trailing slash
    pub url: Url,
    /// Anon key (safe to expose in a browser; row-level security applies)
    pub anon_key: SecretString,
    /// Service-role key (bypasses row-level security; server-side only)
    pub service_role_key: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let session_secret = required("SCOREKEEP_SESSION_SECRET")?;
        check_session_secret(&session_secret, "SCOREKEEP_SESSION_SECRET")?;

        let supabase = SupabaseConfig::from_env()?;

        Ok(Self {
            host: parsed_or("SCOREKEEP_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parsed_or("SCOREKEEP_PORT", 3000)?,
            base_url: required("SCOREKEEP_BASE_URL")?,
            session_secret: SecretString::from(session_secret),
            supabase,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SupabaseConfig {
    /// Load the backend settings on their own.
    ///
    /// Used by the CLI, which has no use for the HTTP server settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL or anon key is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = parse_project_url(&required("SUPABASE_URL")?)?;

        let anon_key = required("SUPABASE_ANON_KEY")?;
        reject_template_value(&anon_key, "SUPABASE_ANON_KEY", TEMPLATE_MARKERS)?;

        let service_role_key = optional("SUPABASE_SERVICE_ROLE_KEY")
            .map(|key| {
                reject_template_value(&key, "SUPABASE_SERVICE_ROLE_KEY", TEMPLATE_MARKERS)?;
                Ok(SecretString::from(key))
            })
            .transpose()?;

        let timeout_secs = parsed_or("SUPABASE_TIMEOUT_SECS", DEFAULT_BACKEND_TIMEOUT_SECS)?;

        Ok(Self {
            url,
            anon_key: SecretString::from(anon_key),
            service_role_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// A variable that must be set to a non-blank value.
fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Blank values count as unset.
fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional variable, falling back to `default` when unset.
fn parsed_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(key).map_or(Ok(default), |raw| raw.trim().parse().map_err(invalid(key)))
}

fn invalid<E: std::fmt::Display>(key: &str) -> impl FnOnce(E) -> ConfigError + '_ {
    move |e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())
}

/// Parse the backend project URL; only http(s) is accepted.
fn parse_project_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(invalid("SUPABASE_URL"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            "SUPABASE_URL".to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_default() += 1;
    }

    let total: u32 = freq.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);
    freq.values()
        .map(|&count| {
            let p = f64::from(count) / total;
            -p * p.log2()
        })
        .sum()
}

fn reject_template_value(value: &str, var_name: &str, markers: &[&str]) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(marker) = markers.iter().find(|m| lower.contains(*m)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{marker}')"),
        ));
    }
    Ok(())
}

/// The session secret doubles as the cookie signing key: it must be long,
/// random-looking and not copied from a template.
fn check_session_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let length = secret.chars().count();
    if length < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {length})"),
        ));
    }

    reject_template_value(secret, var_name, TEMPLATE_MARKERS)?;
    reject_template_value(secret, var_name, WEAK_SECRET_MARKERS)?;

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
