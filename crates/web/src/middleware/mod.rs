//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Security headers
//! 5. Session layer (tower-sessions, in-memory store)
//!
//! The auth rate limiter wraps only the sign-in and sign-up posts.

pub mod auth;
pub mod flash;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminOnly, OptionalAuth, RequireAuth, RequireRole, RolePolicy, SIGN_IN_PATH,
    StoreOwnerOrAdmin, clear_current_user, renew_session, set_current_user,
};
pub use flash::{Flashes, push_flash, take_flashes};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
