//! Types the web layer keeps in the session.

pub mod session;

pub use session::{CurrentUser, Flash, FlashLevel, keys as session_keys};
