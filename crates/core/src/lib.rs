//! ScoreKeep Core - Shared types library.
//!
//! This crate provides the types used across all ScoreKeep components:
//! - `web` - Server-rendered rating site
//! - `cli` - Operator commands against the hosted backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles and rating values
//! - [`validation`] - Form validation rules shared by every entry point

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::ValidationError;
