//! Common utilities and types shared across Strongbox modules.
//!
//! This module provides the error type used throughout the codebase and
//! a zeroizing wrapper for sensitive string data such as master passwords.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::SensitiveString;
