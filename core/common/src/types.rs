//! Common types used throughout Strongbox.

use std::fmt;
use zeroize::Zeroize;

/// Sensitive string wrapper that zeroizes on drop.
///
/// Used for master passwords and other secrets that transit through the
/// application as text. The Debug impl never prints the contents.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SensitiveString(String);

impl SensitiveString {
    /// Wrap a string as sensitive data.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveString([REDACTED; {} bytes])", self.0.len())
    }
}
