//! Shared data types for keymon

use serde::{Deserialize, Serialize};
use std::fmt;

/// Response body of `GET /keys/active`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveKeysResponse {
    /// Active API keys, in backend order
    pub keys: Vec<String>,
}

/// Monotonic counter handed to detail views so they know when to reload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(u64);

impl RefreshToken {
    /// The token a freshly mounted panel starts with
    pub const INITIAL: Self = Self(0);

    /// Create a token from a raw counter value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw counter value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The token for the following refresh cycle
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RefreshToken {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
