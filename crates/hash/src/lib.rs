#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! BLAKE3 content identifiers for apkolock
//!
//! A merged image configuration is identified by the hash of its canonical
//! JSON serialization, so two configurations that lock identically share an
//! identifier regardless of how their sources were written.

use apkolock_errors::{ConfigError, Error};
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of hex characters used in file names derived from a hash
pub const SHORT_LEN: usize = 6;

/// A BLAKE3 hash value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    bytes: [u8; 32],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Leading hex characters, used to name per-configuration files
    #[must_use]
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(SHORT_LEN);
        hex
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Self::from_bytes(*hash.as_bytes())
    }

    /// Compute the hash of a value's canonical JSON serialization
    ///
    /// Struct fields serialize in declaration order and maps should be
    /// ordered (`BTreeMap`) for the result to be stable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SerializeError` if the value cannot be serialized.
    pub fn from_json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        let canonical = serde_json::to_vec(value).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })?;
        Ok(Self::from_data(&canonical))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}
