//! Versioned JSON envelope
//!
//! Records are written as `{ "version": N, "payload": ... }`. Older builds wrote
//! the payload on its own; `decode` accepts both.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::platform::StorageError;

/// Envelope version written by this build
pub const CURRENT_VERSION: u32 = 1;

/// Persistence failure
#[derive(Debug)]
pub enum PersistenceError {
    /// Nothing stored under the key
    Missing,
    /// Stored data is not valid JSON for the record
    Corrupt(serde_json::Error),
    /// Record was written by a newer build
    UnsupportedVersion { found: u32 },
    /// Backend failure
    Storage(StorageError),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no record stored"),
            Self::Corrupt(e) => write!(f, "corrupt record: {e}"),
            Self::UnsupportedVersion { found } => write!(
                f,
                "unsupported record version: {found} (newest known {CURRENT_VERSION})"
            ),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Corrupt(e) => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupt(e)
    }
}

impl From<StorageError> for PersistenceError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Versioned wrapper around a stored record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub payload: T,
}

/// Serialize a record into the current envelope
pub fn encode<T: Serialize>(payload: &T) -> Result<String, PersistenceError> {
    let envelope = Envelope {
        version: CURRENT_VERSION,
        payload,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse a stored record, accepting both enveloped and bare payloads
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T, PersistenceError> {
    let value: serde_json::Value = serde_json::from_str(json)?;

    let is_envelope = value
        .as_object()
        .is_some_and(|o| o.contains_key("version") && o.contains_key("payload"));
    if !is_envelope {
        return Ok(serde_json::from_value(value)?);
    }

    let envelope: Envelope<T> = serde_json::from_value(value)?;
    if envelope.version > CURRENT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: envelope.version,
        });
    }
    Ok(envelope.payload)
}
