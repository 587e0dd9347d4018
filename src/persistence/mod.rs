//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Legacy (bare payload) records still load
//! - Corruption detection; callers recover with defaults

pub mod envelope;

pub use envelope::{CURRENT_VERSION, Envelope, PersistenceError, decode, encode};
