//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logger installation
//! - Wall-clock time
//! - Key/value storage (LocalStorage on web, one file per key natively)

pub mod storage;
pub mod time;

pub use storage::{MemoryStorage, Storage, StorageError};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use time::unix_time;

/// Install the platform logger (safe to call more than once)
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already installed");
    }
}

/// Install the platform logger (safe to call more than once)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    if env_logger::try_init().is_err() {
        log::debug!("Logger already installed");
    }
}
