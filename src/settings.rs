//! Player preferences
//!
//! Persisted separately from the high score, through the same storage layer.

use serde::{Deserialize, Serialize};

use crate::persistence;
use crate::platform::Storage;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mute toggle from the in-game button
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Background music volume (0.0 - 1.0)
    pub music_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "break_glass_settings";

    /// Flip the mute toggle, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Load settings, falling back to defaults on any error
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match persistence::decode::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Discarding stored settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings (failures are logged, never fatal)
    pub fn save(&self, storage: &mut dyn Storage) {
        let result = persistence::encode(self)
            .and_then(|json| Ok(storage.set_item(Self::STORAGE_KEY, &json)?));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Could not save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStorage::new();
        let mut settings = Settings::default();
        assert!(settings.toggle_mute());
        settings.music_volume = 0.2;
        settings.save(&mut storage);

        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back() {
        let mut storage = MemoryStorage::new();
        storage.set_item(Settings::STORAGE_KEY, "[1, 2").unwrap();
        assert_eq!(Settings::load(&storage), Settings::default());
    }
}
