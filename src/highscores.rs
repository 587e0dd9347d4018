//! High score record
//!
//! A single record: the details of the best finished game. Persisted as a
//! JSON `GameDetails` blob under a fixed key.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, PersistenceError};
use crate::platform::Storage;
use crate::session::GameDetails;

/// Best finished game so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScoreRecord {
    pub details: GameDetails,
}

impl HighScoreRecord {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "break_glass_high_score";

    pub fn new(details: GameDetails) -> Self {
        Self { details }
    }

    pub fn score(&self) -> u32 {
        self.details.score
    }

    /// True if `score` strictly beats this record (ties never replace it)
    pub fn is_beaten_by(&self, score: u32) -> bool {
        score > self.details.score
    }

    /// Read the record from storage
    pub fn try_load(storage: &dyn Storage) -> Result<Self, PersistenceError> {
        let json = storage
            .get_item(Self::STORAGE_KEY)?
            .ok_or(PersistenceError::Missing)?;
        persistence::decode(&json)
    }

    /// Load the record, falling back to an empty one on any error
    pub fn load(storage: &dyn Storage) -> Self {
        match Self::try_load(storage) {
            Ok(record) => {
                log::info!("Loaded high score {}", record.score());
                record
            }
            Err(PersistenceError::Missing) => {
                log::info!("No high score found, starting fresh");
                Self::default()
            }
            Err(e) => {
                log::warn!("Discarding stored high score: {}", e);
                Self::default()
            }
        }
    }

    /// Write the record to storage
    pub fn try_save(&self, storage: &mut dyn Storage) -> Result<(), PersistenceError> {
        let json = persistence::encode(self)?;
        storage.set_item(Self::STORAGE_KEY, &json)?;
        Ok(())
    }

    /// Save the record (failures are logged, never fatal)
    pub fn save(&self, storage: &mut dyn Storage) {
        match self.try_save(storage) {
            Ok(()) => log::info!("High score saved ({})", self.score()),
            Err(e) => log::warn!("Could not save high score: {}", e),
        }
    }
}
