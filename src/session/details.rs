//! Score snapshot published with every session event

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_MAX_LIVES;

/// Value snapshot of a session. Also the persisted high-score blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameDetails {
    /// Session start (seconds since the Unix epoch)
    pub begin_time: f64,
    pub score: u32,
    /// Consecutive hits since the last miss
    pub combo: u32,
    pub max_combo: u32,
    pub max_lives: u32,
    pub lives: u32,
    /// Set at game over when `score` beat the stored record
    pub is_high_score: bool,
    pub game_started: bool,
    pub game_over: bool,
}

impl Default for GameDetails {
    fn default() -> Self {
        Self::with_max_lives(DEFAULT_MAX_LIVES)
    }
}

impl GameDetails {
    /// Fresh details with a full set of `max_lives`
    pub fn with_max_lives(max_lives: u32) -> Self {
        Self {
            begin_time: 0.0,
            score: 0,
            combo: 0,
            max_combo: 0,
            max_lives,
            lives: max_lives,
            is_high_score: false,
            game_started: false,
            game_over: false,
        }
    }

    /// Lives already lost this session
    pub fn lives_lost(&self) -> u32 {
        self.max_lives.saturating_sub(self.lives)
    }
}
