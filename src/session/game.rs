//! Authoritative score/combo/lives state
//!
//! Every operation applies its whole change first, then publishes: at most one
//! `ScoreUpdate` per operation (none if nothing changed), followed by
//! `GameOver` when the operation ended the game. Publishing finishes before
//! the operation returns, and the emitted events are also returned so the
//! owner can react without subscribing to its own session.

use std::rc::Rc;

use super::details::GameDetails;
use super::events::{EventBus, GameEvent, Subscription};
use crate::audio::{AudioSink, SoundEffect};
use crate::highscores::HighScoreRecord;
use crate::platform::{self, Storage};
use crate::tuning::SessionTuning;

/// The game session state machine
pub struct GameSession {
    details: GameDetails,
    high_score: HighScoreRecord,
    max_lives: u32,
    bus: EventBus,
    storage: Box<dyn Storage>,
    audio: Rc<dyn AudioSink>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("details", &self.details)
            .field("high_score", &self.high_score.score())
            .field("bus", &self.bus)
            .finish()
    }
}

impl GameSession {
    /// Create a session, loading the stored high score from `storage`
    pub fn new(storage: Box<dyn Storage>, audio: Rc<dyn AudioSink>, tuning: &SessionTuning) -> Self {
        let high_score = HighScoreRecord::load(storage.as_ref());
        Self {
            details: GameDetails::with_max_lives(tuning.max_lives),
            high_score,
            max_lives: tuning.max_lives,
            bus: EventBus::new(),
            storage,
            audio,
        }
    }

    /// Attach an event handler
    pub fn subscribe<F>(&mut self, handler: F) -> Subscription
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Current details by value
    pub fn snapshot(&self) -> GameDetails {
        self.details.clone()
    }

    pub fn details(&self) -> &GameDetails {
        &self.details
    }

    pub fn high_score(&self) -> &HighScoreRecord {
        &self.high_score
    }

    pub fn is_over(&self) -> bool {
        self.details.game_over
    }

    /// Reset to a fresh game. Publishes `NewGame` then one `ScoreUpdate`.
    pub fn start_new_game(&mut self) -> Vec<GameEvent> {
        let mut emitted = Vec::with_capacity(2);
        self.details = GameDetails::with_max_lives(self.max_lives);
        self.details.begin_time = platform::unix_time();
        log::info!("New game ({} lives)", self.max_lives);

        self.publish(GameEvent::NewGame, &mut emitted);
        // Always announce the fresh snapshot, even if it equals the previous one
        self.publish(GameEvent::ScoreUpdate(self.details.clone()), &mut emitted);
        emitted
    }

    /// Mark the first interaction of the game (idempotent)
    pub fn mark_started(&mut self) -> Vec<GameEvent> {
        let mut emitted = Vec::new();
        self.update(|d| d.game_started = true, &mut emitted);
        emitted
    }

    /// A projectile was broken
    pub fn hit(&mut self) -> Vec<GameEvent> {
        let mut emitted = Vec::new();
        if self.details.game_over {
            log::debug!("hit() after game over ignored");
            return emitted;
        }

        self.update(
            |d| {
                d.score += 1;
                d.combo += 1;
                d.max_combo = d.max_combo.max(d.combo);
            },
            &mut emitted,
        );
        emitted
    }

    /// A projectile got away: combo resets and a life is lost
    pub fn miss(&mut self) -> Vec<GameEvent> {
        let mut emitted = Vec::new();
        if self.details.game_over {
            log::debug!("miss() after game over ignored");
            return emitted;
        }

        self.audio.play(SoundEffect::LowBattery);

        let record = self.high_score.score();
        self.update(
            |d| {
                d.combo = 0;
                d.lives = d.lives.saturating_sub(1);
                if d.lives == 0 {
                    d.game_over = true;
                    d.is_high_score = d.score > record;
                }
            },
            &mut emitted,
        );

        if self.details.game_over {
            self.finish(&mut emitted);
        }
        emitted
    }

    /// End the game now (app-level stop). No-op if already over.
    pub fn force_game_over(&mut self) -> Vec<GameEvent> {
        let mut emitted = Vec::new();
        if self.details.game_over {
            return emitted;
        }

        let record = self.high_score.score();
        self.update(
            |d| {
                d.game_over = true;
                d.is_high_score = d.score > record;
            },
            &mut emitted,
        );
        self.finish(&mut emitted);
        emitted
    }

    /// Apply a change; publish one `ScoreUpdate` if it changed anything
    fn update(&mut self, mutate: impl FnOnce(&mut GameDetails), emitted: &mut Vec<GameEvent>) {
        let before = self.details.clone();
        mutate(&mut self.details);
        if self.details != before {
            self.publish(GameEvent::ScoreUpdate(self.details.clone()), emitted);
        }
    }

    /// Terminal sequence: publish `GameOver`, then store a qualifying record
    fn finish(&mut self, emitted: &mut Vec<GameEvent>) {
        log::info!(
            "Game over: score {}, max combo {}{}",
            self.details.score,
            self.details.max_combo,
            if self.details.is_high_score { " (new high score)" } else { "" }
        );
        self.publish(GameEvent::GameOver(self.details.clone()), emitted);

        if self.details.is_high_score {
            self.high_score = HighScoreRecord::new(self.details.clone());
            self.high_score.save(self.storage.as_mut());
        }
    }

    fn publish(&mut self, event: GameEvent, emitted: &mut Vec<GameEvent>) {
        self.bus.publish(&event);
        emitted.push(event);
    }
}
