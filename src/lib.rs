//! Break Glass - real-time core of a tap-to-break arcade game
//!
//! Core modules:
//! - `session`: Score/combo/lives state machine and its event bus
//! - `sim`: Projectile trajectories, per-frame integration and spawn scheduling
//! - `controller`: Glue between session events, the spawner and live projectiles
//! - `clock`: Frame tick deltas and the hop onto the control thread
//! - `audio`, `render`: Fire-and-forget collaborator interfaces
//! - `highscores`, `persistence`, `platform`: Single high-score record and storage
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod clock;
pub mod controller;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use clock::{FrameClock, FrameTick, TickInbox, TickSender, tick_channel};
pub use controller::SessionController;
pub use highscores::HighScoreRecord;
pub use render::RenderSink;
pub use session::{EventBus, GameDetails, GameEvent, GameSession, Subscription};
pub use settings::Settings;
pub use sim::{Field, Projectile, ProjectileConfig, ProjectileState, Resolution, Spawner};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Maximum number of projectiles alive at once
    pub const MAX_LIVE_PROJECTILES: usize = 4;
    /// Lives granted at the start of a session
    pub const DEFAULT_MAX_LIVES: u32 = 3;

    /// Substitute frame delta floor (120 Hz) for the first tick or a clock jump
    pub const MIN_FRAME_DT: f64 = 1.0 / 120.0;
    /// Largest frame delta fed into physics (avoids blow-ups after long pauses)
    pub const MAX_FRAME_DT: f64 = 1.0 / 30.0;

    /// Fraction of the projectile size used as its tappable radius
    pub const HIT_SIZE_SCALE: f64 = 0.85;
}
