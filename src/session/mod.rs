//! Game session state machine
//!
//! Score, combo and lives change only through [`GameSession`] operations, and
//! every change is announced synchronously on the session's [`EventBus`].

pub mod details;
pub mod events;
pub mod game;

pub use details::GameDetails;
pub use events::{EventBus, GameEvent, Subscription};
pub use game::GameSession;
