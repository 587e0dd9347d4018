//! Projectile simulation module
//!
//! All flight logic lives here. This module has no rendering or platform
//! dependencies:
//! - Variable frame deltas, clamped before integration
//! - Seeded RNG only (the spawner owns it)
//! - Stable iteration order (by creation) is the caller's job

pub mod field;
pub mod projectile;
pub mod spawner;
pub mod trajectory;

pub use field::{Field, Pose};
pub use projectile::{
    Projectile, ProjectileConfig, ProjectileId, ProjectileState, Resolution, StepOutcome,
    TapOutcome,
};
pub use spawner::{SpawnContext, Spawner, SymbolInventory};
pub use trajectory::{Trajectory, solve_trajectory};
