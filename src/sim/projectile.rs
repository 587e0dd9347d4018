//! A single thrown projectile
//!
//! Lifecycle: `Idle` → `Flying` → `Resolved(Hit | Miss | Cancel)`.
//! - Hit and Cancel stop integration and are removed at once.
//! - Miss keeps integrating while it fades out, then is removed.
//!
//! Removal is reported exactly once, through the `removed` flag of the
//! [`StepOutcome`] that caused it.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::field::Pose;
use super::trajectory::solve_trajectory;
use crate::consts::{HIT_SIZE_SCALE, MAX_FRAME_DT};
use crate::tuning::FlightTuning;

/// Creation-order identifier, unique per controller
pub type ProjectileId = u64;

/// Creation-time description of a throw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileConfig {
    /// Bounding box (pixels)
    pub size: DVec2,
    /// Launch point (below the field)
    pub start: DVec2,
    /// Apex target
    pub control: DVec2,
    /// Exit point (below the field)
    pub end: DVec2,
    /// Flight duration (seconds)
    pub duration: f64,
    /// Total rotation over the flight (radians)
    pub spin: f64,
    /// Downward acceleration; 0 derives it from the arc and duration
    pub gravity: f64,
    /// Visual symbol from the asset inventory
    pub symbol: String,
}

/// How a flight ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// Player broke it
    Hit,
    /// Timed out or left through the top
    Miss,
    /// Torn down with the session; counts as nothing
    Cancel,
}

/// Flight state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileState {
    Idle,
    Flying,
    Resolved(Resolution),
}

/// What happened during one call into a projectile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Set on the call that resolved the flight
    pub resolved: Option<Resolution>,
    /// Set on the call that finished the projectile; it must be dropped
    pub removed: bool,
}

/// Result of a player tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Not flying
    Ignored,
    /// Slowed down and cracked, still flying
    Cracked { stage: u32 },
    /// Final crack: resolved as a hit and removed
    Broken,
}

/// One thrown target: state machine plus semi-implicit Euler integrator
#[derive(Debug, Clone)]
pub struct Projectile {
    id: ProjectileId,
    config: ProjectileConfig,
    tuning: FlightTuning,
    state: ProjectileState,

    position: DVec2,
    velocity: DVec2,
    horizontal_acceleration: f64,
    gravity: f64,
    angular_velocity: f64,
    rotation: f64,
    alpha: f64,

    /// Effective flight duration
    duration: f64,
    /// Flight time, stretched by slowdown
    elapsed: f64,
    /// Wall time since deploy (drives fade-in)
    fade_in_elapsed: f64,
    /// Wall time since a miss (drives fade-out)
    fade_out_elapsed: Option<f64>,

    slowdown: f64,
    cracks: u32,
    removed: bool,
}

impl Projectile {
    pub fn new(id: ProjectileId, config: ProjectileConfig, tuning: &FlightTuning) -> Self {
        let position = config.start;
        Self {
            id,
            config,
            tuning: tuning.clone(),
            state: ProjectileState::Idle,
            position,
            velocity: DVec2::ZERO,
            horizontal_acceleration: 0.0,
            gravity: 0.0,
            angular_velocity: 0.0,
            rotation: 0.0,
            alpha: 0.0,
            duration: 0.0,
            elapsed: 0.0,
            fade_in_elapsed: 0.0,
            fade_out_elapsed: None,
            slowdown: 1.0,
            cracks: 0,
            removed: false,
        }
    }

    /// Solve the flight and start flying. Only an idle projectile deploys.
    pub fn deploy(&mut self) -> bool {
        if self.state != ProjectileState::Idle {
            return false;
        }

        let trajectory = solve_trajectory(&self.config, &self.tuning);
        self.state = ProjectileState::Flying;
        self.position = self.config.start;
        self.velocity = trajectory.velocity;
        self.horizontal_acceleration = trajectory.horizontal_acceleration;
        self.gravity = trajectory.gravity;
        self.angular_velocity = trajectory.angular_velocity;
        self.duration = trajectory.duration;
        self.rotation = 0.0;
        self.alpha = 0.0;
        self.elapsed = 0.0;
        self.fade_in_elapsed = 0.0;
        self.fade_out_elapsed = None;
        self.slowdown = 1.0;
        self.cracks = 0;

        log::debug!(
            "Projectile {} deployed: T={:.2}s g={:.0} v=({:.0}, {:.0})",
            self.id,
            self.duration,
            self.gravity,
            self.velocity.x,
            self.velocity.y
        );
        true
    }

    /// Advance by one frame of `dt` wall-clock seconds
    pub fn step(&mut self, dt: f64) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        if self.removed {
            return outcome;
        }

        let clamped = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        let effective = clamped / self.slowdown;

        match self.state {
            ProjectileState::Flying => {
                self.elapsed += effective;
                self.integrate(effective);
                if !self.is_finite() {
                    return self.discard();
                }

                let off_top = self.position.y < -self.config.size.y;
                if off_top || self.elapsed >= self.duration {
                    outcome.resolved = Some(self.resolve(Resolution::Miss));
                }
            }
            ProjectileState::Resolved(Resolution::Miss) => {
                self.integrate(effective);
                if !self.is_finite() {
                    return self.discard();
                }
            }
            ProjectileState::Idle | ProjectileState::Resolved(_) => return outcome,
        }

        self.update_appearance(clamped);
        outcome.removed = self.removed;
        outcome
    }

    /// Player tap: slow the flight down and crack the glass
    pub fn tap(&mut self) -> TapOutcome {
        if self.state != ProjectileState::Flying {
            return TapOutcome::Ignored;
        }

        self.slowdown = (self.slowdown + self.tuning.slowdown_increment).min(self.tuning.max_slowdown);
        self.cracks += 1;

        if self.cracks >= self.tuning.crack_stages {
            self.shatter();
            TapOutcome::Broken
        } else {
            TapOutcome::Cracked { stage: self.cracks }
        }
    }

    /// Break signal: resolve as a hit and remove
    pub fn shatter(&mut self) -> StepOutcome {
        if self.state != ProjectileState::Flying {
            return StepOutcome::default();
        }
        let resolved = self.resolve(Resolution::Hit);
        StepOutcome {
            resolved: Some(resolved),
            removed: self.removed,
        }
    }

    /// Session teardown: stop immediately, no hit/miss, remove
    pub fn cancel(&mut self) -> StepOutcome {
        if self.removed {
            return StepOutcome::default();
        }

        let mut outcome = StepOutcome::default();
        if matches!(self.state, ProjectileState::Idle | ProjectileState::Flying) {
            outcome.resolved = Some(self.resolve(Resolution::Cancel));
        }
        self.alpha = 0.0;
        self.removed = true;
        outcome.removed = true;
        outcome
    }

    fn resolve(&mut self, resolution: Resolution) -> Resolution {
        self.state = ProjectileState::Resolved(resolution);
        match resolution {
            Resolution::Hit | Resolution::Cancel => {
                self.removed = true;
            }
            Resolution::Miss => {
                // Fade out at normal speed
                self.slowdown = 1.0;
                self.fade_out_elapsed.get_or_insert(0.0);
            }
        }
        log::debug!("Projectile {} resolved: {:?}", self.id, resolution);
        resolution
    }

    /// Drop a projectile whose state went non-finite
    fn discard(&mut self) -> StepOutcome {
        log::warn!("Projectile {} produced non-finite state, discarding", self.id);
        let resolved = (self.state == ProjectileState::Flying).then_some(Resolution::Cancel);
        if resolved.is_some() {
            self.state = ProjectileState::Resolved(Resolution::Cancel);
        }
        self.alpha = 0.0;
        self.removed = true;
        StepOutcome {
            resolved,
            removed: true,
        }
    }

    /// Semi-implicit Euler: velocity first, then position with the new velocity
    fn integrate(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        self.velocity += DVec2::new(self.horizontal_acceleration, self.gravity) * dt;
        self.position += self.velocity * dt;
        self.rotation += self.angular_velocity * dt;
    }

    fn update_appearance(&mut self, wall_dt: f64) {
        if let Some(elapsed) = self.fade_out_elapsed.as_mut() {
            *elapsed += wall_dt;
            let progress = fade_progress(*elapsed, self.tuning.fade_out);
            self.alpha = self.alpha.min(1.0 - progress).max(0.0);
            if progress >= 1.0 {
                self.removed = true;
            }
        } else {
            self.fade_in_elapsed += wall_dt;
            let progress = fade_progress(self.fade_in_elapsed, self.tuning.fade_in);
            self.alpha = self.alpha.max(progress);
        }
    }

    fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.rotation.is_finite()
    }

    /// True if `point` lands on the projectile's tappable disc
    pub fn contains(&self, point: DVec2) -> bool {
        let radius = 0.5 * self.config.size.max_element() * HIT_SIZE_SCALE;
        self.position.distance_squared(point) <= radius * radius
    }

    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            rotation: self.rotation,
            alpha: self.alpha,
        }
    }

    pub fn id(&self) -> ProjectileId {
        self.id
    }

    pub fn config(&self) -> &ProjectileConfig {
        &self.config
    }

    pub fn state(&self) -> ProjectileState {
        self.state
    }

    pub fn is_flying(&self) -> bool {
        self.state == ProjectileState::Flying
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn slowdown(&self) -> f64 {
        self.slowdown
    }

    pub fn cracks(&self) -> u32 {
        self.cracks
    }

    /// Flight time so far (slowed)
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Effective flight duration (valid once deployed)
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

fn fade_progress(elapsed: f64, window: f64) -> f64 {
    if window <= 0.0 {
        1.0
    } else {
        (elapsed / window).min(1.0)
    }
}
