//! Data-driven game balance
//!
//! Every pacing constant lives here so a build can ship different feel
//! without touching simulation code. Missing JSON fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_MAX_LIVES;

/// Spawn pacing and throw geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Delay before the first throw at combo 0 (seconds)
    pub base_delay: f64,
    /// Delay shaved off per combo point
    pub delay_per_combo: f64,
    /// Floor for the combo-scaled delay
    pub min_base_delay: f64,
    /// Uniform jitter applied to the delay (±)
    pub delay_jitter: f64,
    /// Hard floor for the jittered delay
    pub min_delay: f64,

    /// Flight duration at combo 0 (seconds)
    pub base_duration: f64,
    /// Duration shaved off per combo point
    pub duration_per_combo: f64,
    /// Floor for the combo-scaled duration
    pub min_base_duration: f64,
    /// Uniform jitter applied to the duration (±)
    pub duration_jitter: f64,
    /// Hard floor for the jittered duration
    pub min_duration: f64,

    /// Projectile edge length range (pixels, square)
    pub min_size: f64,
    pub max_size: f64,
    /// Extra horizontal padding beyond half the size
    pub edge_padding: f64,
    /// Apex band as fractions of field height (from the top)
    pub apex_min_fraction: f64,
    pub apex_max_fraction: f64,
    pub apex_ceiling_fraction: f64,
    /// Absolute apex floor and minimum band width (pixels)
    pub apex_min_pixels: f64,
    pub apex_band_pixels: f64,
    /// Lateral drift of the apex as a fraction of field width (±)
    pub lateral_drift_fraction: f64,
    /// Spin range multiplier applied to uniform[-π, π]
    pub spin_scale: f64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            base_delay: 1.6,
            delay_per_combo: 0.04,
            min_base_delay: 0.95,
            delay_jitter: 0.15,
            min_delay: 0.6,

            base_duration: 1.7,
            duration_per_combo: 0.05,
            min_base_duration: 0.9,
            duration_jitter: 0.12,
            min_duration: 0.8,

            min_size: 80.0,
            max_size: 120.0,
            edge_padding: 24.0,
            apex_min_fraction: 0.08,
            apex_max_fraction: 0.28,
            apex_ceiling_fraction: 0.6,
            apex_min_pixels: 32.0,
            apex_band_pixels: 24.0,
            lateral_drift_fraction: 0.25,
            spin_scale: 1.5,
        }
    }
}

impl SpawnTuning {
    /// Replace values the spawner can't work with by their defaults
    pub fn sanitize(mut self) -> Self {
        let d = Self::default();
        for (value, default, name) in [
            (&mut self.base_delay, d.base_delay, "spawn.base_delay"),
            (&mut self.delay_per_combo, d.delay_per_combo, "spawn.delay_per_combo"),
            (&mut self.min_base_delay, d.min_base_delay, "spawn.min_base_delay"),
            (&mut self.delay_jitter, d.delay_jitter, "spawn.delay_jitter"),
            (&mut self.base_duration, d.base_duration, "spawn.base_duration"),
            (&mut self.duration_per_combo, d.duration_per_combo, "spawn.duration_per_combo"),
            (&mut self.min_base_duration, d.min_base_duration, "spawn.min_base_duration"),
            (&mut self.duration_jitter, d.duration_jitter, "spawn.duration_jitter"),
            (&mut self.edge_padding, d.edge_padding, "spawn.edge_padding"),
            (&mut self.apex_min_fraction, d.apex_min_fraction, "spawn.apex_min_fraction"),
            (&mut self.apex_max_fraction, d.apex_max_fraction, "spawn.apex_max_fraction"),
            (&mut self.apex_ceiling_fraction, d.apex_ceiling_fraction, "spawn.apex_ceiling_fraction"),
            (&mut self.apex_min_pixels, d.apex_min_pixels, "spawn.apex_min_pixels"),
            (&mut self.apex_band_pixels, d.apex_band_pixels, "spawn.apex_band_pixels"),
            (&mut self.lateral_drift_fraction, d.lateral_drift_fraction, "spawn.lateral_drift_fraction"),
            (&mut self.spin_scale, d.spin_scale, "spawn.spin_scale"),
        ] {
            check(value, default, name, |v| v >= 0.0);
        }
        check(&mut self.min_delay, d.min_delay, "spawn.min_delay", |v| v > 0.0);
        check(&mut self.min_duration, d.min_duration, "spawn.min_duration", |v| v > 0.0);
        check(&mut self.min_size, d.min_size, "spawn.min_size", |v| v > 0.0);
        check(&mut self.max_size, d.max_size, "spawn.max_size", |v| v > 0.0);
        if self.min_size > self.max_size {
            log::warn!(
                "Tuning spawn size range {}..{} is inverted, using defaults",
                self.min_size,
                self.max_size
            );
            self.min_size = d.min_size;
            self.max_size = d.max_size;
        }
        self
    }
}

/// Trajectory solve and per-projectile feel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightTuning {
    /// Auto-derived gravity is clamped into this band (pixels/s²)
    pub min_gravity: f64,
    pub max_gravity: f64,
    /// Configured durations below this are raised to it (seconds)
    pub min_flight_duration: f64,
    /// Apex is always at least this far above the start point (pixels)
    pub min_rise: f64,
    /// Floor for the upward/downward travel used by the gravity solve
    pub min_travel: f64,
    /// Floor for time-to-apex (seconds)
    pub min_time_to_peak: f64,
    /// Determinant magnitude below which the horizontal solve falls back
    pub solve_epsilon: f64,

    /// Slowdown added per tap and its cap
    pub slowdown_increment: f64,
    pub max_slowdown: f64,
    /// Taps needed to break a projectile
    pub crack_stages: u32,

    /// Fade windows (wall-clock seconds)
    pub fade_in: f64,
    pub fade_out: f64,
}

impl Default for FlightTuning {
    fn default() -> Self {
        Self {
            min_gravity: 280.0,
            max_gravity: 3600.0,
            min_flight_duration: 0.35,
            min_rise: 20.0,
            min_travel: 12.0,
            min_time_to_peak: 0.05,
            solve_epsilon: 1e-4,

            slowdown_increment: 0.18,
            max_slowdown: 1.9,
            crack_stages: 4,

            fade_in: 0.18,
            fade_out: 0.22,
        }
    }
}

impl FlightTuning {
    /// Replace values the integrator can't work with by their defaults
    ///
    /// Slowdown never drops below 1, gravity stays positive and fade windows
    /// are never negative.
    pub fn sanitize(mut self) -> Self {
        let d = Self::default();
        check(&mut self.min_gravity, d.min_gravity, "flight.min_gravity", |v| v > 0.0);
        check(&mut self.max_gravity, d.max_gravity, "flight.max_gravity", |v| v > 0.0);
        if self.max_gravity < self.min_gravity {
            log::warn!(
                "Tuning gravity range {}..{} is inverted, using defaults",
                self.min_gravity,
                self.max_gravity
            );
            self.min_gravity = d.min_gravity;
            self.max_gravity = d.max_gravity;
        }
        check(&mut self.min_flight_duration, d.min_flight_duration, "flight.min_flight_duration", |v| v > 0.0);
        check(&mut self.min_rise, d.min_rise, "flight.min_rise", |v| v >= 0.0);
        check(&mut self.min_travel, d.min_travel, "flight.min_travel", |v| v > 0.0);
        check(&mut self.min_time_to_peak, d.min_time_to_peak, "flight.min_time_to_peak", |v| v > 0.0);
        check(&mut self.solve_epsilon, d.solve_epsilon, "flight.solve_epsilon", |v| v >= 0.0);
        check(&mut self.slowdown_increment, d.slowdown_increment, "flight.slowdown_increment", |v| v >= 0.0);
        check(&mut self.max_slowdown, d.max_slowdown, "flight.max_slowdown", |v| v >= 1.0);
        check(&mut self.fade_in, d.fade_in, "flight.fade_in", |v| v >= 0.0);
        check(&mut self.fade_out, d.fade_out, "flight.fade_out", |v| v >= 0.0);
        if self.crack_stages == 0 {
            log::warn!("Tuning flight.crack_stages is 0, using {}", d.crack_stages);
            self.crack_stages = d.crack_stages;
        }
        self
    }
}

/// Session rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    pub max_lives: u32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            max_lives: DEFAULT_MAX_LIVES,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub spawn: SpawnTuning,
    pub flight: FlightTuning,
    pub session: SessionTuning,
}

impl Tuning {
    /// Parse a (possibly partial) tuning sheet; unusable values fall back
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Self = serde_json::from_str(json)?;
        Ok(tuning.sanitize())
    }

    /// Replace unusable values by their defaults, logging each one
    pub fn sanitize(self) -> Self {
        let mut session = self.session;
        if session.max_lives == 0 {
            log::warn!("Tuning session.max_lives is 0, using {}", DEFAULT_MAX_LIVES);
            session.max_lives = DEFAULT_MAX_LIVES;
        }
        Self {
            spawn: self.spawn.sanitize(),
            flight: self.flight.sanitize(),
            session,
        }
    }

    /// Parse a tuning sheet, logging and falling back to defaults on error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Invalid tuning sheet ({}), using defaults", e);
                Self::default()
            }
        }
    }
}

/// Reset `value` to `default` unless it is finite and passes `valid`
fn check(value: &mut f64, default: f64, name: &str, valid: impl Fn(f64) -> bool) {
    if !(value.is_finite() && valid(*value)) {
        log::warn!("Tuning {} = {} is out of range, using {}", name, value, default);
        *value = default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Projectile, ProjectileConfig};
    use glam::DVec2;

    fn throw() -> ProjectileConfig {
        ProjectileConfig {
            size: DVec2::splat(100.0),
            start: DVec2::new(200.0, 900.0),
            control: DVec2::new(250.0, 200.0),
            end: DVec2::new(320.0, 860.0),
            duration: 1.5,
            spin: 0.0,
            gravity: 0.0,
            symbol: "star".to_string(),
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "flight": { "max_slowdown": 2.5 } }"#).unwrap();
        assert_eq!(tuning.flight.max_slowdown, 2.5);
        assert_eq!(tuning.flight.slowdown_increment, 0.18);
        assert_eq!(tuning.spawn, SpawnTuning::default());
        assert_eq!(tuning.session.max_lives, 3);
    }

    #[test]
    fn test_slowdown_below_one_falls_back() {
        let tuning = Tuning::from_json(r#"{ "flight": { "max_slowdown": 0.5 } }"#).unwrap();
        assert_eq!(tuning.flight.max_slowdown, 1.9);

        // A tap only ever slows a flight down
        let mut projectile = Projectile::new(1, throw(), &tuning.flight);
        projectile.deploy();
        projectile.tap();
        assert!(projectile.slowdown() >= 1.0);
        projectile.step(1.0 / 60.0);
        assert!(projectile.elapsed() <= 1.0 / 60.0);
    }

    #[test]
    fn test_zero_slowdown_cap_keeps_projectiles_flying() {
        let tuning = Tuning::from_json_or_default(r#"{ "flight": { "max_slowdown": 0 } }"#);
        assert_eq!(tuning.flight.max_slowdown, 1.9);

        let mut projectile = Projectile::new(1, throw(), &tuning.flight);
        projectile.deploy();
        projectile.tap();
        let outcome = projectile.step(1.0 / 60.0);
        assert_eq!(outcome.resolved, None);
        assert!(projectile.is_flying());
        assert!(projectile.position().is_finite());
    }

    #[test]
    fn test_other_out_of_range_values_fall_back() {
        let json = r#"{
            "spawn": { "min_size": 150, "max_size": 100, "min_delay": -1 },
            "flight": { "min_gravity": 0, "slowdown_increment": -0.2, "fade_out": -1, "crack_stages": 0 },
            "session": { "max_lives": 0 }
        }"#;
        let tuning = Tuning::from_json(json).unwrap();
        let spawn = SpawnTuning::default();
        let flight = FlightTuning::default();

        assert_eq!((tuning.spawn.min_size, tuning.spawn.max_size), (spawn.min_size, spawn.max_size));
        assert_eq!(tuning.spawn.min_delay, spawn.min_delay);
        assert_eq!(tuning.flight.min_gravity, flight.min_gravity);
        assert_eq!(tuning.flight.slowdown_increment, flight.slowdown_increment);
        assert_eq!(tuning.flight.fade_out, flight.fade_out);
        assert_eq!(tuning.flight.crack_stages, flight.crack_stages);
        assert_eq!(tuning.session.max_lives, 3);
    }

    #[test]
    fn test_valid_overrides_survive_sanitize() {
        let tuning = Tuning::from_json(r#"{ "flight": { "max_slowdown": 1.0, "fade_in": 0 } }"#).unwrap();
        assert_eq!(tuning.flight.max_slowdown, 1.0);
        assert_eq!(tuning.flight.fade_in, 0.0);
        assert_eq!(Tuning::default().sanitize(), Tuning::default());
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let tuning = Tuning::from_json_or_default("{ not json");
        assert_eq!(tuning, Tuning::default());
    }
}
