//! Spawn scheduling
//!
//! The spawner is a cancellable loop expressed as a countdown: `start` arms a
//! wait, frame deltas run it down, and each wake-up either throws a new
//! projectile or skips (session inactive, live set full, field unusable)
//! before arming the next wait. `stop` simply drops the pending wait, so a
//! cancelled wait never spawns and leaves nothing behind.

use std::f64::consts::PI;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::field::Field;
use super::projectile::ProjectileConfig;
use crate::consts::MAX_LIVE_PROJECTILES;
use crate::tuning::SpawnTuning;

/// Symbol used when the inventory is empty
pub const FALLBACK_SYMBOL: &str = "glass";

/// Named visual identifiers to pick from (the asset manifest)
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInventory {
    symbols: Vec<String>,
}

impl Default for SymbolInventory {
    fn default() -> Self {
        Self::new([
            "bolt", "star", "heart", "flame", "leaf", "drop", "moon", "sun", "snowflake", "cloud",
        ])
    }
}

impl SymbolInventory {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Uniform pick
    pub fn choose(&self, rng: &mut impl Rng) -> String {
        if self.symbols.is_empty() {
            return FALLBACK_SYMBOL.to_string();
        }
        let index = rng.random_range(0..self.symbols.len());
        self.symbols[index].clone()
    }
}

/// What the spawner needs to know about the session at wake-up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnContext {
    pub combo: u32,
    pub field: Field,
    /// Projectiles currently alive
    pub live: usize,
    /// Session running and not over
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Schedule {
    Stopped,
    Waiting { remaining: f64 },
}

/// Decides when to throw and what
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Pcg32,
    tuning: SpawnTuning,
    inventory: SymbolInventory,
    schedule: Schedule,
}

impl Spawner {
    /// Deterministic spawner
    pub fn new(seed: u64, tuning: &SpawnTuning) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            tuning: tuning.clone(),
            inventory: SymbolInventory::default(),
            schedule: Schedule::Stopped,
        }
    }

    /// Spawner seeded from the OS
    pub fn from_entropy(tuning: &SpawnTuning) -> Self {
        Self {
            rng: Pcg32::from_os_rng(),
            ..Self::new(0, tuning)
        }
    }

    pub fn with_inventory(mut self, inventory: SymbolInventory) -> Self {
        self.inventory = inventory;
        self
    }

    /// Begin the loop (no-op if already running)
    pub fn start(&mut self, combo: u32) {
        if self.is_running() {
            return;
        }
        let delay = self.next_delay(combo);
        self.schedule = Schedule::Waiting { remaining: delay };
        log::info!("Spawner started (first throw in {:.2}s)", delay);
    }

    /// Cancel the loop, abandoning the pending wait
    pub fn stop(&mut self) {
        if self.is_running() {
            log::info!("Spawner stopped");
        }
        self.schedule = Schedule::Stopped;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.schedule, Schedule::Waiting { .. })
    }

    /// Seconds until the next wake-up, if running
    pub fn remaining(&self) -> Option<f64> {
        match self.schedule {
            Schedule::Waiting { remaining } => Some(remaining),
            Schedule::Stopped => None,
        }
    }

    /// Run the wait down by `dt`; on wake-up, maybe produce a throw
    pub fn advance(&mut self, dt: f64, ctx: &SpawnContext) -> Option<ProjectileConfig> {
        let Schedule::Waiting { remaining } = &mut self.schedule else {
            return None;
        };
        if dt.is_finite() && dt > 0.0 {
            *remaining -= dt;
        }
        if *remaining > 0.0 {
            return None;
        }

        let delay = self.next_delay(ctx.combo);
        self.schedule = Schedule::Waiting { remaining: delay };

        if !ctx.active {
            return None;
        }
        if ctx.live >= MAX_LIVE_PROJECTILES {
            log::debug!("Spawn skipped: {} projectiles live", ctx.live);
            return None;
        }
        if !ctx.field.is_usable() {
            log::debug!("Spawn skipped: field {:?} unusable", ctx.field);
            return None;
        }

        Some(self.make_config(ctx.field, ctx.combo))
    }

    /// Wait before the next throw; shrinks as the combo grows
    pub fn next_delay(&mut self, combo: u32) -> f64 {
        let t = &self.tuning;
        let base = (t.base_delay - t.delay_per_combo * combo as f64).max(t.min_base_delay);
        let (jitter, floor) = (t.delay_jitter, t.min_delay);
        (base + uniform(&mut self.rng, -jitter, jitter)).max(floor)
    }

    /// Randomized throw across `field`
    pub fn make_config(&mut self, field: Field, combo: u32) -> ProjectileConfig {
        let t = self.tuning.clone();
        let (width, height) = (field.width, field.height);

        let size = uniform(&mut self.rng, t.min_size, t.max_size);
        let padding = size / 2.0 + t.edge_padding;

        let start_x = self.random_x(width, padding);
        let end_x = self.random_x(width, padding);
        let start_y = height + size;
        let end_y = height + size * 0.6;

        let min_peak = (height * t.apex_min_fraction).max(t.apex_min_pixels);
        let max_peak = (height * t.apex_max_fraction).max(min_peak + t.apex_band_pixels);
        let control_y = uniform(
            &mut self.rng,
            min_peak,
            max_peak.min(height * t.apex_ceiling_fraction),
        );
        let drift = width * t.lateral_drift_fraction;
        let control_x = (start_x + end_x) / 2.0 + uniform(&mut self.rng, -drift, drift);

        let base_duration =
            (t.base_duration - t.duration_per_combo * combo as f64).max(t.min_base_duration);
        let duration = (base_duration
            + uniform(&mut self.rng, -t.duration_jitter, t.duration_jitter))
        .max(t.min_duration);
        let spin = uniform(&mut self.rng, -PI, PI) * t.spin_scale;

        ProjectileConfig {
            size: DVec2::splat(size),
            start: DVec2::new(start_x, start_y),
            control: DVec2::new(control_x, control_y),
            end: DVec2::new(end_x, end_y),
            duration,
            spin,
            gravity: 0.0,
            symbol: self.inventory.choose(&mut self.rng),
        }
    }

    /// Horizontal position inside the padded field (centre if too narrow)
    fn random_x(&mut self, width: f64, padding: f64) -> f64 {
        if width > padding * 2.0 {
            uniform(&mut self.rng, padding, width - padding)
        } else {
            width / 2.0
        }
    }
}

/// Uniform sample from `[lo, hi]`; `lo` when the range is empty or invalid
fn uniform(rng: &mut Pcg32, lo: f64, hi: f64) -> f64 {
    if lo < hi {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(field: Field) -> SpawnContext {
        SpawnContext {
            combo: 0,
            field,
            live: 0,
            active: true,
        }
    }

    /// Advance in 10ms slices until the next wake-up
    fn advance_to_wake(spawner: &mut Spawner, ctx: &SpawnContext) -> Option<ProjectileConfig> {
        let mut waited = 0.0;
        loop {
            let before = spawner.remaining().expect("spawner running");
            let result = spawner.advance(0.01, ctx);
            waited += 0.01;
            if result.is_some() || spawner.remaining().unwrap_or(0.0) > before {
                return result;
            }
            assert!(waited < 5.0, "no wake-up within 5s");
        }
    }

    #[test]
    fn test_delay_bounds() {
        let mut spawner = Spawner::new(1, &SpawnTuning::default());
        for _ in 0..500 {
            let d = spawner.next_delay(0);
            assert!((1.45..=1.75).contains(&d), "combo 0 delay {d}");
        }
        for _ in 0..500 {
            let d = spawner.next_delay(100);
            assert!((0.8..=1.1).contains(&d), "combo 100 delay {d}");
        }
    }

    #[test]
    fn test_delay_floor_applies() {
        let tuning = SpawnTuning {
            min_base_delay: 0.1,
            ..SpawnTuning::default()
        };
        let mut spawner = Spawner::new(2, &tuning);
        for _ in 0..200 {
            assert!(spawner.next_delay(1000) >= 0.6);
        }
    }

    #[test]
    fn test_start_is_idempotent_and_stop_cancels() {
        let mut spawner = Spawner::new(3, &SpawnTuning::default());
        assert!(!spawner.is_running());
        assert!(spawner.advance(10.0, &ctx(Field::new(400.0, 800.0))).is_none());

        spawner.start(0);
        let pending = spawner.remaining();
        spawner.start(0);
        assert_eq!(spawner.remaining(), pending);

        spawner.advance(0.5, &ctx(Field::new(400.0, 800.0)));
        spawner.stop();
        assert!(!spawner.is_running());
        // A cancelled wait never spawns
        assert!(spawner.advance(10.0, &ctx(Field::new(400.0, 800.0))).is_none());
    }

    #[test]
    fn test_wake_spawns_and_rearms() {
        let field = Field::new(400.0, 800.0);
        let mut spawner = Spawner::new(4, &SpawnTuning::default());
        spawner.start(0);

        let config = advance_to_wake(&mut spawner, &ctx(field));
        assert!(config.is_some());
        assert!(spawner.is_running());
        assert!(spawner.remaining().unwrap() >= 0.6);
    }

    #[test]
    fn test_wake_skips_when_blocked() {
        let field = Field::new(400.0, 800.0);
        let blocked = [
            SpawnContext { active: false, ..ctx(field) },
            SpawnContext { live: MAX_LIVE_PROJECTILES, ..ctx(field) },
            SpawnContext { field: Field::new(1.0, 800.0), ..ctx(field) },
        ];

        for context in blocked {
            let mut spawner = Spawner::new(5, &SpawnTuning::default());
            spawner.start(0);
            assert!(advance_to_wake(&mut spawner, &context).is_none());
            // Still looping
            assert!(spawner.is_running());
        }
    }

    #[test]
    fn test_same_seed_same_throws() {
        let field = Field::new(390.0, 700.0);
        let mut a = Spawner::new(99, &SpawnTuning::default());
        let mut b = Spawner::new(99, &SpawnTuning::default());
        for combo in 0..5 {
            assert_eq!(a.make_config(field, combo), b.make_config(field, combo));
        }
    }

    #[test]
    fn test_narrow_field_throws_from_centre() {
        let mut spawner = Spawner::new(6, &SpawnTuning::default());
        let config = spawner.make_config(Field::new(100.0, 600.0), 0);
        assert_eq!(config.start.x, 50.0);
        assert_eq!(config.end.x, 50.0);
    }

    #[test]
    fn test_empty_inventory_uses_fallback() {
        let mut spawner = Spawner::new(7, &SpawnTuning::default())
            .with_inventory(SymbolInventory::new(Vec::<String>::new()));
        let config = spawner.make_config(Field::new(400.0, 800.0), 0);
        assert_eq!(config.symbol, FALLBACK_SYMBOL);
    }

    mod proptest_spawner {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Throw geometry stays within the documented bands
            #[test]
            fn config_within_bounds(
                seed in any::<u64>(),
                width in 2.0..3000.0f64,
                height in 2.0..3000.0f64,
                combo in 0u32..200,
            ) {
                let tuning = SpawnTuning::default();
                let inventory = SymbolInventory::default();
                let mut spawner = Spawner::new(seed, &tuning);
                let c = spawner.make_config(Field::new(width, height), combo);

                let size = c.size.x;
                prop_assert!((80.0..=120.0).contains(&size));
                prop_assert_eq!(c.size.x, c.size.y);

                let padding = size / 2.0 + 24.0;
                for x in [c.start.x, c.end.x] {
                    if width > padding * 2.0 {
                        prop_assert!(x >= padding && x <= width - padding);
                    } else {
                        prop_assert_eq!(x, width / 2.0);
                    }
                }
                prop_assert!((c.start.y - (height + size)).abs() < 1e-9);
                prop_assert!((c.end.y - (height + size * 0.6)).abs() < 1e-9);

                let min_peak = (height * 0.08).max(32.0);
                prop_assert!(c.control.y >= min_peak);
                prop_assert!(c.control.y <= min_peak.max(height * 0.6));

                let mid = (c.start.x + c.end.x) / 2.0;
                prop_assert!((c.control.x - mid).abs() <= width * 0.25 + 1e-9);

                prop_assert!(c.duration >= 0.8);
                prop_assert!(c.duration <= 1.7 + 0.12 + 1e-9);
                prop_assert!(c.spin.abs() <= PI * 1.5 + 1e-9);
                prop_assert_eq!(c.gravity, 0.0);
                prop_assert!(inventory.contains(&c.symbol));
            }
        }
    }
}
