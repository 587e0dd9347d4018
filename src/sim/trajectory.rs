//! Parabolic flight solve
//!
//! Vertical motion is ballistic: the projectile rises from the start point to
//! the apex and falls to the exit point, with gravity chosen so the whole arc
//! takes the flight duration. Horizontal motion is a constant-acceleration
//! quadratic through the control point's x at the apex time and the end
//! point's x at the flight duration.

use glam::DVec2;

use super::projectile::ProjectileConfig;
use crate::tuning::FlightTuning;

/// Initial conditions for one flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    /// Launch velocity (pixels/s, y down)
    pub velocity: DVec2,
    /// Constant horizontal acceleration (pixels/s²)
    pub horizontal_acceleration: f64,
    /// Downward acceleration (pixels/s²)
    pub gravity: f64,
    /// Radians/s
    pub angular_velocity: f64,
    /// Seconds from launch to apex
    pub time_to_peak: f64,
    /// Effective flight duration (seconds)
    pub duration: f64,
}

impl Trajectory {
    /// Closed-form position `t` seconds after launch from `start`
    pub fn position_at(&self, start: DVec2, t: f64) -> DVec2 {
        let accel = DVec2::new(self.horizontal_acceleration, self.gravity);
        start + self.velocity * t + 0.5 * accel * t * t
    }

    fn is_finite(&self) -> bool {
        self.velocity.is_finite()
            && self.horizontal_acceleration.is_finite()
            && self.gravity.is_finite()
            && self.angular_velocity.is_finite()
            && self.time_to_peak.is_finite()
            && self.duration.is_finite()
    }
}

/// Configured duration raised to the minimum flight time
pub fn flight_duration(duration: f64, tuning: &FlightTuning) -> f64 {
    if duration.is_finite() {
        duration.max(tuning.min_flight_duration)
    } else {
        tuning.min_flight_duration
    }
}

/// Solve launch velocity, accelerations and spin for `config`
pub fn solve_trajectory(config: &ProjectileConfig, tuning: &FlightTuning) -> Trajectory {
    let duration = flight_duration(config.duration, tuning);
    let start = config.start;
    let control = config.control;
    let end = config.end;

    // Vertical: the apex is never lower than `min_rise` above the start
    let peak_y = control.y.min(start.y - tuning.min_rise);
    let upward = (start.y - peak_y).max(tuning.min_travel);
    let downward = (end.y - peak_y).max(tuning.min_travel);

    let gravity = if config.gravity > 0.0 && config.gravity.is_finite() {
        config.gravity
    } else {
        let ascend = (2.0 * upward).sqrt();
        let descend = (2.0 * downward).sqrt();
        ((ascend + descend) / duration)
            .powi(2)
            .clamp(tuning.min_gravity, tuning.max_gravity)
    };

    let vy0 = -(2.0 * gravity * upward).sqrt();
    let t_peak = (-vy0 / gravity).max(tuning.min_time_to_peak);

    // Horizontal: x(t) = vx0·t + ½·ax·t², through (t_peak, Δcontrol) and (T, Δend)
    let (vx0, ax) = solve_horizontal(control.x - start.x, end.x - start.x, t_peak, duration, tuning);

    let trajectory = Trajectory {
        velocity: DVec2::new(vx0, vy0),
        horizontal_acceleration: ax,
        gravity,
        angular_velocity: config.spin / duration.max(0.01),
        time_to_peak: t_peak,
        duration,
    };

    if trajectory.is_finite() {
        trajectory
    } else {
        log::warn!("Non-finite trajectory for {:?}, launching stationary", config);
        Trajectory {
            velocity: DVec2::ZERO,
            horizontal_acceleration: 0.0,
            gravity: tuning.min_gravity,
            angular_velocity: 0.0,
            time_to_peak: tuning.min_time_to_peak,
            duration,
        }
    }
}

/// 2×2 solve for initial horizontal velocity and acceleration
fn solve_horizontal(
    delta_control: f64,
    delta_end: f64,
    t_peak: f64,
    total: f64,
    tuning: &FlightTuning,
) -> (f64, f64) {
    // | t_peak  ½t_peak² | |vx0|   |Δcontrol|
    // | total   ½total²  | |ax | = |Δend    |
    let determinant = 0.5 * t_peak * total * (total - t_peak);

    if determinant.abs() > tuning.solve_epsilon {
        let vx0 = (delta_control * 0.5 * total * total - delta_end * 0.5 * t_peak * t_peak)
            / determinant;
        let ax = (t_peak * delta_end - total * delta_control) / determinant;
        if vx0.is_finite() && ax.is_finite() {
            return (vx0, ax);
        }
    }

    // Degenerate: straight line to the exit point at constant speed
    let vx0 = if total > 0.0 { delta_end / total } else { 0.0 };
    (vx0, 0.0)
}
