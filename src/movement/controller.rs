//! Engine telegraph, rudder authority and speed smoothing
//!
//! One controller per ship, parameterized by the class movement envelope.
//! Commanded speed moves in whole knots through detents that force a stop
//! at neutral; actual speed chases it at the damaged acceleration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::types::Knots;
use crate::damage::effects::Effects;
use crate::ship::profile::Propulsion;

/// Slowest non-zero commanded speed either way
pub const DETENT_KTS: Knots = 5.0;

/// One notch of the engine telegraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedStep {
    Up,
    Down,
}

/// Speed and heading read every simulation step by the motion integrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    pub commanded_kts: Knots,
    pub actual_kts: Knots,
    /// Degrees, 0 to 360, clockwise from north
    pub heading_deg: f64,
    pub desired_heading_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedController {
    envelope: Propulsion,
    state: MovementState,
}

impl SpeedController {
    pub fn new(envelope: Propulsion) -> Self {
        Self {
            envelope,
            state: MovementState::default(),
        }
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.state.heading_deg = normalize_heading(heading_deg);
        self.state.desired_heading_deg = self.state.heading_deg;
        self
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn commanded_kts(&self) -> Knots {
        self.state.commanded_kts
    }

    pub fn actual_kts(&self) -> Knots {
        self.state.actual_kts
    }

    pub fn heading_deg(&self) -> f64 {
        self.state.heading_deg
    }

    pub fn envelope(&self) -> &Propulsion {
        &self.envelope
    }

    fn clamp_to_envelope(&self, kts: Knots) -> Knots {
        let min = self.envelope.min_speed_knots.min(0.0);
        let max = self.envelope.max_speed_knots.max(0.0);
        kts.clamp(min, max)
    }

    /// Set commanded speed from a continuous slider.
    ///
    /// Dead zones snap to the detents: ahead speeds under 5 knots stop,
    /// astern speeds under 5 knots become 5 astern.
    pub fn set_speed_from_slider(&mut self, raw: f64) -> Knots {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let clamped = self.clamp_to_envelope(raw);
        let snapped = if clamped > 0.0 && clamped < DETENT_KTS {
            0.0
        } else if clamped < 0.0 && clamped > -DETENT_KTS {
            -DETENT_KTS
        } else {
            clamped.round()
        };
        self.state.commanded_kts = self.clamp_to_envelope(snapped);
        self.state.commanded_kts
    }

    /// Move the telegraph one notch. Crossing between ahead and astern
    /// always stops at zero first.
    pub fn adjust_speed(&mut self, step: SpeedStep) -> Knots {
        let current = self.state.commanded_kts;
        let next = match step {
            SpeedStep::Up => {
                if current < -DETENT_KTS {
                    current + 1.0
                } else if current < 0.0 {
                    0.0
                } else if current < DETENT_KTS {
                    DETENT_KTS
                } else {
                    current + 1.0
                }
            }
            SpeedStep::Down => {
                if current > DETENT_KTS {
                    current - 1.0
                } else if current > 0.0 {
                    0.0
                } else if current > -DETENT_KTS {
                    -DETENT_KTS
                } else {
                    current - 1.0
                }
            }
        };
        self.state.commanded_kts = self.clamp_to_envelope(next);
        self.state.commanded_kts
    }

    /// Rudder authority at a given speed.
    ///
    /// Zero when stopped, rising linearly to the class value at 5 knots,
    /// then linearly to full authority at top speed.
    pub fn rudder_effectiveness(&self, speed_kts_abs: f64) -> f64 {
        let class_max = self.envelope.max_speed_knots.max(0.0);
        let at_detent = self.envelope.rudder_effectiveness_at_5kts.clamp(0.0, 1.0);
        let speed = if speed_kts_abs.is_finite() {
            speed_kts_abs.abs().min(class_max)
        } else {
            0.0
        };

        let eff = if speed <= DETENT_KTS {
            at_detent * speed / DETENT_KTS
        } else if class_max <= DETENT_KTS {
            at_detent
        } else {
            at_detent + (1.0 - at_detent) * (speed - DETENT_KTS) / (class_max - DETENT_KTS)
        };
        eff.clamp(0.0, 1.0)
    }

    pub fn set_desired_heading(&mut self, heading_deg: f64) {
        if heading_deg.is_finite() {
            self.state.desired_heading_deg = normalize_heading(heading_deg);
        }
    }

    /// Advance speed and heading by `dt` under the current damage effects
    pub fn step(&mut self, dt: Duration, effects: &Effects) {
        let secs = dt.as_secs_f64();
        if secs <= 0.0 {
            return;
        }

        let target = if effects.sunk {
            0.0
        } else {
            let ahead_limit = effects
                .speed_cap_kts
                .min(self.envelope.max_speed_knots * effects.speed_factor)
                .max(0.0);
            let astern_limit = (self.envelope.min_speed_knots * effects.speed_factor).min(0.0);
            self.state.commanded_kts.clamp(astern_limit, ahead_limit)
        };

        let actual = self.state.actual_kts;
        let slowing = target.abs() < actual.abs()
            || (actual != 0.0 && target.signum() != actual.signum());
        // Drag slows the ship whatever state the engines are in
        let rate = if slowing || effects.sunk {
            self.envelope.acceleration_kts_per_s
        } else {
            self.envelope.acceleration_kts_per_s * effects.accel_factor
        };
        let max_delta = rate * secs;
        let delta = (target - actual).clamp(-max_delta, max_delta);
        self.state.actual_kts = actual + delta;

        if effects.sunk {
            return;
        }

        let authority = self.rudder_effectiveness(self.state.actual_kts.abs());
        let base_rate = self.envelope.turn_rate_deg_per_s * effects.turn_rate_factor * authority;

        if let Some(side) = effects.rudder_jam.side() {
            let turned = self.state.heading_deg + side.turn_sign() * base_rate * secs;
            self.state.heading_deg = normalize_heading(turned);
            return;
        }

        let rate = base_rate * effects.rudder_effectiveness_scale;
        let error = shortest_turn(self.state.heading_deg, self.state.desired_heading_deg);
        let max_turn = rate * secs;
        let turn = error.clamp(-max_turn, max_turn);
        self.state.heading_deg = normalize_heading(self.state.heading_deg + turn);
    }
}

fn normalize_heading(deg: f64) -> f64 {
    let h = deg.rem_euclid(360.0);
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Signed degrees from `from` to `to`, in (-180, 180]
fn shortest_turn(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::latch::RudderJam;

    fn envelope() -> Propulsion {
        Propulsion {
            min_speed_knots: -12.0,
            max_speed_knots: 30.0,
            acceleration_kts_per_s: 1.0,
            turn_rate_deg_per_s: 4.0,
            rudder_effectiveness_at_5kts: 0.4,
        }
    }

    #[test]
    fn test_slider_dead_zones() {
        let mut helm = SpeedController::new(envelope());
        assert_eq!(helm.set_speed_from_slider(3.2), 0.0);
        assert_eq!(helm.set_speed_from_slider(-0.5), -5.0);
        assert_eq!(helm.set_speed_from_slider(17.6), 18.0);
        assert_eq!(helm.set_speed_from_slider(99.0), 30.0);
        assert_eq!(helm.set_speed_from_slider(-40.0), -12.0);
        assert_eq!(helm.set_speed_from_slider(f64::NAN), 0.0);
        assert_eq!(helm.commanded_kts(), 0.0);
    }

    #[test]
    fn test_adjust_forces_neutral() {
        let mut helm = SpeedController::new(envelope());
        assert_eq!(helm.adjust_speed(SpeedStep::Up), 5.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Up), 6.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Down), 5.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Down), 0.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Down), -5.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Down), -6.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Up), -5.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Up), 0.0);
    }

    #[test]
    fn test_adjust_clamps_at_limits() {
        let mut helm = SpeedController::new(envelope());
        helm.set_speed_from_slider(30.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Up), 30.0);
        helm.set_speed_from_slider(-12.0);
        assert_eq!(helm.adjust_speed(SpeedStep::Down), -12.0);
    }

    #[test]
    fn test_rudder_curve() {
        let helm = SpeedController::new(envelope());
        assert_eq!(helm.rudder_effectiveness(0.0), 0.0);
        assert!((helm.rudder_effectiveness(2.5) - 0.2).abs() < 1e-9);
        assert!((helm.rudder_effectiveness(5.0) - 0.4).abs() < 1e-9);
        assert!((helm.rudder_effectiveness(17.5) - 0.7).abs() < 1e-9);
        assert_eq!(helm.rudder_effectiveness(30.0), 1.0);
        assert_eq!(helm.rudder_effectiveness(80.0), 1.0);
        assert!((helm.rudder_effectiveness(-5.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_step_accelerates_toward_cap() {
        let mut helm = SpeedController::new(envelope());
        helm.set_speed_from_slider(30.0);
        let mut fx = Effects::pristine(30.0);
        fx.speed_cap_kts = 21.0;
        for _ in 0..40 {
            helm.step(Duration::from_secs(1), &fx);
        }
        assert!((helm.actual_kts() - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrecked_engines_still_coast_down() {
        let mut helm = SpeedController::new(envelope());
        helm.set_speed_from_slider(20.0);
        let fx = Effects::pristine(30.0);
        for _ in 0..20 {
            helm.step(Duration::from_secs(1), &fx);
        }
        let mut wrecked = Effects::pristine(30.0);
        wrecked.speed_factor = 0.0;
        wrecked.accel_factor = 0.0;
        helm.step(Duration::from_secs(5), &wrecked);
        assert!((helm.actual_kts() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_turns_toward_desired_heading() {
        let mut helm = SpeedController::new(envelope()).with_heading(350.0);
        helm.set_speed_from_slider(30.0);
        let fx = Effects::pristine(30.0);
        for _ in 0..30 {
            helm.step(Duration::from_secs(1), &fx);
        }
        helm.set_desired_heading(20.0);
        for _ in 0..30 {
            helm.step(Duration::from_secs(1), &fx);
        }
        assert!((helm.heading_deg() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_jammed_rudder_circles() {
        let mut helm = SpeedController::new(envelope()).with_heading(90.0);
        helm.set_speed_from_slider(30.0);
        let mut fx = Effects::pristine(30.0);
        for _ in 0..30 {
            helm.step(Duration::from_secs(1), &fx);
        }
        fx.rudder_jam = RudderJam::Left;
        fx.rudder_effectiveness_scale = 0.0;
        helm.set_desired_heading(90.0);
        helm.step(Duration::from_secs(1), &fx);
        assert!((helm.heading_deg() - 86.0).abs() < 1e-9);
    }
}
