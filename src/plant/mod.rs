use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Plant constants
// ---------------------------------------------------------------------------

/// Empirically tuned constants of the altitude model.
///
/// The values are load-bearing as numbers; they have no derivation beyond
/// matching the behaviour of the bench rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Drive ceiling while climbing (`position < setpoint`).
    pub climb_ceiling: f64,
    /// Drive ceiling at or above the setpoint (gravity assists).
    pub descend_ceiling: f64,
    /// Errors below this use `near_decay`.
    pub near_error: f64,
    pub near_decay: f64,
    /// Errors below this (and not near) use `mid_decay`.
    pub mid_error: f64,
    pub mid_decay: f64,
    pub far_decay: f64,
    /// Per-tick growth applied to the decayed position.
    pub growth: f64,
    /// At or below this error both motors are pinned to `hold_power`.
    pub dead_zone: f64,
    pub hold_power: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            climb_ceiling: 6.0,
            descend_ceiling: 4.0,
            near_error: 10.0,
            near_decay: 0.9849,
            mid_error: 25.0,
            mid_decay: 0.994,
            far_decay: 0.996,
            growth: 1.01398,
            dead_zone: 5.0,
            hold_power: 0.37,
        }
    }
}

impl PlantConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        let fields = [
            ("climb_ceiling", self.climb_ceiling),
            ("descend_ceiling", self.descend_ceiling),
            ("near_error", self.near_error),
            ("near_decay", self.near_decay),
            ("mid_error", self.mid_error),
            ("mid_decay", self.mid_decay),
            ("far_decay", self.far_decay),
            ("growth", self.growth),
            ("dead_zone", self.dead_zone),
            ("hold_power", self.hold_power),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be finite and non-negative, got {}", name, value));
            }
        }
        if self.hold_power > 1.0 {
            return Err(format!("hold_power is a fraction of full power, got {}", self.hold_power));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Plant model
// ---------------------------------------------------------------------------

/// Result of one plant step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantStep {
    pub next_position: f64,
    /// Power actually applied to each motor (hold power inside the dead zone).
    pub applied_power: f64,
}

/// Asymmetric decay/drive altitude model. Unclamped: domain limits belong to
/// the caller.
#[derive(Debug, Clone, Default)]
pub struct Plant {
    config: PlantConfig,
}

impl Plant {
    pub fn new(config: PlantConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    /// `U_max`: larger when climbing than when descending.
    pub fn drive_ceiling(&self, position: f64, setpoint: f64) -> f64 {
        if position < setpoint {
            self.config.climb_ceiling
        } else {
            self.config.descend_ceiling
        }
    }

    /// `FA`: decay factor selected by error magnitude.
    pub fn decay(&self, error: f64) -> f64 {
        let c = &self.config;
        if error < c.near_error {
            c.near_decay
        } else if error < c.mid_error {
            c.mid_decay
        } else {
            c.far_decay
        }
    }

    /// Power fed to both motor channels.
    pub fn applied_power(&self, motor_power: f64, error: f64) -> f64 {
        if error > self.config.dead_zone {
            motor_power
        } else {
            self.config.hold_power
        }
    }

    pub fn step(&self, position: f64, setpoint: f64, motor_power: f64, error: f64) -> PlantStep {
        let u_max = self.drive_ceiling(position, setpoint);
        let fa = self.decay(error);
        let p1 = self.applied_power(motor_power, error);
        let p2 = p1;

        let d = fa * position * self.config.growth + 0.5 * (u_max * p1 + u_max * p2);

        let next_position = if position < setpoint {
            d
        } else {
            // Mirror the same correction downward.
            position - (d - position)
        };

        PlantStep { next_position, applied_power: p1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_bands() {
        let plant = Plant::default();
        assert_eq!(plant.decay(3.0), 0.9849);
        assert_eq!(plant.decay(10.0), 0.994);
        assert_eq!(plant.decay(24.9), 0.994);
        assert_eq!(plant.decay(25.0), 0.996);
        assert_eq!(plant.decay(700.0), 0.996);
    }

    #[test]
    fn ceiling_is_asymmetric() {
        let plant = Plant::default();
        assert_eq!(plant.drive_ceiling(300.0, 1000.0), 6.0);
        assert_eq!(plant.drive_ceiling(1000.0, 1000.0), 4.0);
        assert_eq!(plant.drive_ceiling(1000.0, 1.0), 4.0);
    }

    #[test]
    fn climbing_step_matches_model() {
        let plant = Plant::default();
        let s = plant.step(300.0, 1000.0, 0.6, 700.0);
        let expected = 0.996 * 300.0 * 1.01398 + 0.5 * (6.0 * 0.6 + 6.0 * 0.6);
        assert!((s.next_position - expected).abs() < 1e-9);
        assert_eq!(s.applied_power, 0.6);
    }

    #[test]
    fn climbing_never_falls_below_decay_floor() {
        let plant = Plant::default();
        for &pos in &[1.0, 50.0, 300.0, 900.0, 995.0] {
            for &p in &[0.0, 0.1, 0.5, 1.0] {
                let error = 1000.0 - pos;
                let s = plant.step(pos, 1000.0, p, error);
                assert!(
                    s.next_position >= pos * plant.decay(error),
                    "pos {} power {} -> {}",
                    pos,
                    p,
                    s.next_position
                );
            }
        }
    }

    #[test]
    fn descending_mirrors_correction() {
        let plant = Plant::default();
        let s = plant.step(1000.0, 1.0, 0.5, 999.0);
        let d = 0.996 * 1000.0 * 1.01398 + 0.5 * (4.0 * 0.5 + 4.0 * 0.5);
        assert!((s.next_position - (1000.0 - (d - 1000.0))).abs() < 1e-9);
        assert!(s.next_position < 1000.0);
    }

    #[test]
    fn dead_zone_pins_hold_power() {
        let plant = Plant::default();
        for &p in &[0.0, 0.2, 0.99] {
            assert_eq!(plant.step(998.0, 1000.0, p, 2.0).applied_power, 0.37);
            assert_eq!(plant.step(1000.0, 1000.0, p, 5.0).applied_power, 0.37);
        }
        assert_eq!(plant.step(990.0, 1000.0, 0.2, 10.0).applied_power, 0.2);
    }
}
