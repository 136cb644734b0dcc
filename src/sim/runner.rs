use serde::Serialize;
use tracing::debug;

use crate::control::{Controller, FuzzyController};
use crate::error::Result;
use crate::plant::{Plant, PlantConfig};
use crate::telemetry::Telemetry;
use super::command::{Command, PendingCommands};
use super::event::{EventDetector, SetpointDetector, SimEvent};
use super::mode::{Limits, ModeController};
use super::state::{ControllerState, Mode};

// ---------------------------------------------------------------------------
// Tick output
// ---------------------------------------------------------------------------

/// Snapshot of one tick, after commands, inference and plant step.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub mode: Mode,
    pub position: f64,
    pub setpoint: Option<f64>,
    /// Absolute error; `None` while idle or in free movement.
    pub error: Option<f64>,
    pub delta_error: Option<f64>,
    /// Power applied to the motors, fraction of full throttle.
    pub motor_power: f64,
    #[serde(skip)]
    pub events: Vec<SimEvent>,
}

impl TickReport {
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            tick: self.tick,
            position: self.position,
            motor_power_percent: self.motor_power * 100.0,
            error: self.error,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator: one owned state + controller + plant
// ---------------------------------------------------------------------------

pub struct Simulator<C: Controller> {
    state: ControllerState,
    plant: Plant,
    modes: ModeController,
    controller: C,
    detector: SetpointDetector,
}

impl<C: Controller> Simulator<C> {
    pub fn new(state: ControllerState, plant: Plant, modes: ModeController, controller: C) -> Self {
        let detector = SetpointDetector::new(plant.config().dead_zone);
        Self { state, plant, modes, controller, detector }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn into_state(self) -> ControllerState {
        self.state
    }

    /// Advance one tick. `commands` must already be coalesced; they are
    /// applied in the order given, before anything else.
    pub fn tick(&mut self, commands: impl IntoIterator<Item = Command>) -> TickReport {
        self.state.tick += 1;
        let mut events = Vec::new();

        for cmd in commands {
            if self.modes.apply(&mut self.state, cmd, &mut events) {
                self.controller.reset();
            }
        }

        let mut error = None;
        let mut delta_error = None;
        let motor_power = match self.state.mode {
            Mode::Idle => 0.0,
            Mode::FreeMove => {
                self.modes.free_move_step(&mut self.state);
                self.plant.config().hold_power
            }
            Mode::Tracking | Mode::ReturningHome => match self.state.setpoint {
                Some(setpoint) => {
                    let position = self.state.position;
                    let e = (setpoint - position).abs();
                    let de = self.state.push_error(e);
                    let power = self.controller.motor_power(e, de);
                    let step = self.plant.step(position, setpoint, power, e);
                    self.state.position = step.next_position;

                    if let Some(kind) = self.detector.check(setpoint, e) {
                        events.push(SimEvent { tick: self.state.tick, kind });
                    }
                    self.modes.check_home(&mut self.state, &mut events);

                    error = Some(e);
                    delta_error = Some(de);
                    step.applied_power
                }
                None => 0.0,
            },
        };

        debug!(
            tick = self.state.tick,
            mode = %self.state.mode,
            position = self.state.position,
            ?error,
            motor_power,
            "tick"
        );

        TickReport {
            tick: self.state.tick,
            mode: self.state.mode,
            position: self.state.position,
            setpoint: self.state.setpoint,
            error,
            delta_error,
            motor_power,
            events,
        }
    }
}

// ---------------------------------------------------------------------------
// Offline runs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub start_position: f64,
    /// Start already tracking this setpoint; `None` starts idle.
    pub setpoint: Option<f64>,
    pub max_ticks: u64,
    pub plant: PlantConfig,
    pub limits: Limits,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_position: 1000.0,
            setpoint: Some(1.0),
            max_ticks: 600,
            plant: PlantConfig::default(),
            limits: Limits::default(),
        }
    }
}

/// Run `config.max_ticks` ticks with a custom controller. `script` holds
/// `(tick, command)` pairs delivered at the top of that tick (ticks start
/// at 1). Returns one report per tick.
pub fn simulate_with(
    config: &SimConfig,
    controller: &mut dyn Controller,
    script: &[(u64, Command)],
) -> Vec<TickReport> {
    let state = match config.setpoint {
        Some(sp) => ControllerState::tracking(config.start_position, sp),
        None => ControllerState::new(config.start_position),
    };
    let mut sim = Simulator::new(
        state,
        Plant::new(config.plant.clone()),
        ModeController::new(config.limits.clone()),
        controller,
    );

    let mut reports = Vec::with_capacity(config.max_ticks.min(100_000) as usize);
    for tick in 1..=config.max_ticks {
        let pending: PendingCommands = script
            .iter()
            .filter(|(t, _)| *t == tick)
            .map(|(_, cmd)| *cmd)
            .collect();
        reports.push(sim.tick(pending));
    }
    reports
}

/// Simulate with the default fuzzy controller (convenience wrapper).
pub fn simulate(config: &SimConfig) -> Result<Vec<TickReport>> {
    let mut controller = FuzzyController::drone()?;
    Ok(simulate_with(config, &mut controller, &[]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::EventKind;
    use crate::sim::state::Direction;

    fn fuzzy_sim(state: ControllerState) -> Simulator<FuzzyController> {
        Simulator::new(
            state,
            Plant::default(),
            ModeController::default(),
            FuzzyController::drone().unwrap(),
        )
    }

    #[test]
    fn first_tick_climbs_toward_setpoint() {
        let mut sim = fuzzy_sim(ControllerState::tracking(300.0, 1000.0));
        let r = sim.tick(None);
        assert_eq!(r.error, Some(700.0));
        assert_eq!(r.delta_error, Some(0.0));
        assert!((0.0..=1.0).contains(&r.motor_power));
        assert!(r.position > 300.0, "position should rise, got {}", r.position);
    }

    #[test]
    fn climbing_never_decreases_while_far() {
        let mut sim = fuzzy_sim(ControllerState::tracking(300.0, 1000.0));
        let mut prev = 300.0;
        for _ in 0..200 {
            let r = sim.tick(None);
            // Below 25 the decay band can outweigh a small drive.
            if r.error.unwrap() < 25.0 {
                break;
            }
            assert!(r.position > prev, "tick {}: {} -> {}", r.tick, prev, r.position);
            prev = r.position;
        }
    }

    #[test]
    fn dead_zone_reports_hold_power() {
        let mut sim = fuzzy_sim(ControllerState::tracking(997.0, 1000.0));
        let r = sim.tick(None);
        assert_eq!(r.error, Some(3.0));
        assert_eq!(r.motor_power, 0.37);
    }

    #[test]
    fn free_move_up_is_exactly_one_per_tick() {
        let start = 990.0;
        let mut sim = fuzzy_sim(ControllerState::new(start));
        let n = 25u64;
        for i in 0..n {
            let cmds: Vec<Command> = if i == 0 {
                vec![Command::SetFreeMove(true), Command::SetDirection(Direction::Up)]
            } else {
                vec![Command::SetDirection(Direction::Up)]
            };
            let pending: PendingCommands = cmds.into_iter().collect();
            let r = sim.tick(pending);
            assert_eq!(r.motor_power, 0.37);
            assert_eq!(r.error, None);
        }
        let expected = start + (n as f64).min(1000.0 - start);
        assert_eq!(sim.state().position, expected);
        assert_eq!(sim.state().position, 1000.0);
    }

    #[test]
    fn free_move_short_run_moves_by_tick_count() {
        let mut sim = fuzzy_sim(ControllerState::new(100.0));
        sim.tick(vec![Command::SetFreeMove(true), Command::SetDirection(Direction::Up)]);
        for _ in 1..10 {
            sim.tick(None);
        }
        assert_eq!(sim.state().position, 110.0);
    }

    #[test]
    fn return_home_descends_monotonically() {
        let mut sim = fuzzy_sim(ControllerState::tracking(600.0, 600.0));
        let r = sim.tick(Some(Command::ReturnHome));
        assert_eq!(r.setpoint, Some(1.0));
        let mut prev = r.position;
        assert!(prev < 600.0);
        for _ in 0..2000 {
            if prev <= 1.0 + 5.0 {
                break;
            }
            let r = sim.tick(None);
            assert!(r.position < prev, "tick {}: {} -> {}", r.tick, prev, r.position);
            prev = r.position;
        }
        assert!(prev <= 6.0, "never got near home, stuck at {}", prev);
    }

    #[test]
    fn idle_holds_position() {
        let mut sim = fuzzy_sim(ControllerState::new(42.0));
        let r = sim.tick(None);
        assert_eq!(r.mode, Mode::Idle);
        assert_eq!(r.position, 42.0);
        assert_eq!(r.error, None);
        assert_eq!(r.motor_power, 0.0);
    }

    #[test]
    fn scripted_arm_starts_tracking() {
        let config = SimConfig {
            start_position: 1.0,
            setpoint: None,
            max_ticks: 5,
            ..SimConfig::default()
        };
        let mut controller = FuzzyController::drone().unwrap();
        let script = [(2, Command::SetDestination(500.0)), (3, Command::Arm)];
        let traj = simulate_with(&config, &mut controller, &script);
        assert_eq!(traj.len(), 5);
        assert_eq!(traj[1].mode, Mode::Idle);
        assert_eq!(traj[2].mode, Mode::Tracking);
        assert_eq!(traj[2].setpoint, Some(500.0));
        assert!(traj[4].position > 1.0);
    }

    #[test]
    fn descent_scenario_reaches_setpoint_band() {
        let config = SimConfig { max_ticks: 1000, ..SimConfig::default() };
        let traj = simulate(&config).unwrap();
        let reached = traj
            .iter()
            .flat_map(|r| r.events.iter())
            .any(|e| matches!(e.kind, EventKind::SetpointReached { .. }));
        assert!(reached, "1000 -> 1 should enter the dead zone");
    }
}
