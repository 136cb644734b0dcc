use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::command::{Command, CommandKind};
use super::event::{EventKind, SimEvent};
use super::state::{ControllerState, Direction, Mode};

// ---------------------------------------------------------------------------
// Position domain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub min_position: f64,
    pub max_position: f64,
    /// Setpoint used by return-home.
    pub home: f64,
    /// Home counts as reached within this distance.
    pub home_tolerance: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_position: 1.0,
            max_position: 1000.0,
            home: 1.0,
            home_tolerance: 5.0,
        }
    }
}

impl Limits {
    /// Clamp into `[min_position, max_position]`. Never panics; a NaN input
    /// lands on `min_position`.
    pub fn clamp(&self, position: f64) -> f64 {
        position.max(self.min_position).min(self.max_position)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let bounds = [self.min_position, self.max_position, self.home, self.home_tolerance];
        if !bounds.iter().all(|v| v.is_finite()) {
            return Err("limits must be finite".into());
        }
        if self.min_position > self.max_position {
            return Err(format!(
                "min_position {} is above max_position {}",
                self.min_position, self.max_position
            ));
        }
        if self.home < self.min_position || self.home > self.max_position {
            return Err(format!("home {} is outside the position limits", self.home));
        }
        if self.home_tolerance < 0.0 {
            return Err("home_tolerance must not be negative".into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mode state machine
// ---------------------------------------------------------------------------

/// Turns operator commands into setpoint/mode changes on the controller
/// state. Holds no state of its own.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    limits: Limits,
}

impl ModeController {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Apply one command. Returns true when tracking (re)started, so the
    /// caller can reset its controller.
    pub fn apply(&self, state: &mut ControllerState, cmd: Command, events: &mut Vec<SimEvent>) -> bool {
        let before = state.mode;
        let mut restarted = false;

        match cmd {
            Command::SetDestination(value) => {
                let dest = self.limits.clamp(value);
                debug!(requested = value, stored = dest, "destination stored");
                state.destination = Some(dest);
            }
            Command::Arm => match state.destination {
                Some(dest) => {
                    self.start_tracking(state, dest, Mode::Tracking);
                    restarted = true;
                }
                None => {
                    warn!("arm received with no destination stored; ignored");
                    events.push(SimEvent {
                        tick: state.tick,
                        kind: EventKind::CommandRejected {
                            kind: CommandKind::Arm,
                            reason: "no destination stored".into(),
                        },
                    });
                }
            },
            Command::ReturnHome => {
                state.direction = Direction::None;
                self.start_tracking(state, self.limits.home, Mode::ReturningHome);
                restarted = true;
            }
            Command::SetFreeMove(true) => {
                if state.mode != Mode::FreeMove {
                    state.mode = Mode::FreeMove;
                    state.direction = Direction::None;
                    state.reset_history(None);
                }
            }
            Command::SetFreeMove(false) => {
                if state.mode == Mode::FreeMove {
                    state.direction = Direction::None;
                    match state.armed_setpoint {
                        Some(sp) => {
                            self.start_tracking(state, sp, Mode::Tracking);
                            restarted = true;
                        }
                        None => {
                            state.mode = Mode::Idle;
                            state.setpoint = None;
                            state.reset_history(None);
                        }
                    }
                }
            }
            Command::SetDirection(dir) => {
                if state.mode == Mode::FreeMove {
                    state.direction = dir;
                } else {
                    debug!(?dir, mode = %state.mode, "direction ignored outside free movement");
                }
            }
        }

        if state.mode != before {
            info!(from = %before, to = %state.mode, setpoint = ?state.setpoint, "mode changed");
            events.push(SimEvent {
                tick: state.tick,
                kind: EventKind::ModeChanged { from: before, to: state.mode },
            });
        }
        restarted
    }

    fn start_tracking(&self, state: &mut ControllerState, setpoint: f64, mode: Mode) {
        state.setpoint = Some(setpoint);
        state.armed_setpoint = Some(setpoint);
        state.mode = mode;
        state.reset_history(Some((setpoint - state.position).abs()));
    }

    /// One free-movement tick: ±1 per direction, clamped to the domain.
    pub fn free_move_step(&self, state: &mut ControllerState) {
        state.position = self.limits.clamp(state.position + state.direction.step());
    }

    /// Leave `ReturningHome` once home is reached; keep holding home as a
    /// plain tracking setpoint.
    pub fn check_home(&self, state: &mut ControllerState, events: &mut Vec<SimEvent>) {
        if state.mode != Mode::ReturningHome {
            return;
        }
        if (state.position - self.limits.home).abs() <= self.limits.home_tolerance {
            info!(position = state.position, "home reached");
            state.mode = Mode::Tracking;
            events.push(SimEvent { tick: state.tick, kind: EventKind::HomeReached });
            events.push(SimEvent {
                tick: state.tick,
                kind: EventKind::ModeChanged { from: Mode::ReturningHome, to: Mode::Tracking },
            });
        }
    }
}
