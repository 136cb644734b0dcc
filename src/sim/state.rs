use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Operating mode / manual direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Idle,
    Tracking,
    FreeMove,
    ReturningHome,
}

impl Mode {
    /// Driven by the controller toward a setpoint.
    pub fn is_tracking(self) -> bool {
        matches!(self, Mode::Tracking | Mode::ReturningHome)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Idle => "IDLE",
            Mode::Tracking => "TRACK",
            Mode::FreeMove => "FREE",
            Mode::ReturningHome => "HOME",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

impl Direction {
    /// Per-tick displacement in free movement.
    pub fn step(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
            Direction::None => 0.0,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "cima" | "subir" => Ok(Direction::Up),
            "down" | "baixo" | "descer" => Ok(Direction::Down),
            "none" | "stop" | "parar" | "" => Ok(Direction::None),
            other => Err(format!("unknown direction `{}`", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller state (single owner: the tick loop)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ControllerState {
    pub position: f64,
    pub setpoint: Option<f64>,
    pub mode: Mode,
    pub direction: Direction,
    /// Last stored `set-destination`, waiting for an arm command.
    pub destination: Option<f64>,
    /// Setpoint to resume when leaving free movement.
    pub armed_setpoint: Option<f64>,
    pub tick: u64,
    error_history: VecDeque<f64>,
}

impl ControllerState {
    /// Idle at `position`.
    pub fn new(position: f64) -> Self {
        Self {
            position,
            setpoint: None,
            mode: Mode::Idle,
            direction: Direction::None,
            destination: None,
            armed_setpoint: None,
            tick: 0,
            error_history: VecDeque::with_capacity(2),
        }
    }

    /// Already tracking `setpoint` from `position`.
    pub fn tracking(position: f64, setpoint: f64) -> Self {
        let mut state = Self::new(position);
        state.setpoint = Some(setpoint);
        state.armed_setpoint = Some(setpoint);
        state.destination = Some(setpoint);
        state.mode = Mode::Tracking;
        state.reset_history(Some((setpoint - position).abs()));
        state
    }

    /// Clear the error history, optionally seeding it with one entry.
    pub fn reset_history(&mut self, seed: Option<f64>) {
        self.error_history.clear();
        if let Some(e) = seed {
            self.error_history.push_back(e);
        }
    }

    /// Record this tick's absolute error and return the delta-error
    /// (0 until two entries exist).
    pub fn push_error(&mut self, error: f64) -> f64 {
        if self.error_history.len() == 2 {
            self.error_history.pop_front();
        }
        self.error_history.push_back(error);
        match (self.error_history.front(), self.error_history.back()) {
            (Some(prev), Some(last)) if self.error_history.len() == 2 => last - prev,
            _ => 0.0,
        }
    }

    pub fn error_history(&self) -> &VecDeque<f64> {
        &self.error_history
    }

    /// Absolute error to the current setpoint, if tracking.
    pub fn current_error(&self) -> Option<f64> {
        if !self.mode.is_tracking() {
            return None;
        }
        self.setpoint.map(|sp| (sp - self.position).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_error_needs_two_entries() {
        let mut s = ControllerState::new(10.0);
        assert_eq!(s.push_error(50.0), 0.0);
        assert_eq!(s.push_error(47.0), -3.0);
        assert_eq!(s.push_error(47.5), 0.5);
        assert_eq!(s.error_history().len(), 2);
    }

    #[test]
    fn seeded_history_gives_zero_first_delta() {
        let mut s = ControllerState::tracking(300.0, 1000.0);
        assert_eq!(s.error_history().len(), 1);
        assert_eq!(s.push_error(700.0), 0.0);
    }

    #[test]
    fn direction_tokens() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!(" Down ".parse::<Direction>().unwrap(), Direction::Down);
        assert_eq!("parar".parse::<Direction>().unwrap(), Direction::None);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn idle_has_no_error() {
        let s = ControllerState::new(500.0);
        assert_eq!(s.current_error(), None);
        let t = ControllerState::tracking(500.0, 600.0);
        assert_eq!(t.current_error(), Some(100.0));
    }
}
