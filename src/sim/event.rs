use super::command::CommandKind;
use super::state::Mode;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ModeChanged { from: Mode, to: Mode },
    SetpointReached { setpoint: f64 },
    HomeReached,
    CommandRejected { kind: CommandKind, reason: String },
}

/// A discrete event that occurred during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: EventKind,
}

/// Trait for passive event detectors.
/// Implementations inspect each tracking step and report events.
pub trait EventDetector {
    fn check(&mut self, setpoint: f64, error: f64) -> Option<EventKind>;
}

/// Fires once each time the error enters the tolerance band around a
/// setpoint. Re-arms when the setpoint changes.
pub struct SetpointDetector {
    pub tolerance: f64,
    reached: Option<f64>,
}

impl SetpointDetector {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance, reached: None }
    }
}

impl EventDetector for SetpointDetector {
    fn check(&mut self, setpoint: f64, error: f64) -> Option<EventKind> {
        if self.reached.is_some_and(|sp| sp != setpoint) {
            self.reached = None;
        }
        if self.reached.is_none() && error <= self.tolerance {
            self.reached = Some(setpoint);
            Some(EventKind::SetpointReached { setpoint })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setpoint_detector_fires_once() {
        let mut det = SetpointDetector::new(5.0);
        assert_eq!(det.check(1000.0, 40.0), None);
        assert_eq!(
            det.check(1000.0, 4.0),
            Some(EventKind::SetpointReached { setpoint: 1000.0 })
        );
        // Should not fire again
        assert_eq!(det.check(1000.0, 1.0), None);
    }

    #[test]
    fn setpoint_detector_rearms_on_new_setpoint() {
        let mut det = SetpointDetector::new(5.0);
        assert!(det.check(500.0, 0.0).is_some());
        assert!(det.check(1.0, 499.0).is_none());
        assert!(det.check(1.0, 3.0).is_some());
    }
}
