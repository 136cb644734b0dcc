//! Drone simulation: state, commands, mode transitions and the tick loop.

pub mod command;
pub mod event;
pub mod live;
pub mod mode;
pub mod runner;
pub mod state;

pub use command::{Command, CommandKind, PendingCommands};
pub use event::{EventDetector, EventKind, SetpointDetector, SimEvent};
pub use live::run_control_loop;
pub use mode::{Limits, ModeController};
pub use runner::{simulate, simulate_with, SimConfig, Simulator, TickReport};
pub use state::{ControllerState, Direction, Mode};
