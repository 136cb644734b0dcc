use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::bus::CommandInbox;
use crate::control::Controller;
use crate::telemetry::TelemetryPublisher;
use super::event::EventKind;
use super::runner::Simulator;
use super::state::ControllerState;

/// Drive `sim` on a fixed period until `shutdown` flips to true.
///
/// Each tick drains the inbox, advances the simulator and hands the sample to
/// the publisher without waiting on it. Returns the final state.
pub async fn run_control_loop<C: Controller>(
    mut sim: Simulator<C>,
    mut inbox: CommandInbox,
    telemetry: TelemetryPublisher,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> ControllerState {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        period_ms = period.as_millis() as u64,
        position = sim.state().position,
        controller = sim.controller().name(),
        "control loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = sim.tick(inbox.drain());
                for event in &report.events {
                    match &event.kind {
                        EventKind::SetpointReached { setpoint } => {
                            info!(tick = event.tick, setpoint, "setpoint reached")
                        }
                        other => debug!(tick = event.tick, ?other, "event"),
                    }
                }
                telemetry.publish(&report.telemetry());
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    let state = sim.into_state();
    info!(tick = state.tick, position = state.position, mode = %state.mode, "control loop stopped");
    state
}
