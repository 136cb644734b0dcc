use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::bridge::DashboardFrame;
use crate::bus::Transport;
use crate::config::TopicsConfig;

// ---------------------------------------------------------------------------
// Telemetry sample
// ---------------------------------------------------------------------------

/// What the control loop publishes each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Telemetry {
    pub tick: u64,
    pub position: f64,
    /// Applied motor power, 0..100.
    pub motor_power_percent: f64,
    /// Absolute error; omitted while idle or in free movement.
    pub error: Option<f64>,
}

/// Wire format for numeric telemetry: two decimal places.
pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

impl Telemetry {
    /// One `(topic, payload)` per field.
    pub fn messages(&self, topics: &TopicsConfig) -> Vec<(String, String)> {
        let mut out = vec![
            (topics.position.clone(), format_value(self.position)),
            (topics.motor_power.clone(), format_value(self.motor_power_percent)),
        ];
        if let Some(e) = self.error {
            out.push((topics.error.clone(), format_value(e)));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Non-blocking publisher handle (held by the control loop)
// ---------------------------------------------------------------------------

/// Fire-and-forget telemetry output. Never blocks the caller: a full queue
/// drops the sample.
#[derive(Debug, Clone)]
pub struct TelemetryPublisher {
    tx: mpsc::Sender<Telemetry>,
    dashboard: Option<broadcast::Sender<DashboardFrame>>,
}

/// Create a publisher and the receiving end for [`run_publisher`].
pub fn channel(capacity: usize) -> (TelemetryPublisher, mpsc::Receiver<Telemetry>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TelemetryPublisher { tx, dashboard: None }, rx)
}

impl TelemetryPublisher {
    /// Also feed every sample to the dashboard bridge.
    pub fn with_dashboard(mut self, dashboard: broadcast::Sender<DashboardFrame>) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    pub fn publish(&self, sample: &Telemetry) {
        if let Err(e) = self.tx.try_send(*sample) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    debug!(tick = sample.tick, "telemetry queue full, sample dropped")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    debug!(tick = sample.tick, "telemetry worker gone, sample dropped")
                }
            }
        }
        if let Some(dashboard) = &self.dashboard {
            // No listeners is not an error.
            let _ = dashboard.send(DashboardFrame::from_telemetry(sample));
        }
    }
}

/// Drain the telemetry queue onto the transport until every publisher handle
/// is dropped. Transport failures are logged and the sample is lost.
pub async fn run_publisher(
    mut rx: mpsc::Receiver<Telemetry>,
    transport: Arc<dyn Transport>,
    topics: TopicsConfig,
) {
    debug!(transport = transport.name(), "telemetry publisher started");
    while let Some(sample) = rx.recv().await {
        for (topic, payload) in sample.messages(&topics) {
            if let Err(e) = transport.publish(&topic, payload) {
                warn!(%topic, error = %e, "telemetry publish failed");
            }
        }
    }
    debug!(transport = transport.name(), "telemetry publisher stopped");
}
