//! Message-bus plumbing: the publish seam used by telemetry, the inbound
//! command inbox, and the two transports (MQTT broker, in-process bus).

pub mod inbox;
pub mod memory;
pub mod mqtt;

use crate::error::Result;

pub use inbox::{inbox, CommandInbox, CommandSender};
pub use memory::{BusMessage, MemoryBus};
pub use mqtt::{MqttBus, MqttEvents};

/// Outbound side of a pub/sub transport.
///
/// `publish` must not block: implementations enqueue and return.
pub trait Transport: Send + Sync {
    fn publish(&self, topic: &str, payload: String) -> Result<()>;

    fn name(&self) -> &str {
        "transport"
    }
}
