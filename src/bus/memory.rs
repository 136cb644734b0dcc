use tokio::sync::broadcast;
use tracing::debug;

use crate::error::Result;
use super::inbox::CommandSender;
use super::Transport;

/// One message on the in-process bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
}

/// In-memory broadcast bus (for local runs without a broker, and tests).
#[derive(Debug, Clone)]
pub struct MemoryBus {
    sender: broadcast::Sender<BusMessage>,
}

impl MemoryBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }
}

impl Transport for MemoryBus {
    fn publish(&self, topic: &str, payload: String) -> Result<()> {
        // Nobody listening is fine: delivery is best-effort.
        let _ = self.sender.send(BusMessage { topic: topic.to_string(), payload });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Feed command topics seen on the bus into the control loop's inbox.
/// Runs until the bus is dropped.
pub async fn route_commands(mut rx: broadcast::Receiver<BusMessage>, commands: CommandSender) {
    loop {
        match rx.recv().await {
            Ok(msg) => commands.deliver_logged(&msg.topic, msg.payload.as_bytes()),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(skipped = n, "command router lagging")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::inbox::inbox;
    use crate::config::TopicsConfig;
    use crate::sim::command::Command;

    #[tokio::test]
    async fn publishes_and_receives() {
        let bus = MemoryBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish("drone/deslocamento", "10.00".into()).unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.topic, "drone/deslocamento");
        assert_eq!(msg.payload, "10.00");
    }

    #[tokio::test]
    async fn routes_command_topics_into_inbox() {
        let bus = MemoryBus::new(16);
        let (tx, mut commands) = inbox(8, &TopicsConfig::default());
        let router = tokio::spawn(route_commands(bus.subscribe(), tx));

        bus.publish("drone/destino", "640".into()).unwrap();
        bus.publish("drone/deslocamento", "1.00".into()).unwrap();
        bus.publish("drone/mover", "".into()).unwrap();
        drop(bus);
        router.await.unwrap();

        let cmds: Vec<Command> = commands.drain().into_iter().collect();
        assert_eq!(cmds, vec![Command::SetDestination(640.0), Command::Arm]);
    }
}
