use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::TopicsConfig;
use crate::error::{Error, Result};
use crate::sim::command::{Command, CommandKind, PendingCommands};

// ---------------------------------------------------------------------------
// Bounded command inbox: many producers, one consumer (the control loop)
// ---------------------------------------------------------------------------

/// Producer handle. Cheap to clone; safe to use from any task or thread.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
    routes: Arc<HashMap<String, CommandKind>>,
}

/// Consumer end, owned by the control loop.
#[derive(Debug)]
pub struct CommandInbox {
    rx: mpsc::Receiver<Command>,
}

pub fn inbox(capacity: usize, topics: &TopicsConfig) -> (CommandSender, CommandInbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let routes = topics.command_routes().into_iter().collect();
    (CommandSender { tx, routes: Arc::new(routes) }, CommandInbox { rx })
}

impl CommandSender {
    /// Enqueue a parsed command. Returns false if it was dropped.
    pub fn submit(&self, cmd: Command) -> bool {
        match self.tx.try_send(cmd) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                warn!(?cmd, "command inbox full, command dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(cmd)) => {
                debug!(?cmd, "control loop stopped, command dropped");
                false
            }
        }
    }

    /// Topics this sender accepts.
    pub fn topics(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    /// Route a raw bus message. `Ok(false)` means the topic is not a command
    /// topic; malformed payloads are an error and nothing is enqueued.
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> Result<bool> {
        let Some(&kind) = self.routes.get(topic) else {
            return Ok(false);
        };
        let text = std::str::from_utf8(payload)
            .map_err(|_| Error::malformed(topic, &String::from_utf8_lossy(payload), "not UTF-8"))?;
        let cmd = Command::parse(kind, topic, text)?;
        debug!(%topic, ?cmd, "command received");
        Ok(self.submit(cmd))
    }

    /// `deliver`, logging instead of returning the error.
    pub fn deliver_logged(&self, topic: &str, payload: &[u8]) {
        if let Err(e) = self.deliver(topic, payload) {
            warn!(error = %e, "command discarded");
        }
    }
}

impl CommandInbox {
    /// Take everything pending, keeping the newest command per topic.
    pub fn drain(&mut self) -> PendingCommands {
        let mut pending = PendingCommands::new();
        while let Ok(cmd) = self.rx.try_recv() {
            pending.push(cmd);
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Direction;

    #[test]
    fn drain_coalesces_per_topic() {
        let (tx, mut rx) = inbox(8, &TopicsConfig::default());
        tx.submit(Command::SetDestination(100.0));
        tx.submit(Command::SetDirection(Direction::Down));
        tx.submit(Command::SetDestination(300.0));
        let cmds: Vec<Command> = rx.drain().into_iter().collect();
        assert_eq!(
            cmds,
            vec![Command::SetDestination(300.0), Command::SetDirection(Direction::Down)]
        );
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn full_inbox_drops() {
        let (tx, mut rx) = inbox(1, &TopicsConfig::default());
        assert!(tx.submit(Command::Arm));
        assert!(!tx.submit(Command::ReturnHome));
        assert_eq!(rx.drain().len(), 1);
    }

    #[test]
    fn deliver_routes_by_topic() {
        let (tx, mut rx) = inbox(8, &TopicsConfig::default());
        assert!(tx.deliver("drone/destino", b"750").unwrap());
        assert!(tx.deliver("drone/livre", b"true").unwrap());
        assert!(!tx.deliver("drone/other", b"1").unwrap());
        let cmds: Vec<Command> = rx.drain().into_iter().collect();
        assert_eq!(cmds, vec![Command::SetFreeMove(true), Command::SetDestination(750.0)]);
    }

    #[test]
    fn malformed_payload_enqueues_nothing() {
        let (tx, mut rx) = inbox(8, &TopicsConfig::default());
        assert!(matches!(
            tx.deliver("drone/destino", b"up"),
            Err(Error::MalformedCommand { .. })
        ));
        assert!(tx.deliver("drone/direcao", &[0xff, 0xfe]).is_err());
        tx.deliver_logged("drone/direcao", b"sideways");
        assert!(rx.drain().is_empty());
    }
}
