use std::collections::BTreeMap;

use crate::error::{Error, Result};
use super::state::Direction;

// ---------------------------------------------------------------------------
// Operator commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ReturnHome,
    SetDestination(f64),
    Arm,
    SetDirection(Direction),
    SetFreeMove(bool),
}

/// One variant per command topic.
///
/// The declaration order is the order in which a tick applies coalesced
/// commands, so "enter free move" and "go up" sent together both take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    SetFreeMove,
    SetDestination,
    Arm,
    ReturnHome,
    SetDirection,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::ReturnHome => CommandKind::ReturnHome,
            Command::SetDestination(_) => CommandKind::SetDestination,
            Command::Arm => CommandKind::Arm,
            Command::SetDirection(_) => CommandKind::SetDirection,
            Command::SetFreeMove(_) => CommandKind::SetFreeMove,
        }
    }

    /// Parse a raw payload received on the topic for `kind`.
    pub fn parse(kind: CommandKind, topic: &str, payload: &str) -> Result<Command> {
        let text = payload.trim();
        match kind {
            CommandKind::ReturnHome => Ok(Command::ReturnHome),
            CommandKind::Arm => Ok(Command::Arm),
            CommandKind::SetDestination => {
                let value: f64 = text
                    .parse()
                    .map_err(|_| Error::malformed(topic, payload, "destination is not a number"))?;
                if !value.is_finite() {
                    return Err(Error::malformed(topic, payload, "destination is not finite"));
                }
                Ok(Command::SetDestination(value.round()))
            }
            CommandKind::SetDirection => text
                .parse::<Direction>()
                .map(Command::SetDirection)
                .map_err(|reason| Error::malformed(topic, payload, reason)),
            CommandKind::SetFreeMove => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(Command::SetFreeMove(true)),
                "false" | "0" | "off" | "no" => Ok(Command::SetFreeMove(false)),
                _ => Err(Error::malformed(topic, payload, "expected a boolean")),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Per-tick coalescing: newest command per topic wins
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct PendingCommands {
    latest: BTreeMap<CommandKind, Command>,
}

impl PendingCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `cmd`, superseding any older command of the same kind.
    pub fn push(&mut self, cmd: Command) {
        self.latest.insert(cmd.kind(), cmd);
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

impl IntoIterator for PendingCommands {
    type Item = Command;
    type IntoIter = std::collections::btree_map::IntoValues<CommandKind, Command>;

    /// Commands in application order.
    fn into_iter(self) -> Self::IntoIter {
        self.latest.into_values()
    }
}

impl FromIterator<Command> for PendingCommands {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        let mut pending = PendingCommands::new();
        for cmd in iter {
            pending.push(cmd);
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_destination_payloads() {
        let k = CommandKind::SetDestination;
        assert_eq!(Command::parse(k, "t", " 500 ").unwrap(), Command::SetDestination(500.0));
        assert_eq!(Command::parse(k, "t", "42.6").unwrap(), Command::SetDestination(43.0));
        let err = Command::parse(k, "drone/destino", "high").unwrap_err();
        assert!(matches!(err, Error::MalformedCommand { ref topic, .. } if topic == "drone/destino"));
        assert!(Command::parse(k, "t", "NaN").is_err());
    }

    #[test]
    fn parses_flags_and_directions() {
        assert_eq!(
            Command::parse(CommandKind::SetFreeMove, "t", "True").unwrap(),
            Command::SetFreeMove(true)
        );
        assert_eq!(
            Command::parse(CommandKind::SetFreeMove, "t", "0").unwrap(),
            Command::SetFreeMove(false)
        );
        assert!(Command::parse(CommandKind::SetFreeMove, "t", "maybe").is_err());
        assert_eq!(
            Command::parse(CommandKind::SetDirection, "t", "down").unwrap(),
            Command::SetDirection(Direction::Down)
        );
        assert!(Command::parse(CommandKind::SetDirection, "t", "left").is_err());
        assert_eq!(Command::parse(CommandKind::Arm, "t", "anything").unwrap(), Command::Arm);
    }

    #[test]
    fn newest_per_topic_wins() {
        let pending: PendingCommands = vec![
            Command::SetDestination(100.0),
            Command::SetDirection(Direction::Up),
            Command::SetDestination(250.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(pending.len(), 2);
        let cmds: Vec<Command> = pending.into_iter().collect();
        assert_eq!(
            cmds,
            vec![Command::SetDestination(250.0), Command::SetDirection(Direction::Up)]
        );
    }

    #[test]
    fn application_order_is_fixed() {
        let pending: PendingCommands = vec![
            Command::SetDirection(Direction::Up),
            Command::Arm,
            Command::SetFreeMove(true),
            Command::SetDestination(10.0),
        ]
        .into_iter()
        .collect();
        let kinds: Vec<CommandKind> = pending.into_iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                CommandKind::SetFreeMove,
                CommandKind::SetDestination,
                CommandKind::Arm,
                CommandKind::SetDirection
            ]
        );
    }
}
