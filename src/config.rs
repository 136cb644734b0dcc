//! Runtime configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or none at all) gives the
//! stock drone: public HiveMQ broker, 200 ms ticks, dashboard on port 8766.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::plant::PlantConfig;
use crate::sim::command::CommandKind;
use crate::sim::mode::Limits;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub limits: Limits,
    pub plant: PlantConfig,
    pub mqtt: MqttConfig,
    pub topics: TopicsConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Read `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| Error::Config(format!("{}: {}", p.display(), e)))?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.limits
            .validate()
            .map_err(|reason| Error::Config(format!("[limits] {}", reason)))?;
        self.plant
            .validate()
            .map_err(|reason| Error::Config(format!("[plant] {}", reason)))?;
        if !self.simulation.initial_position.is_finite() {
            return Err(Error::Config("[simulation] initial_position must be finite".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub period_ms: u64,
    pub initial_position: f64,
    pub inbox_capacity: usize,
    pub telemetry_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            period_ms: 200,
            initial_position: 1.0,
            inbox_capacity: 64,
            telemetry_capacity: 64,
        }
    }
}

impl SimulationConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// When false, an in-process bus stands in for the broker.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// Capacity of the client request queue.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "broker.hivemq.com".into(),
            port: 1883,
            client_id: "fuzzy-drone".into(),
            keep_alive_secs: 60,
            request_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub position: String,
    pub motor_power: String,
    pub error: String,
    pub return_home: String,
    pub destination: String,
    pub arm: String,
    pub direction: String,
    pub free_move: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            position: "drone/deslocamento".into(),
            motor_power: "drone/potencia".into(),
            error: "drone/erro".into(),
            return_home: "drone/retornar".into(),
            destination: "drone/destino".into(),
            arm: "drone/mover".into(),
            direction: "drone/direcao".into(),
            free_move: "drone/livre".into(),
        }
    }
}

impl TopicsConfig {
    /// Inbound topic for each command.
    pub fn command_routes(&self) -> Vec<(String, CommandKind)> {
        vec![
            (self.return_home.clone(), CommandKind::ReturnHome),
            (self.destination.clone(), CommandKind::SetDestination),
            (self.arm.clone(), CommandKind::Arm),
            (self.direction.clone(), CommandKind::SetDirection),
            (self.free_move.clone(), CommandKind::SetFreeMove),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub bind: SocketAddr,
    /// Frames buffered per listener before it starts skipping.
    pub capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: SocketAddr::from(([127, 0, 0, 1], 8766)),
            capacity: 256,
        }
    }
}
