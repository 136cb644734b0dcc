//! Fuzzy-logic altitude controller for a simulated drone.
//!
//! A Mamdani fuzzy engine turns altitude error and its rate of change into
//! motor power; a small plant model turns power into motion. Around that core
//! sit a mode state machine driven by bus commands, an MQTT telemetry feed
//! and a WebSocket bridge for live dashboards.

pub mod bridge;
pub mod bus;
pub mod config;
pub mod control;
pub mod error;
pub mod fuzzy;
pub mod io;
pub mod plant;
pub mod sim;
pub mod telemetry;

pub use error::{Error, Result};
