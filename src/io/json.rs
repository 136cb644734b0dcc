use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::sim::runner::TickReport;

/// Summary statistics computed from an offline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: usize,
    pub start_position: f64,
    pub final_position: f64,
    /// Setpoint in force at the last tick.
    pub setpoint: Option<f64>,
    pub final_error: Option<f64>,
    /// First tick from which the error stayed within tolerance to the end.
    pub settling_tick: Option<u64>,
    /// Furthest excursion past the setpoint, away from the start side.
    pub overshoot: f64,
    pub max_motor_power_pct: f64,
}

impl RunSummary {
    pub fn from_trajectory(start_position: f64, trajectory: &[TickReport], tolerance: f64) -> Self {
        let last = trajectory.last();
        let setpoint = last.and_then(|r| r.setpoint);

        let mut settling_tick = None;
        for r in trajectory.iter().rev() {
            match r.error {
                Some(e) if e <= tolerance && r.setpoint == setpoint => settling_tick = Some(r.tick),
                _ => break,
            }
        }

        let overshoot = setpoint
            .map(|sp| {
                let climbing = start_position < sp;
                trajectory
                    .iter()
                    .filter(|r| r.setpoint == Some(sp))
                    .map(|r| if climbing { r.position - sp } else { sp - r.position })
                    .fold(0.0_f64, f64::max)
            })
            .unwrap_or(0.0);

        let max_motor_power_pct = trajectory
            .iter()
            .map(|r| r.motor_power * 100.0)
            .fold(0.0_f64, f64::max);

        RunSummary {
            ticks: trajectory.len(),
            start_position,
            final_position: last.map_or(start_position, |r| r.position),
            setpoint,
            final_error: last.and_then(|r| r.error),
            settling_tick,
            overshoot,
            max_motor_power_pct,
        }
    }
}

/// Write the summary as pretty-printed JSON.
pub fn write_summary<W: Write>(writer: &mut W, summary: &RunSummary) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)
}

pub fn write_summary_file(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Mode;

    fn tracking(tick: u64, position: f64) -> TickReport {
        let sp = 100.0;
        TickReport {
            tick,
            mode: Mode::Tracking,
            position,
            setpoint: Some(sp),
            error: Some((sp - position).abs()),
            delta_error: Some(0.0),
            motor_power: position / 200.0,
            events: Vec::new(),
        }
    }

    fn simple_trajectory() -> Vec<TickReport> {
        [40.0, 80.0, 103.0, 108.0, 99.0, 101.0, 98.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| tracking(i as u64 + 1, p))
            .collect()
    }

    #[test]
    fn summary_finds_settling_and_overshoot() {
        let s = RunSummary::from_trajectory(10.0, &simple_trajectory(), 5.0);
        assert_eq!(s.ticks, 7);
        assert_eq!(s.settling_tick, Some(5));
        assert!((s.overshoot - 8.0).abs() < 1e-9);
        assert_eq!(s.final_error, Some(2.0));
        assert!((s.max_motor_power_pct - 54.0).abs() < 1e-9);
    }

    #[test]
    fn descending_run_measures_undershoot() {
        let s = RunSummary::from_trajectory(500.0, &simple_trajectory(), 5.0);
        assert!((s.overshoot - 60.0).abs() < 1e-9);
    }

    #[test]
    fn json_output_is_valid() {
        let summary = RunSummary::from_trajectory(10.0, &simple_trajectory(), 5.0);
        let mut buf = Vec::new();
        write_summary(&mut buf, &summary).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["ticks"], 7);
        assert_eq!(v["settling_tick"], 5);
        assert_eq!(v["setpoint"], 100.0);
    }

    #[test]
    fn empty_run_has_no_settling() {
        let s = RunSummary::from_trajectory(1.0, &[], 5.0);
        assert_eq!(s.ticks, 0);
        assert_eq!(s.settling_tick, None);
        assert_eq!(s.final_position, 1.0);
    }
}
