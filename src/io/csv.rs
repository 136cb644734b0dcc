use std::io::{self, Write};
use std::path::Path;

use crate::sim::runner::TickReport;

fn opt(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| format!("{:.*}", decimals, v)).unwrap_or_default()
}

/// Write a tick trajectory as CSV.
///
/// Columns: tick, mode, position, setpoint, error, delta_error, motor_power_pct.
/// Fields that do not apply to a tick (no setpoint, idle, free move) are empty.
pub fn write_trajectory<W: Write>(writer: &mut W, trajectory: &[TickReport]) -> io::Result<()> {
    writeln!(writer, "tick,mode,position,setpoint,error,delta_error,motor_power_pct")?;

    for r in trajectory {
        writeln!(
            writer,
            "{},{},{:.4},{},{},{},{:.2}",
            r.tick,
            r.mode,
            r.position,
            opt(r.setpoint, 1),
            opt(r.error, 4),
            opt(r.delta_error, 4),
            r.motor_power * 100.0,
        )?;
    }

    Ok(())
}

pub fn write_trajectory_file(path: &Path, trajectory: &[TickReport]) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_trajectory(&mut file, trajectory)?;
    file.flush()
}
