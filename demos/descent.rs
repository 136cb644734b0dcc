use fuzzy_drone::io::csv;
use fuzzy_drone::io::json::{self, RunSummary};
use fuzzy_drone::sim::{self, SimConfig};

fn main() {
    let config = SimConfig { max_ticks: 800, ..SimConfig::default() };

    println!("Simulating descent 1000 -> 1 ...");
    let trajectory = sim::simulate(&config).expect("Failed to build controller");

    let summary = RunSummary::from_trajectory(config.start_position, &trajectory, config.plant.dead_zone);
    match summary.settling_tick {
        Some(t) => println!("Settled at tick {}", t),
        None => println!("Did not settle within {} ticks", summary.ticks),
    }
    println!("Overshoot: {:.2}", summary.overshoot);
    println!("Peak power: {:.1} %", summary.max_motor_power_pct);

    csv::write_trajectory_file("descent_trajectory.csv".as_ref(), &trajectory)
        .expect("Failed to write CSV");
    json::write_summary_file("descent_summary.json".as_ref(), &summary)
        .expect("Failed to write JSON");

    println!("Exported: descent_trajectory.csv, descent_summary.json");
}
