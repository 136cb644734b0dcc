use fuzzy_drone::control::Controller;
use fuzzy_drone::sim::{self, Command, SimConfig};

/// Full power when far from the setpoint, a fixed trickle once close.
struct BangBangController {
    switch_error: f64,
    high: f64,
    low: f64,
}

impl Controller for BangBangController {
    fn motor_power(&mut self, error: f64, _delta_error: f64) -> f64 {
        if error > self.switch_error {
            self.high
        } else {
            self.low
        }
    }

    fn name(&self) -> &str {
        "BangBang"
    }
}

fn main() {
    let config = SimConfig {
        start_position: 1.0,
        setpoint: None,
        max_ticks: 400,
        ..SimConfig::default()
    };

    let mut controller = BangBangController { switch_error: 40.0, high: 1.0, low: 0.2 };

    // Idle for a few ticks, then fly to 700 and come home halfway through.
    let script = [
        (3, Command::SetDestination(700.0)),
        (5, Command::Arm),
        (250, Command::ReturnHome),
    ];

    println!("Simulating with {} controller...", controller.name());
    let trajectory = sim::simulate_with(&config, &mut controller, &script);

    let peak = trajectory.iter().map(|r| r.position).fold(0.0_f64, f64::max);
    let last = trajectory.last().map(|r| (r.tick, r.position, r.mode));

    println!("Peak position: {:.1}", peak);
    if let Some((tick, position, mode)) = last {
        println!("Final: tick {} position {:.1} mode {}", tick, position, mode);
    }
    println!("Trajectory points: {}", trajectory.len());
}
