use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use fuzzy_drone::fuzzy::{presets, FuzzyVariable};
use fuzzy_drone::io::RunSummary;
use fuzzy_drone::sim::{self, SimConfig, TickReport};

fn main() -> eframe::Result {
    let config = SimConfig { max_ticks: 800, ..SimConfig::default() };
    let trajectory = match sim::simulate(&config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("cannot build controller: {e}");
            std::process::exit(1);
        }
    };
    let summary = RunSummary::from_trajectory(config.start_position, &trajectory, config.plant.dead_zone);

    let families = [
        presets::error_variable(),
        presets::delta_error_variable(),
        presets::motor_power_variable(),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .collect();

    let app = DroneViz { trajectory, summary, families };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Fuzzy Drone Controller", options, Box::new(|_| Ok(Box::new(app))))
}

struct DroneViz {
    trajectory: Vec<TickReport>,
    summary: RunSummary,
    families: Vec<FuzzyVariable>,
}

fn series(traj: &[TickReport], f: impl Fn(&TickReport) -> Option<f64>) -> PlotPoints {
    traj.iter()
        .filter_map(|r| f(r).map(|y| [r.tick as f64, y]))
        .collect()
}

fn membership_plot(ui: &mut egui::Ui, var: &FuzzyVariable, width: f32, height: f32) {
    // Delta-error lives in a narrow band around zero; plotting the whole
    // universe would flatten it.
    let (lo, hi) = match var.universe() {
        (lo, hi) if hi - lo > 100.0 && lo < 0.0 => (-6.0, 6.0),
        u => u,
    };
    let n = 400;
    ui.vertical(|ui| {
        ui.label(format!("Membership: {}", var.name()));
        Plot::new(format!("mf_{}", var.name()))
            .width(width)
            .height(height)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for term in var.terms() {
                    let points: PlotPoints = (0..=n)
                        .map(|i| {
                            let x = lo + (hi - lo) * i as f64 / n as f64;
                            [x, term.membership(x)]
                        })
                        .collect();
                    plot_ui.line(Line::new(term.name(), points));
                }
            });
    });
}

impl eframe::App for DroneViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading("Fuzzy drone: 1000 \u{2192} 1");
            ui.label(format!(
                "Ticks: {}  |  Settled: {}  |  Overshoot: {:.2}  |  Peak power: {:.1} %",
                self.summary.ticks,
                self.summary.settling_tick.map_or("no".to_string(), |t| format!("tick {t}")),
                self.summary.overshoot,
                self.summary.max_motor_power_pct,
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let third_w = available.x / 3.0 - 8.0;
            let half_h = available.y / 2.0 - 16.0;

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Position");
                    let points = series(&self.trajectory, |r| Some(r.position));
                    Plot::new("position")
                        .width(third_w)
                        .height(half_h)
                        .x_axis_label("Tick")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Position", points));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Motor power (%)");
                    let points = series(&self.trajectory, |r| Some(r.motor_power * 100.0));
                    Plot::new("power")
                        .width(third_w)
                        .height(half_h)
                        .x_axis_label("Tick")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Power", points));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Error");
                    let points = series(&self.trajectory, |r| r.error);
                    Plot::new("error")
                        .width(third_w)
                        .height(half_h)
                        .x_axis_label("Tick")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Error", points));
                        });
                });
            });

            ui.horizontal(|ui| {
                for var in &self.families {
                    membership_plot(ui, var, third_w, half_h);
                }
            });
        });
    }
}
