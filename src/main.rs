use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fuzzy_drone::bridge::{self, Bridge, DashboardFrame};
use fuzzy_drone::bus::{self, MemoryBus, MqttBus, Transport};
use fuzzy_drone::config::Config;
use fuzzy_drone::control::FuzzyController;
use fuzzy_drone::io::{self, RunSummary};
use fuzzy_drone::plant::Plant;
use fuzzy_drone::sim::{self, ControllerState, ModeController, SimConfig, Simulator, TickReport};
use fuzzy_drone::telemetry;

const MQTT_DRAIN: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "fuzzy-drone", version, about = "Fuzzy-logic drone altitude controller")]
struct Cli {
    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the live controller: bus commands in, telemetry out
    Run {
        /// Do not start the WebSocket dashboard
        #[arg(long)]
        no_dashboard: bool,
    },
    /// Run offline from START toward SETPOINT and print a report
    Simulate {
        #[arg(long, default_value_t = 1000.0)]
        start: f64,
        #[arg(long, default_value_t = 1.0)]
        setpoint: f64,
        #[arg(long, default_value_t = 600)]
        ticks: u64,
        /// Write the trajectory as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write the run summary as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print the fuzzy rule table
    Rules,
    /// Standalone dashboard bridge fed from the broker's position topic
    Bridge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Run { no_dashboard } => run_live(config, !no_dashboard).await,
        Command::Simulate { start, setpoint, ticks, csv, json } => {
            run_offline(&config, start, setpoint, ticks, csv, json)
        }
        Command::Rules => {
            let controller = FuzzyController::drone().context("building fuzzy controller")?;
            print!("{}", io::render_rule_table(controller.engine()));
            Ok(())
        }
        Command::Bridge => run_bridge(config).await,
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn run_live(config: Config, dashboard: bool) -> Result<()> {
    let controller = FuzzyController::drone().context("building fuzzy controller")?;
    println!("{}", io::render_rule_table(controller.engine()));

    // `stop` ends the control loop; `stop_io` ends the bridge and, if it has
    // not left on its own after the disconnect, the MQTT event loop.
    let (stop, shutdown) = watch::channel(false);
    let (stop_io, io_shutdown) = watch::channel(false);

    let (commands, inbox) = bus::inbox(config.simulation.inbox_capacity, &config.topics);
    let (mut publisher, samples) = telemetry::channel(config.simulation.telemetry_capacity);

    let mut tasks = Vec::new();

    if dashboard && config.dashboard.enabled {
        let hub = Bridge::new(config.dashboard.capacity);
        publisher = publisher.with_dashboard(hub.sender());
        let bind = config.dashboard.bind;
        let rx = io_shutdown.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = bridge::serve(bind, hub, rx).await {
                warn!(error = %e, "dashboard stopped");
            }
        }));
    }

    let mut mqtt = None;
    let transport: Arc<dyn Transport> = if config.mqtt.enabled {
        let (client, events) = MqttBus::connect(&config.mqtt);
        let sender = commands.clone();
        let subscriptions = sender.topics();
        let events_task = tokio::spawn(events.run(
            subscriptions,
            move |topic, payload| sender.deliver_logged(topic, payload),
            io_shutdown.clone(),
        ));
        mqtt = Some((client.clone(), events_task));
        Arc::new(client)
    } else {
        info!("mqtt disabled, using in-process bus");
        let local = MemoryBus::new(config.mqtt.request_capacity);
        tasks.push(tokio::spawn(bus::memory::route_commands(local.subscribe(), commands.clone())));
        Arc::new(local)
    };
    drop(commands);

    tasks.push(tokio::spawn(telemetry::run_publisher(samples, transport, config.topics.clone())));

    let start = config.limits.clamp(config.simulation.initial_position);
    let sim = Simulator::new(
        ControllerState::new(start),
        Plant::new(config.plant.clone()),
        ModeController::new(config.limits.clone()),
        controller,
    );
    let control = tokio::spawn(sim::run_control_loop(
        sim,
        inbox,
        publisher,
        config.simulation.period(),
        shutdown,
    ));

    tokio::signal::ctrl_c().await.context("installing Ctrl-C handler")?;
    info!("shutdown signal received");

    let _ = stop.send(true);
    let final_state = control.await.context("control loop panicked")?;

    if let Some((client, mut events_task)) = mqtt {
        let queued = client.disconnect(MQTT_DRAIN).await;
        if let Err(e) = &queued {
            warn!(error = %e, "mqtt disconnect failed");
        }
        if queued.is_err() || tokio::time::timeout(MQTT_DRAIN, &mut events_task).await.is_err() {
            warn!("mqtt disconnect not confirmed, stopping event loop");
            let _ = stop_io.send(true);
            let _ = events_task.await;
        }
    }

    let _ = stop_io.send(true);
    for task in tasks {
        let _ = task.await;
    }

    info!(
        tick = final_state.tick,
        position = final_state.position,
        mode = %final_state.mode,
        "stopped"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// bridge
// ---------------------------------------------------------------------------

async fn run_bridge(config: Config) -> Result<()> {
    if !config.mqtt.enabled {
        bail!("the bridge reads positions from the broker; enable [mqtt] in the configuration");
    }

    let hub = Bridge::new(config.dashboard.capacity);
    let (stop, shutdown) = watch::channel(false);

    let mut mqtt_config = config.mqtt.clone();
    mqtt_config.client_id.push_str("-bridge");
    let (client, events) = MqttBus::connect(&mqtt_config);

    let position_topic = config.topics.position.clone();
    let feed = hub.clone();
    let mut received = 0u64;
    let events_task = tokio::spawn(events.run(
        vec![position_topic.clone()],
        move |topic, payload| {
            if topic != position_topic {
                return;
            }
            received += 1;
            let text = String::from_utf8_lossy(payload);
            match DashboardFrame::parse_payload(topic, &text, received) {
                Ok(frame) => {
                    feed.publish(frame);
                }
                Err(e) => warn!(error = %e, "position payload discarded"),
            }
        },
        shutdown.clone(),
    ));

    let server = tokio::spawn(bridge::serve(config.dashboard.bind, hub, shutdown));

    tokio::signal::ctrl_c().await.context("installing Ctrl-C handler")?;
    info!("shutdown signal received");

    if let Err(e) = client.disconnect(MQTT_DRAIN).await {
        warn!(error = %e, "mqtt disconnect failed");
    }
    let _ = stop.send(true);
    let _ = events_task.await;
    server.await.context("dashboard task panicked")??;
    Ok(())
}

// ---------------------------------------------------------------------------
// simulate
// ---------------------------------------------------------------------------

fn run_offline(
    config: &Config,
    start: f64,
    setpoint: f64,
    ticks: u64,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<()> {
    let sim_config = SimConfig {
        start_position: config.limits.clamp(start),
        setpoint: Some(config.limits.clamp(setpoint.round())),
        max_ticks: ticks,
        plant: config.plant.clone(),
        limits: config.limits.clone(),
    };

    let trajectory = sim::simulate(&sim_config).context("building fuzzy controller")?;
    let summary =
        RunSummary::from_trajectory(sim_config.start_position, &trajectory, config.plant.dead_zone);

    print_report(&sim_config, &trajectory, &summary);

    if let Some(path) = csv {
        io::csv::write_trajectory_file(&path, &trajectory)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "trajectory written");
    }
    if let Some(path) = json {
        io::json::write_summary_file(&path, &summary)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }
    Ok(())
}

fn print_report(config: &SimConfig, trajectory: &[TickReport], summary: &RunSummary) {
    println!();
    println!("====================================================================");
    println!("  FUZZY DRONE SIMULATION");
    println!("====================================================================");
    println!();
    println!("  Run Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Start:         {:>8.1}       Setpoint:     {:>8.1}",
        config.start_position,
        config.setpoint.unwrap_or(config.start_position)
    );
    println!(
        "  Ticks:         {:>8}       Dead zone:    {:>8.1}",
        config.max_ticks, config.plant.dead_zone
    );
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    match summary.settling_tick {
        Some(t) => println!("  Settled at:    tick {:>4}", t),
        None => println!("  Settled at:    not settled"),
    }
    println!("  Overshoot:     {:>8.2}", summary.overshoot);
    println!("  Final pos:     {:>8.2}", summary.final_position);
    if let Some(e) = summary.final_error {
        println!("  Final error:   {:>8.2}", e);
    }
    println!("  Peak power:    {:>8.1} %", summary.max_motor_power_pct);
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>6}  {:>6}  {:>9}  {:>9}  {:>9}  {:>8}",
        "tick", "mode", "position", "error", "d_error", "power %"
    );
    println!("  {}", "─".repeat(58));

    let sample_interval = (trajectory.len() / 30).max(1);
    for (i, r) in trajectory.iter().enumerate() {
        let print = i % sample_interval == 0
            || i + 1 == trajectory.len()
            || Some(r.tick) == summary.settling_tick;
        if !print {
            continue;
        }
        println!(
            "  {:>6}  {:>6}  {:>9.2}  {:>9.2}  {:>9.2}  {:>8.1}",
            r.tick,
            r.mode.to_string(),
            r.position,
            r.error.unwrap_or(0.0),
            r.delta_error.unwrap_or(0.0),
            r.motor_power * 100.0
        );
    }

    println!();
    println!("  Simulation: {} ticks", trajectory.len());
    println!("====================================================================");
    println!();
}
