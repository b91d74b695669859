use browline::telemetry::{HudReadout, TelemetryFrame, TelemetrySampler};
use browline::{
    ControlCommand, ControlOutcome, DeviceWorld, DiagnosticsSystem, FrameQueue, HudSimulation,
    SimulationConfig,
};
use clap::{App, Arg};
use colored::*;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
    Compact,
}

impl OutputFormat {
    fn from_arg(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            "compact" => OutputFormat::Compact,
            _ => OutputFormat::Table,
        }
    }
}

fn is_positive_integer(value: String) -> Result<(), String> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err("value must be a positive integer".into()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("browline-sim")
        .version("0.1.0")
        .author("Browline HUD Team")
        .about("🕶️  Browline HUD - device diagnostics simulation")
        .long_about(
            "Runs the HUD diagnostics simulation and prints snapshots. Type control \
             commands on stdin: 'mode sys|nav|scan', 'power [on|off]', 'status', 'quit'.",
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .help("Seed for reproducible diagnostics")
                .takes_value(true)
                .validator(|v| v.parse::<u64>().map(|_| ()).map_err(|_| "seed must be a number".into())),
        )
        .arg(
            Arg::with_name("fps")
                .long("fps")
                .value_name("FPS")
                .help("Display refresh rate")
                .takes_value(true)
                .validator(is_positive_integer),
        )
        .arg(
            Arg::with_name("frames")
                .short("n")
                .long("frames")
                .value_name("COUNT")
                .help("Stop after this many display refreshes")
                .takes_value(true)
                .validator(is_positive_integer),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["table", "json", "compact"])
                .default_value("table"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match matches.value_of("config") {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = matches.value_of("seed") {
        config.seed = Some(seed.parse()?);
    }
    if let Some(fps) = matches.value_of("fps") {
        config.set_frames_per_second(fps.parse()?);
    }
    if let Some(frames) = matches.value_of("frames") {
        config.max_frames = Some(frames.parse()?);
    }
    config.validate()?;
    let format = OutputFormat::from_arg(matches.value_of("format").unwrap_or("table"));

    run(&config, format).await
}

async fn run(config: &SimulationConfig, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let diagnostics_system = match config.seed {
        Some(seed) => DiagnosticsSystem::seeded(seed),
        None => DiagnosticsSystem::new(),
    };
    let world = DeviceWorld::with_parts(config.specifications.clone(), diagnostics_system);
    let mut simulation = HudSimulation::new(world, FrameQueue::new())
        .with_nominal_frame_delta(config.nominal_frame_delta_ms);

    let changed = Rc::new(Cell::new(false));
    let subscription = {
        let changed = Rc::clone(&changed);
        simulation.subscribe(move || changed.set(true))
    };
    let mut sampler = TelemetrySampler::new(config.readout_every_frames);

    if format == OutputFormat::Table {
        println!("{}", "🕶️  Browline HUD Simulator".bright_blue().bold());
        println!(
            "{} {:.0} fps, seed {}",
            "Running at".dimmed(),
            config.frames_per_second(),
            config.seed.map_or_else(|| "random".to_string(), |seed| seed.to_string())
        );
    }

    simulation.start();
    let started = Instant::now();
    let mut interval = time::interval(Duration::from_millis(config.frame_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut refreshes: u64 = 0;

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;
                simulation.on_display_refresh(timestamp_ms);
                refreshes += 1;

                if changed.replace(false) {
                    if let Some(frame) = sampler.sample(&simulation.snapshot(), timestamp_ms, false) {
                        emit(&frame, format)?;
                    }
                }

                if config.max_frames.is_some_and(|max| refreshes >= max) {
                    info!(refreshes, "frame limit reached");
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(text)) if text.trim().is_empty() => {}
                    Ok(Some(text)) => {
                        let timestamp_ms = started.elapsed().as_secs_f64() * 1000.0;
                        match text.parse::<ControlCommand>().and_then(|command| command.apply(&mut simulation)) {
                            Ok(ControlOutcome::Quit) => break,
                            Ok(_) => {
                                changed.set(false);
                                if let Some(frame) = sampler.sample(&simulation.snapshot(), timestamp_ms, true) {
                                    emit(&frame, format)?;
                                }
                            }
                            Err(e) => {
                                warn!("control command rejected: {}", e);
                                eprintln!("{} {}", "❌".red(), e.to_string().bright_red());
                            }
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("stdin closed: {}", e);
                        stdin_open = false;
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("interrupt received");
                break;
            }
        }
    }

    subscription.unsubscribe();
    simulation.stop();

    let stats = simulation.frame_stats();
    if format == OutputFormat::Table {
        println!(
            "{} {} ticks, avg frame {:.1} ms",
            "🛑 Simulation stopped:".bright_yellow(),
            stats.ticks,
            stats.average_delta_ms().unwrap_or_default()
        );
    }

    Ok(())
}

fn emit(frame: &TelemetryFrame, format: OutputFormat) -> Result<(), serde_json::Error> {
    let readout = HudReadout::from_snapshot(&frame.snapshot);

    match format {
        OutputFormat::Json => println!("{}", frame.to_json()?),
        OutputFormat::Compact => println!("#{} {}", frame.sequence, readout),
        OutputFormat::Table => {
            println!(
                "{} {} {:.0} ms",
                "──".dimmed(),
                format!("frame #{}", frame.sequence).bright_white().bold(),
                frame.timestamp_ms
            );
            for line in readout.lines() {
                let value = if frame.snapshot.is_powered {
                    line.value.bright_cyan()
                } else {
                    line.value.bright_red()
                };
                println!("  {:>5} {}", line.label.unwrap_or_default().bright_blue(), value);
            }
        }
    }

    Ok(())
}
