use std::path::PathBuf;

use clap::Parser;
use sensor_dispatch::list_midi_ports;
use sensor_instrument::logging::init_logging;
use sensor_instrument::{Instrument, InstrumentConfig, InstrumentError};

#[derive(Parser)]
#[command(name = "instrument")]
#[command(about = "Route motion-sensor samples to OSC messages and MIDI notes")]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulated ticks (overrides `sample_count`).
    #[arg(long)]
    samples: Option<usize>,

    /// OSC receiver as host:port (overrides `osc_target`).
    #[arg(long)]
    target: Option<String>,

    /// Seed for the simulated sensor readings.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the available MIDI output ports and exit.
    #[arg(long)]
    list_ports: bool,

    /// How many dispatch records to print after the run.
    #[arg(long, default_value_t = 5)]
    history: usize,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), InstrumentError> {
    if args.list_ports {
        let ports = list_midi_ports()?;
        if ports.is_empty() {
            println!("  (no MIDI output ports)");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("  [{}] {}", i, name);
        }
        return Ok(());
    }

    let mut cfg = match &args.config {
        Some(path) => InstrumentConfig::from_file(path)?,
        None => InstrumentConfig::default(),
    };
    if let Some(n) = args.samples {
        cfg.sample_count = n;
    }
    if let Some(target) = args.target {
        cfg.osc_target = target;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }

    init_logging(&cfg.log_filter)?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Sensor Instrument: motion → OSC / MIDI router         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  OSC target : {}{}", cfg.osc_target, cfg.osc_prefix);
    println!("  Sensors    : {}", cfg.sensors.iter().map(|s| s.name()).collect::<Vec<_>>().join(", "));
    println!("  Ticks      : {} × {} ms", cfg.sample_count, cfg.sample_interval_ms);
    println!();

    let app = Instrument::new(cfg)?;
    let summary = app.run(app.sim_source());

    println!("{}", serde_json::json!({ "summary": summary }));
    for record in app.dispatch().get_history(Some(args.history)) {
        println!("{}", record.to_record());
    }
    Ok(())
}
