//! Render an SN76477 configuration to a WAV file.
//!
//! ```text
//! sn76477-render --config ufo.json --seconds 2 --out ufo.wav --diagnostics
//! ```

#![allow(clippy::cast_precision_loss)]

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;

use ti_sn76477::{ChipConfig, Sn76477, WavSink};

const DEFAULT_SECONDS: f64 = 1.0;

struct CliArgs {
    config_path: Option<PathBuf>,
    out_path: PathBuf,
    samples: Option<usize>,
    seconds: f64,
    name: String,
    diagnostics: bool,
}

fn print_usage() {
    eprintln!("Usage: sn76477-render [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <file>    Chip configuration (JSON) [default: power-on]");
    eprintln!("  --out <file>       Output WAV file [default: sn76477.wav]");
    eprintln!("  --samples <n>      Number of samples to render");
    eprintln!("  --seconds <s>      Duration to render [default: 1]");
    eprintln!("  --name <name>      Chip name used in log lines [default: SN76477]");
    eprintln!("  --diagnostics      Log derived frequencies and times");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        out_path: PathBuf::from("sn76477.wav"),
        samples: None,
        seconds: DEFAULT_SECONDS,
        name: "SN76477".to_string(),
        diagnostics: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                cli.config_path = args.get(i).map(PathBuf::from);
            }
            "--out" => {
                i += 1;
                if let Some(path) = args.get(i) {
                    cli.out_path = PathBuf::from(path);
                }
            }
            "--samples" => {
                i += 1;
                cli.samples = args.get(i).and_then(|s| s.parse().ok());
                if cli.samples.is_none() {
                    eprintln!("--samples expects a non-negative integer");
                    process::exit(1);
                }
            }
            "--seconds" => {
                i += 1;
                match args.get(i).and_then(|s| s.parse::<f64>().ok()) {
                    Some(s) if s.is_finite() && s >= 0.0 => cli.seconds = s,
                    _ => {
                        eprintln!("--seconds expects a non-negative number");
                        process::exit(1);
                    }
                }
            }
            "--name" => {
                i += 1;
                if let Some(name) = args.get(i) {
                    cli.name.clone_from(name);
                }
            }
            "--diagnostics" => {
                cli.diagnostics = true;
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn setup_logging(verbose: bool) {
    let level = if verbose { LevelFilter::INFO } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

fn load_config(cli: &CliArgs) -> Result<ChipConfig, Box<dyn Error>> {
    let Some(path) = &cli.config_path else {
        return Ok(ChipConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let config: ChipConfig = serde_json::from_str(&text)
        .map_err(|e| format!("invalid configuration {}: {e}", path.display()))?;
    Ok(config)
}

fn run(cli: &CliArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(cli)?;
    let mut chip = Sn76477::with_name(cli.name.as_str(), config)?;
    if cli.diagnostics {
        chip.log_complete_state();
    } else {
        chip.set_observer(None);
    }

    let count = cli.samples.unwrap_or_else(|| {
        emu_core::Ticks::from_seconds(cli.seconds, config.sample_rate).get() as usize
    });

    let mut sink = WavSink::create(&cli.out_path, config.sample_rate)?;
    let report = chip.generate_to_sink(count, &mut sink);
    if let Some(e) = report.error {
        return Err(format!(
            "wrote {} of {} samples to {}: {e}",
            report.written,
            report.samples.len(),
            cli.out_path.display()
        )
        .into());
    }
    sink.finalize()?;

    eprintln!(
        "Rendered {} samples ({:.3} s at {} Hz) to {}",
        report.samples.len(),
        report.samples.len() as f64 / f64::from(config.sample_rate),
        config.sample_rate,
        cli.out_path.display()
    );
    Ok(())
}

fn main() {
    let cli = parse_args();
    setup_logging(cli.diagnostics);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
