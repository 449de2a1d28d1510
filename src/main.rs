//! EV charging simulator entry point: CLI wiring and exports.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use ev_charge_sim::config::ScenarioConfig;
use ev_charge_sim::io::export::{export_steps_csv, export_summary_json, export_vehicles_csv};
use ev_charge_sim::runner::run_scenario;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    configuration_override: Option<u8>,
    telemetry_out: Option<String>,
    vehicles_out: Option<String>,
    summary_out: Option<String>,
}

fn print_help() {
    eprintln!("ev-charge-sim: uncoordinated EV charging in a residential building");
    eprintln!();
    eprintln!("Usage: ev-charge-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --configuration <1|2|3>  Override charging configuration");
    eprintln!("  --telemetry-out <path>   Export per-step results to CSV");
    eprintln!("  --vehicles-out <path>    Export per-vehicle series to CSV");
    eprintln!("  --summary-out <path>     Export KPI summary to JSON");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following a flag or exits with a message.
fn flag_value(args: &[String], i: usize, flag: &str, what: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        configuration_override: None,
        telemetry_out: None,
        vehicles_out: None,
        summary_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(flag_value(&args, i, flag, "path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, flag, "name"));
            }
            "--seed" => {
                i += 1;
                let raw = flag_value(&args, i, flag, "u64");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--configuration" => {
                i += 1;
                let raw = flag_value(&args, i, flag, "1, 2 or 3");
                if let Ok(c) = raw.parse::<u8>() {
                    cli.configuration_override = Some(c);
                } else {
                    eprintln!("error: --configuration value \"{raw}\" is not 1, 2 or 3");
                    process::exit(1);
                }
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out = Some(flag_value(&args, i, flag, "path"));
            }
            "--vehicles-out" => {
                i += 1;
                cli.vehicles_out = Some(flag_value(&args, i, flag, "path"));
            }
            "--summary-out" => {
                i += 1;
                cli.summary_out = Some(flag_value(&args, i, flag, "path"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = parse_args();
    init_logging();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(c) = cli.configuration_override {
        scenario.simulation.configuration = c;
    }

    let result = match run_scenario(&scenario) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!("Configuration: {}", result.output.strategy);
    println!("{}", result.kpi);

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_steps_csv(&result.output, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }

    if let Some(ref path) = cli.vehicles_out {
        if let Err(e) = export_vehicles_csv(&result.output, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Vehicle series written to {path}");
    }

    if let Some(ref path) = cli.summary_out {
        if let Err(e) = export_summary_json(&scenario, &result.output, &result.kpi, Path::new(path))
        {
            eprintln!("error: failed to write JSON: {e}");
            process::exit(1);
        }
        eprintln!("Summary written to {path}");
    }
}
