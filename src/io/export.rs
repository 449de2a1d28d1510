//! CSV and JSON export for completed runs.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::sim::kpi::KpiReport;
use crate::sim::types::{RunStats, SimulationOutput};

/// Column header for the aggregate step CSV.
const STEPS_HEADER: &str = "timestep,time_hr,household_kw,ev_kw,total_kw,headroom_kw,\
                            vehicles_home,vehicles_connected,vehicles_queued,blackout";

/// Column header for the per-vehicle long-format CSV.
const VEHICLES_HEADER: &str = "vehicle_id,timestep,at_home,charging_kw,soc_kwh";

/// Exports aggregate step results to a CSV file at the given path.
///
/// # Errors
///
/// Returns `SimError::Io` if the file cannot be created and
/// `SimError::Csv` if writing fails.
pub fn export_steps_csv(output: &SimulationOutput, path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_steps_csv(output, io::BufWriter::new(file))
}

/// Writes aggregate step results as CSV to any writer.
///
/// One header row followed by one row per timestep. Produces identical
/// bytes for identical inputs.
///
/// # Errors
///
/// Returns `SimError::Csv` if writing fails.
pub fn write_steps_csv(output: &SimulationOutput, writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(STEPS_HEADER.split(',').map(str::trim))?;

    for s in &output.steps {
        wtr.write_record(&[
            s.timestep.to_string(),
            format!("{:.4}", s.time_hr),
            format!("{:.4}", s.household_kw),
            format!("{:.4}", s.ev_kw),
            format!("{:.4}", s.total_kw),
            format!("{:.4}", s.headroom_kw),
            s.vehicles_home.to_string(),
            s.vehicles_connected.to_string(),
            s.vehicles_queued.to_string(),
            s.blackout.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports per-vehicle series to a CSV file at the given path.
///
/// # Errors
///
/// Same as [`export_steps_csv`].
pub fn export_vehicles_csv(output: &SimulationOutput, path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_vehicles_csv(output, io::BufWriter::new(file))
}

/// Writes per-vehicle series in long format: one row per vehicle and
/// timestep, vehicles in id order.
///
/// # Errors
///
/// Returns `SimError::Csv` if writing fails.
pub fn write_vehicles_csv(output: &SimulationOutput, writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(VEHICLES_HEADER.split(','))?;

    for v in &output.vehicles {
        let id = v.id().to_string();
        let st = &v.state;
        for t in output.horizon.timesteps() {
            wtr.write_record(&[
                id.clone(),
                t.to_string(),
                st.at_home[t].to_string(),
                format!("{:.4}", st.charging_kw[t]),
                format!("{:.4}", st.soc_kwh[t]),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct RunSummary<'a> {
    strategy: &'a str,
    total_steps: usize,
    dt_hours: f32,
    vehicles: usize,
    kpi: &'a KpiReport,
    stats: &'a RunStats,
    scenario: &'a ScenarioConfig,
}

/// Exports the run summary (KPIs, counters, scenario echo) as JSON.
///
/// # Errors
///
/// Returns `SimError::Io` if the file cannot be created and
/// `SimError::Json` if serialization fails.
pub fn export_summary_json(
    scenario: &ScenarioConfig,
    output: &SimulationOutput,
    kpi: &KpiReport,
    path: &Path,
) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_summary_json(scenario, output, kpi, io::BufWriter::new(file))
}

/// Writes the run summary as pretty-printed JSON to any writer.
///
/// # Errors
///
/// Returns `SimError::Json` if serialization fails and `SimError::Io`
/// if the final flush fails.
pub fn write_summary_json(
    scenario: &ScenarioConfig,
    output: &SimulationOutput,
    kpi: &KpiReport,
    mut writer: impl Write,
) -> Result<(), SimError> {
    let summary = RunSummary {
        strategy: &output.strategy,
        total_steps: output.horizon.total_steps(),
        dt_hours: output.horizon.dt_hours,
        vehicles: output.vehicles.len(),
        kpi,
        stats: &output.stats,
        scenario,
    };
    serde_json::to_writer_pretty(&mut writer, &summary)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
