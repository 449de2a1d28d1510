use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::sim::engine::Engine;
use crate::sim::kpi::KpiReport;
use crate::sim::types::SimulationOutput;

/// Completed run with its KPIs.
pub struct SimulationResult {
    pub output: SimulationOutput,
    pub kpi: KpiReport,
}

/// Validates `config`, builds every collaborator, and runs the driver to
/// the end of the horizon.
///
/// # Errors
///
/// Returns `SimError::InvalidConfig` listing every field error, or the
/// first error raised while building the fleet, the household series, the
/// strategy, or while stepping.
pub fn run_scenario(config: &ScenarioConfig) -> Result<SimulationResult, SimError> {
    config.ensure_valid()?;

    let horizon = config.horizon();
    let profiles = config.fleet_profiles(&horizon)?;
    let household_kw = config.household_series(&horizon)?;
    let strategy = config.strategy(&horizon)?;
    info!(
        configuration = config.simulation.configuration,
        seed = config.simulation.seed,
        vehicles = profiles.len(),
        "scenario built"
    );

    let engine = Engine::new(config.sim_config(), strategy, profiles, household_kw)?;
    let output = engine.run()?;
    let kpi = KpiReport::from_output(&output);
    Ok(SimulationResult { output, kpi })
}
