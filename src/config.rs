//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SimError;
use crate::fleet::{BatteryParams, TravelGenerator, TravelParams, VehicleProfile};
use crate::household::{self, HouseholdLoad};
use crate::sim::assignment::AssignmentTable;
use crate::sim::blackout::BlackoutWindow;
use crate::sim::horizon::{Horizon, MINUTES_PER_DAY};
use crate::sim::strategy::{DedicatedShare, SharedPool, StaticAssignment, Strategy};
use crate::sim::types::SimConfig;

/// Seed offset for the travel generator so it does not share a stream
/// with the household noise.
const TRAVEL_SEED_OFFSET: u64 = 57;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Horizon, seed, and charging configuration id.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Building grid connection.
    #[serde(default)]
    pub grid: GridConfig,
    /// Charging-point infrastructure.
    #[serde(default)]
    pub charging: ChargingConfig,
    /// Non-EV demand.
    #[serde(default)]
    pub household: HouseholdConfig,
    /// Vehicles and their travel pattern.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Vehicle to charging-point partition (configuration 3).
    #[serde(default)]
    pub assignment: AssignmentConfig,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Step length in minutes (must divide 1440).
    pub resolution_minutes: usize,
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// Master random seed.
    pub seed: u64,
    /// Charging configuration: `1` dedicated, `2` shared pool, `3` assigned.
    pub configuration: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution_minutes: 15,
            days: 7,
            seed: 42,
            configuration: 2,
        }
    }
}

/// Building grid connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Connection capacity (kW).
    pub max_kw: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { max_kw: 100.0 }
    }
}

/// Charging-point infrastructure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargingConfig {
    /// Rated power of one charging point (kW).
    pub rated_kw: f32,
    /// Installed charging points (configurations 2 and 3).
    pub num_cp: usize,
    /// Maximum continuous connection time (hours); unset disables the cap.
    pub max_duration_hours: Option<f32>,
    /// Optional daily no-charging window.
    pub blackout: Option<BlackoutConfig>,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            rated_kw: 7.2,
            num_cp: 5,
            max_duration_hours: Some(4.0),
            blackout: None,
        }
    }
}

/// Daily no-charging window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlackoutConfig {
    /// Start hour of day (inclusive).
    pub start_hour: f32,
    /// End hour of day (exclusive); may wrap past midnight.
    pub end_hour: f32,
}

/// Non-EV demand source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HouseholdConfig {
    /// `"profile"` (synthetic) or `"csv"`.
    pub source: String,
    /// CSV file with a `household_kw` column, used when `source = "csv"`.
    pub csv_path: Option<PathBuf>,
    /// Number of apartments.
    pub apartments: usize,
    /// Mean demand per apartment (kW).
    pub base_kw: f32,
    /// Daily swing per apartment (kW).
    pub amp_kw: f32,
    /// Phase offset (radians).
    pub phase_rad: f32,
    /// Building-level noise standard deviation (kW).
    pub noise_std: f32,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            source: "profile".to_string(),
            csv_path: None,
            apartments: 40,
            base_kw: 0.5,
            amp_kw: 0.3,
            phase_rad: 1.2,
            noise_std: 1.0,
        }
    }
}

/// Fleet and travel pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of generated vehicles; ignored when `vehicles` is non-empty.
    pub size: usize,
    /// Battery capacity (kWh).
    pub capacity_kwh: f32,
    /// SOC-critical as a fraction of capacity.
    pub soc_critical_frac: f32,
    /// SOC-max as a fraction of capacity.
    pub soc_max_frac: f32,
    /// Initial SOC as a fraction of capacity.
    pub soc_init_frac: f32,
    /// Daily probability of a trip.
    pub trip_probability: f32,
    /// Mean departure hour.
    pub departure_hour_mean: f32,
    /// Departure hour standard deviation.
    pub departure_hour_std: f32,
    /// Mean hours away.
    pub away_hours_mean: f32,
    /// Hours-away standard deviation.
    pub away_hours_std: f32,
    /// Minimum trip energy (kWh).
    pub trip_kwh_min: f32,
    /// Maximum trip energy (kWh).
    pub trip_kwh_max: f32,
    /// Fixed vehicles; when present they replace the generated fleet.
    pub vehicles: Vec<VehicleConfig>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            size: 20,
            capacity_kwh: 60.0,
            soc_critical_frac: 0.1,
            soc_max_frac: 0.9,
            soc_init_frac: 0.6,
            trip_probability: 0.85,
            departure_hour_mean: 7.5,
            departure_hour_std: 1.0,
            away_hours_mean: 9.0,
            away_hours_std: 2.0,
            trip_kwh_min: 5.0,
            trip_kwh_max: 15.0,
            vehicles: Vec::new(),
        }
    }
}

/// One vehicle with a fixed schedule. Timestamps are step indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleConfig {
    pub capacity_kwh: f32,
    pub soc_critical_kwh: f32,
    pub soc_max_kwh: f32,
    pub soc_init_kwh: f32,
    #[serde(default)]
    pub t_dep: Vec<usize>,
    #[serde(default)]
    pub t_arr: Vec<usize>,
    #[serde(default)]
    pub travel_energy_kwh: Vec<f32>,
}

/// Vehicle to charging-point partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssignmentConfig {
    /// `"round_robin"` or `"explicit"`.
    pub mode: String,
    /// Explicit groups, used when `mode = "explicit"`.
    pub groups: Vec<AssignmentGroup>,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            mode: "round_robin".to_string(),
            groups: Vec::new(),
        }
    }
}

/// Vehicles permanently served by one charging point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentGroup {
    pub cp: usize,
    pub vehicles: Vec<usize>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.resolution_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Charging configuration identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingTopology {
    /// Configuration 1: one dedicated point per vehicle.
    Dedicated,
    /// Configuration 2: shared pool with a global queue.
    Shared,
    /// Configuration 3: static vehicle to point assignment.
    Assigned,
}

impl ChargingTopology {
    /// Maps a numeric identifier to a topology.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for anything but `1`, `2`, or `3`.
    pub fn from_id(id: u8) -> Result<Self, ConfigError> {
        match id {
            1 => Ok(Self::Dedicated),
            2 => Ok(Self::Shared),
            3 => Ok(Self::Assigned),
            _ => Err(ConfigError::new(
                "simulation.configuration",
                format!("must be 1, 2 or 3, got {id}"),
            )),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: shared pool of five points.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            grid: GridConfig::default(),
            charging: ChargingConfig::default(),
            household: HouseholdConfig::default(),
            fleet: FleetConfig::default(),
            assignment: AssignmentConfig::default(),
        }
    }

    /// Returns the dedicated preset: one point per vehicle, headroom split
    /// among vehicles at home.
    pub fn dedicated() -> Self {
        Self {
            simulation: SimulationConfig {
                configuration: 1,
                ..SimulationConfig::default()
            },
            charging: ChargingConfig {
                max_duration_hours: None,
                ..ChargingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the assigned preset: four points, vehicles assigned round-robin.
    pub fn assigned() -> Self {
        Self {
            simulation: SimulationConfig {
                configuration: 3,
                ..SimulationConfig::default()
            },
            charging: ChargingConfig {
                num_cp: 4,
                ..ChargingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the tight-grid preset: small connection, evening blackout.
    pub fn tight_grid() -> Self {
        Self {
            grid: GridConfig { max_kw: 45.0 },
            charging: ChargingConfig {
                num_cp: 3,
                max_duration_hours: Some(3.0),
                blackout: Some(BlackoutConfig {
                    start_hour: 17.0,
                    end_hour: 20.0,
                }),
                ..ChargingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "dedicated", "assigned", "tight_grid"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "dedicated" => Ok(Self::dedicated()),
            "assigned" => Ok(Self::assigned()),
            "tight_grid" => Ok(Self::tight_grid()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Number of vehicles the scenario simulates.
    pub fn fleet_size(&self) -> usize {
        if self.fleet.vehicles.is_empty() {
            self.fleet.size
        } else {
            self.fleet.vehicles.len()
        }
    }

    /// Every scalar float field, paired with its TOML path.
    fn float_fields(&self) -> Vec<(&'static str, f32)> {
        let c = &self.charging;
        let h = &self.household;
        let f = &self.fleet;
        let mut fields = vec![
            ("grid.max_kw", self.grid.max_kw),
            ("charging.rated_kw", c.rated_kw),
            ("household.base_kw", h.base_kw),
            ("household.amp_kw", h.amp_kw),
            ("household.phase_rad", h.phase_rad),
            ("household.noise_std", h.noise_std),
            ("fleet.capacity_kwh", f.capacity_kwh),
            ("fleet.soc_critical_frac", f.soc_critical_frac),
            ("fleet.soc_max_frac", f.soc_max_frac),
            ("fleet.soc_init_frac", f.soc_init_frac),
            ("fleet.trip_probability", f.trip_probability),
            ("fleet.departure_hour_mean", f.departure_hour_mean),
            ("fleet.departure_hour_std", f.departure_hour_std),
            ("fleet.away_hours_mean", f.away_hours_mean),
            ("fleet.away_hours_std", f.away_hours_std),
            ("fleet.trip_kwh_min", f.trip_kwh_min),
            ("fleet.trip_kwh_max", f.trip_kwh_max),
        ];
        if let Some(hours) = c.max_duration_hours {
            fields.push(("charging.max_duration_hours", hours));
        }
        if let Some(b) = &c.blackout {
            fields.push(("charging.blackout.start_hour", b.start_hour));
            fields.push(("charging.blackout.end_hour", b.end_hour));
        }
        fields
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.resolution_minutes == 0 || MINUTES_PER_DAY % s.resolution_minutes != 0 {
            errors.push(ConfigError::new(
                "simulation.resolution_minutes",
                "must be > 0 and divide 1440",
            ));
        }
        if s.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }
        let topology = ChargingTopology::from_id(s.configuration);
        if let Err(e) = &topology {
            errors.push(e.clone());
        }

        for (field, value) in self.float_fields() {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, format!("must be finite, got {value}")));
            }
        }

        if self.grid.max_kw <= 0.0 {
            errors.push(ConfigError::new("grid.max_kw", "must be > 0"));
        }

        let c = &self.charging;
        if c.rated_kw <= 0.0 {
            errors.push(ConfigError::new("charging.rated_kw", "must be > 0"));
        }
        if c.num_cp == 0 && !matches!(topology, Ok(ChargingTopology::Dedicated)) {
            errors.push(ConfigError::new("charging.num_cp", "must be > 0"));
        }
        if let Some(hours) = c.max_duration_hours {
            let min_hours = s.resolution_minutes as f32 / 60.0;
            if hours < min_hours {
                errors.push(ConfigError::new(
                    "charging.max_duration_hours",
                    format!("must be at least one step ({min_hours} h)"),
                ));
            }
        }
        if let Some(b) = c
            .blackout
            .as_ref()
            .filter(|b| b.start_hour.is_finite() && b.end_hour.is_finite())
        {
            if !(0.0..=24.0).contains(&b.start_hour) || !(0.0..=24.0).contains(&b.end_hour) {
                errors.push(ConfigError::new(
                    "charging.blackout",
                    "hours must lie in [0, 24]",
                ));
            } else if b.start_hour == b.end_hour {
                errors.push(ConfigError::new(
                    "charging.blackout",
                    "start_hour must differ from end_hour",
                ));
            }
        }

        let h = &self.household;
        match h.source.as_str() {
            "profile" => {}
            "csv" => {
                if h.csv_path.is_none() {
                    errors.push(ConfigError::new(
                        "household.csv_path",
                        "required when household.source = \"csv\"",
                    ));
                }
            }
            other => errors.push(ConfigError::new(
                "household.source",
                format!("must be \"profile\" or \"csv\", got \"{other}\""),
            )),
        }
        if h.base_kw < 0.0 || h.noise_std < 0.0 {
            errors.push(ConfigError::new(
                "household.base_kw",
                "base_kw and noise_std must be >= 0",
            ));
        }

        let f = &self.fleet;
        if self.fleet_size() == 0 {
            errors.push(ConfigError::new("fleet.size", "must be > 0"));
        }
        if f.vehicles.is_empty() {
            if f.capacity_kwh <= 0.0 {
                errors.push(ConfigError::new("fleet.capacity_kwh", "must be > 0"));
            }
            let fracs = [
                ("fleet.soc_critical_frac", f.soc_critical_frac),
                ("fleet.soc_max_frac", f.soc_max_frac),
                ("fleet.soc_init_frac", f.soc_init_frac),
                ("fleet.trip_probability", f.trip_probability),
            ];
            for (field, value) in fracs {
                if value.is_finite() && !(0.0..=1.0).contains(&value) {
                    errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
                }
            }
            if f.soc_critical_frac > f.soc_max_frac {
                errors.push(ConfigError::new(
                    "fleet.soc_critical_frac",
                    "must be <= fleet.soc_max_frac",
                ));
            }
            if f.soc_init_frac > f.soc_max_frac {
                errors.push(ConfigError::new(
                    "fleet.soc_init_frac",
                    "must be <= fleet.soc_max_frac",
                ));
            }
            if f.trip_kwh_min < 0.0 || f.trip_kwh_min > f.trip_kwh_max {
                errors.push(ConfigError::new(
                    "fleet.trip_kwh_min",
                    "must be >= 0 and <= fleet.trip_kwh_max",
                ));
            }
        }

        let a = &self.assignment;
        match a.mode.as_str() {
            "round_robin" => {}
            "explicit" => {
                if a.groups.is_empty() && matches!(topology, Ok(ChargingTopology::Assigned)) {
                    errors.push(ConfigError::new(
                        "assignment.groups",
                        "required when assignment.mode = \"explicit\"",
                    ));
                }
            }
            other => errors.push(ConfigError::new(
                "assignment.mode",
                format!("must be \"round_robin\" or \"explicit\", got \"{other}\""),
            )),
        }

        errors
    }

    /// Rejects the scenario if [`ScenarioConfig::validate`] reports anything.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` with every field error.
    pub fn ensure_valid(&self) -> Result<(), SimError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimError::InvalidConfig(errors))
        }
    }

    /// Charging configuration selected by `simulation.configuration`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unknown identifier.
    pub fn topology(&self) -> Result<ChargingTopology, ConfigError> {
        ChargingTopology::from_id(self.simulation.configuration)
    }

    /// Global timestamp sequence. Call only on a validated scenario.
    pub fn horizon(&self) -> Horizon {
        Horizon::new(self.simulation.resolution_minutes, self.simulation.days)
    }

    /// Driver settings derived from the scenario.
    pub fn sim_config(&self) -> SimConfig {
        let mut cfg = SimConfig::new(self.horizon(), self.grid.max_kw, self.charging.rated_kw);
        if let Some(b) = &self.charging.blackout {
            cfg = cfg.with_blackout(BlackoutWindow::new(b.start_hour, b.end_hour));
        }
        cfg
    }

    /// Duration cap converted to steps once, at setup.
    pub fn max_duration_steps(&self, horizon: &Horizon) -> Option<usize> {
        self.charging
            .max_duration_hours
            .map(|h| horizon.steps_for_hours(h).max(1))
    }

    /// Builds the charging strategy for the configured topology.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` for an unknown configuration id and
    /// `SimError::Assignment` for an inconsistent assignment table.
    pub fn strategy(&self, horizon: &Horizon) -> Result<Strategy, SimError> {
        let max_duration_steps = self.max_duration_steps(horizon);
        let num_cp = self.charging.num_cp;
        Ok(match self.topology()? {
            ChargingTopology::Dedicated => Strategy::Dedicated(DedicatedShare),
            ChargingTopology::Shared => Strategy::Shared(SharedPool {
                num_cp,
                max_duration_steps,
            }),
            ChargingTopology::Assigned => {
                let fleet_size = self.fleet_size();
                let table = match self.assignment.mode.as_str() {
                    "explicit" => {
                        let groups: Vec<(usize, Vec<usize>)> = self
                            .assignment
                            .groups
                            .iter()
                            .map(|g| (g.cp, g.vehicles.clone()))
                            .collect();
                        AssignmentTable::from_groups(&groups, num_cp, fleet_size)?
                    }
                    _ => AssignmentTable::round_robin(num_cp, fleet_size)?,
                };
                Strategy::Assigned(StaticAssignment {
                    table,
                    max_duration_steps,
                })
            }
        })
    }

    /// Vehicle profiles: the fixed list when given, otherwise a generated fleet.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Schedule` for the first vehicle whose schedule
    /// or battery bounds are rejected.
    pub fn fleet_profiles(&self, horizon: &Horizon) -> Result<Vec<VehicleProfile>, SimError> {
        let f = &self.fleet;
        if !f.vehicles.is_empty() {
            return f
                .vehicles
                .iter()
                .enumerate()
                .map(|(id, v)| {
                    VehicleProfile::new(
                        id,
                        v.capacity_kwh,
                        v.soc_critical_kwh,
                        v.soc_max_kwh,
                        v.soc_init_kwh,
                        v.t_dep.clone(),
                        v.t_arr.clone(),
                        v.travel_energy_kwh.clone(),
                        horizon.total_steps(),
                    )
                    .map_err(|source| SimError::Schedule { vehicle: id, source })
                })
                .collect();
        }

        let mut generator = TravelGenerator::new(
            TravelParams {
                trip_probability: f.trip_probability,
                departure_hour_mean: f.departure_hour_mean,
                departure_hour_std: f.departure_hour_std,
                away_hours_mean: f.away_hours_mean,
                away_hours_std: f.away_hours_std,
                trip_kwh_min: f.trip_kwh_min,
                trip_kwh_max: f.trip_kwh_max,
            },
            BatteryParams {
                capacity_kwh: f.capacity_kwh,
                soc_critical_frac: f.soc_critical_frac,
                soc_max_frac: f.soc_max_frac,
                soc_init_frac: f.soc_init_frac,
            },
            self.simulation.seed.wrapping_add(TRAVEL_SEED_OFFSET),
        );
        generator.fleet(f.size, horizon)
    }

    /// Household demand over the horizon.
    ///
    /// # Errors
    ///
    /// Returns an I/O, CSV, or series-length error when reading from CSV.
    pub fn household_series(&self, horizon: &Horizon) -> Result<Vec<f32>, SimError> {
        let h = &self.household;
        match (&*h.source, &h.csv_path) {
            ("csv", Some(path)) => household::read_series_file(path, horizon),
            _ => Ok(HouseholdLoad::new(
                h.apartments,
                h.base_kw,
                h.amp_kw,
                h.phase_rad,
                h.noise_std,
                self.simulation.seed,
            )
            .series(horizon)),
        }
    }
}
