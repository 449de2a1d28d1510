//! Error types shared across configuration, fleet construction, and the driver.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::sim::slot::SlotError;

/// Rejected vehicle travel schedule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error(
        "departures ({departures}), arrivals ({arrivals}) and trip energies ({energies}) must have equal length"
    )]
    LengthMismatch {
        departures: usize,
        arrivals: usize,
        energies: usize,
    },
    #[error("timestamps are not strictly interleaved at trip {trip}")]
    NotInterleaved { trip: usize },
    #[error("timestamp {timestep} lies outside the horizon of {total_steps} steps")]
    OutsideHorizon { timestep: usize, total_steps: usize },
    #[error("trip {trip} has negative travel energy {energy_kwh} kWh")]
    NegativeEnergy { trip: usize, energy_kwh: f32 },
    #[error("battery bounds invalid: {0}")]
    Bounds(String),
}

/// Rejected charging-point assignment table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("charging point {cp} is not installed (num_cp = {num_cp})")]
    UnknownChargingPoint { cp: usize, num_cp: usize },
    #[error("charging point {0} is listed more than once")]
    DuplicateChargingPoint(usize),
    #[error("vehicle {vehicle} is not part of the fleet (fleet size = {fleet_size})")]
    UnknownVehicle { vehicle: usize, fleet_size: usize },
    #[error("vehicle {0} is assigned to more than one charging point")]
    AssignedTwice(usize),
    #[error("vehicle {0} is not assigned to any charging point")]
    Unassigned(usize),
    #[error("no charging points installed")]
    NoChargingPoints,
}

/// Top-level error for building and running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration:\n{}", join_config_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
    #[error(
        "household load {household_kw:.2} kW exceeds grid capacity {grid_max_kw:.2} kW at timestep {timestep}"
    )]
    CapacityExceeded {
        timestep: usize,
        household_kw: f32,
        grid_max_kw: f32,
    },
    #[error("vehicle {vehicle}: {source}")]
    Schedule {
        vehicle: usize,
        #[source]
        source: ScheduleError,
    },
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("household load {household_kw} kW at timestep {timestep} must be finite and >= 0")]
    HouseholdValue { timestep: usize, household_kw: f32 },
    #[error("household series has {got} values, horizon needs {expected}")]
    HouseholdSeries { expected: usize, got: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        SimError::InvalidConfig(vec![err])
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
