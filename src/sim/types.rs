//! Core simulation types: driver settings and per-step results.

use std::fmt;

use serde::Serialize;

use crate::fleet::Vehicle;

use super::blackout::BlackoutWindow;
use super::horizon::Horizon;

/// Settings the driver needs besides the fleet and the household series.
///
/// Passed explicitly into the engine so several configurations can run
/// side by side in one process.
///
/// # Examples
///
/// ```
/// use ev_charge_sim::sim::horizon::Horizon;
/// use ev_charge_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(Horizon::new(15, 7), 500.0, 11.0);
/// assert_eq!(cfg.horizon.total_steps(), 672);
/// assert!(cfg.blackout.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Global timestamp sequence.
    pub horizon: Horizon,
    /// Building grid connection capacity (kW).
    pub grid_max_kw: f32,
    /// Rated power of one charging point (kW).
    pub cp_rated_kw: f32,
    /// Optional daily no-charging window.
    pub blackout: Option<BlackoutWindow>,
}

impl SimConfig {
    /// Creates driver settings without a blackout window.
    ///
    /// # Panics
    ///
    /// Panics if `grid_max_kw` or `cp_rated_kw` is negative.
    pub fn new(horizon: Horizon, grid_max_kw: f32, cp_rated_kw: f32) -> Self {
        assert!(grid_max_kw >= 0.0, "grid_max_kw must be >= 0");
        assert!(cp_rated_kw >= 0.0, "cp_rated_kw must be >= 0");
        Self {
            horizon,
            grid_max_kw,
            cp_rated_kw,
            blackout: None,
        }
    }

    /// Adds a daily blackout window.
    pub fn with_blackout(mut self, window: BlackoutWindow) -> Self {
        self.blackout = Some(window);
        self
    }

    /// Returns `true` when step `t` falls inside the blackout window.
    pub fn in_blackout(&self, t: usize) -> bool {
        self.blackout
            .is_some_and(|w| w.is_active(&self.horizon, t))
    }
}

/// Aggregate record of one simulation timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    /// Timestep index.
    pub timestep: usize,
    /// Elapsed simulation time in hours.
    pub time_hr: f32,
    /// Non-EV demand (kW).
    pub household_kw: f32,
    /// Sum of delivered charging power over all vehicles (kW).
    pub ev_kw: f32,
    /// Household plus EV load at the grid connection (kW).
    pub total_kw: f32,
    /// Capacity left after household load (kW).
    pub headroom_kw: f32,
    /// Vehicles parked at home.
    pub vehicles_home: usize,
    /// Vehicles connected to a charging point.
    pub vehicles_connected: usize,
    /// Vehicles waiting in an admission queue.
    pub vehicles_queued: usize,
    /// Whether the step lies in the blackout window.
    pub blackout: bool,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} ({:>6.2}h) | total={:>7.2} kW  household={:>7.2} kW  ev={:>6.2} kW \
             | home={} connected={} queued={}{}",
            self.timestep,
            self.time_hr,
            self.total_kw,
            self.household_kw,
            self.ev_kw,
            self.vehicles_home,
            self.vehicles_connected,
            self.vehicles_queued,
            if self.blackout { " [blackout]" } else { "" },
        )
    }
}

/// Event counters gathered by the driver while it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Connect transitions over all charging points.
    pub connections: usize,
    /// Disconnects because the vehicle left.
    pub disconnects_departure: usize,
    /// Disconnects because SOC reached SOC-max.
    pub disconnects_full: usize,
    /// Disconnects forced by the continuous-duration cap.
    pub disconnects_duration_cap: usize,
    /// Arrivals that left a vehicle below SOC-critical.
    pub critical_soc_events: usize,
    /// Longest admission queue seen in any group.
    pub max_queue_len: usize,
}

/// Completed run: per-step aggregates plus every vehicle record.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    /// Name of the charging configuration that produced the run.
    pub strategy: String,
    pub horizon: Horizon,
    pub grid_max_kw: f32,
    pub steps: Vec<StepResult>,
    pub vehicles: Vec<Vehicle>,
    pub stats: RunStats,
}

impl SimulationOutput {
    /// EV load series (kW).
    pub fn ev_load_kw(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.ev_kw).collect()
    }

    /// Household load series (kW).
    pub fn household_load_kw(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.household_kw).collect()
    }

    /// Grid (household plus EV) load series (kW).
    pub fn total_load_kw(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.total_kw).collect()
    }

    /// Highest grid load over the horizon (kW).
    pub fn peak_total_kw(&self) -> f32 {
        self.steps.iter().map(|s| s.total_kw).fold(0.0, f32::max)
    }
}
