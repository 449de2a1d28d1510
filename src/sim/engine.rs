//! Simulation driver: runs queueing, allocation, and SOC updates step by step.

use tracing::{info, warn};

use crate::config::ConfigError;
use crate::error::SimError;
use crate::fleet::{Vehicle, VehicleProfile};

use super::allocation::{allocated_kw, share_kw};
use super::grid::GridConnection;
use super::queue::{ChargingGroup, DisconnectReason};
use super::soc::{begin_step, finish_step};
use super::strategy::{ChargingStrategy, check_single_assignment};
use super::types::{RunStats, SimConfig, SimulationOutput, StepResult};

/// Rounding slack when checking the grid load against capacity (kW).
const CAPACITY_TOLERANCE_KW: f32 = 1e-3;

/// Simulation engine owning the fleet, the charging groups, and the
/// household series.
///
/// Generic over `S: ChargingStrategy` for static dispatch. Within each step
/// the phases run in a fixed order: arrivals, queue update, sort, connect,
/// disconnect, allocation, SOC advance.
pub struct Engine<S: ChargingStrategy> {
    config: SimConfig,
    strategy: S,
    vehicles: Vec<Vehicle>,
    household_kw: Vec<f32>,
    groups: Vec<ChargingGroup>,
    grid: GridConnection,
    stats: RunStats,
}

impl<S: ChargingStrategy> Engine<S> {
    /// Creates a new engine after validating all inputs.
    ///
    /// # Arguments
    ///
    /// * `config` - Horizon, grid capacity, rated power, blackout window
    /// * `strategy` - Charging configuration
    /// * `profiles` - Vehicle profiles; `profiles[i].id` must equal `i`
    /// * `household_kw` - Household demand, one value per timestep
    ///
    /// # Errors
    ///
    /// Returns `SimError::HouseholdSeries` if the series length differs from
    /// the horizon, `SimError::InvalidConfig` if vehicle ids are not dense,
    /// `SimError::HouseholdValue` for a negative or non-finite household
    /// value, `SimError::CapacityExceeded` if household demand alone exceeds
    /// grid capacity at any step, and `SimError::Assignment` unless the
    /// strategy places every vehicle in exactly one group.
    pub fn new(
        config: SimConfig,
        strategy: S,
        profiles: Vec<VehicleProfile>,
        household_kw: Vec<f32>,
    ) -> Result<Self, SimError> {
        let total = config.horizon.total_steps();
        if household_kw.len() != total {
            return Err(SimError::HouseholdSeries {
                expected: total,
                got: household_kw.len(),
            });
        }
        if let Some((idx, p)) = profiles.iter().enumerate().find(|(i, p)| p.id != *i) {
            return Err(ConfigError::new(
                "fleet.vehicles",
                format!("vehicle at position {idx} has id {}", p.id),
            )
            .into());
        }

        let grid = GridConnection::with_capacity("Building", config.grid_max_kw);
        grid.validate_household(&household_kw)?;

        let groups = strategy.build_groups(profiles.len());
        check_single_assignment(&groups, profiles.len())?;
        let vehicles = profiles
            .into_iter()
            .map(|p| Vehicle::new(p, total))
            .collect();

        Ok(Self {
            config,
            strategy,
            vehicles,
            household_kw,
            groups,
            grid,
            stats: RunStats::default(),
        })
    }

    /// Executes one simulation timestep and returns its aggregate record.
    ///
    /// # Errors
    ///
    /// Propagates a slot transition error; none occurs while each vehicle
    /// belongs to a single group.
    pub fn step(&mut self, t: usize) -> Result<StepResult, SimError> {
        let dt = self.config.horizon.dt_hours;
        let blackout = self.config.in_blackout(t);
        let allow_connect = !blackout;
        let final_step = self.config.horizon.final_step();

        // 1. Arrivals
        for v in &mut self.vehicles {
            if begin_step(v, t).is_some_and(|d| d.below_critical) {
                self.stats.critical_soc_events += 1;
            }
        }

        // 2. Queues and connections
        for g in &mut self.groups {
            g.update_queue(&self.vehicles, t);
            g.sort_queue(&self.vehicles, t, final_step);
            g.connect_waiting(t, allow_connect)?;
            for d in g.evaluate_disconnects(&self.vehicles, t, allow_connect)? {
                match d.reason {
                    DisconnectReason::Departure => self.stats.disconnects_departure += 1,
                    DisconnectReason::Full => self.stats.disconnects_full += 1,
                    DisconnectReason::DurationCap => self.stats.disconnects_duration_cap += 1,
                }
            }
            self.stats.max_queue_len = self.stats.max_queue_len.max(g.queue().len());
        }

        let mut connected = vec![false; self.vehicles.len()];
        let mut vehicles_queued = 0;
        for g in &self.groups {
            for v in g.connected() {
                connected[v] = true;
            }
            vehicles_queued += g.queue().len();
        }

        // 3. Allocation (kW), converted to energy per step once here
        let household_kw = self.household_kw[t];
        let headroom_kw = self.grid.headroom_kw(household_kw);
        let vehicles_home = self.vehicles.iter().filter(|v| v.state.at_home[t]).count();
        let share = share_kw(headroom_kw, self.strategy.divisor(), vehicles_home);
        let allocated_kwh = allocated_kw(share, self.config.cp_rated_kw) * dt;
        let charging_allowed = t > 0 && !blackout;

        // 4. SOC advance
        let mut ev_kw = 0.0_f32;
        for (v, vehicle) in self.vehicles.iter_mut().enumerate() {
            let allocation = (connected[v] && charging_allowed).then_some(allocated_kwh);
            finish_step(vehicle, t, allocation, dt);
            ev_kw += vehicle.state.charging_kw[t];
        }

        self.grid.reset();
        self.grid.add_load_kw(household_kw);
        self.grid.add_load_kw(ev_kw);
        if !self.grid.within_capacity(CAPACITY_TOLERANCE_KW) {
            warn!(
                t,
                load_kw = self.grid.load_kw(),
                max_kw = self.grid.max_kw(),
                grid = self.grid.name(),
                "grid capacity exceeded"
            );
        }

        Ok(StepResult {
            timestep: t,
            time_hr: self.config.horizon.time_hr(t),
            household_kw,
            ev_kw,
            total_kw: self.grid.load_kw(),
            headroom_kw,
            vehicles_home,
            vehicles_connected: connected.iter().filter(|&&c| c).count(),
            vehicles_queued,
            blackout,
        })
    }

    /// Executes all timesteps and hands back the completed records.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Engine::step`].
    pub fn run(mut self) -> Result<SimulationOutput, SimError> {
        info!(
            strategy = self.strategy.name(),
            vehicles = self.vehicles.len(),
            steps = self.config.horizon.total_steps(),
            "simulation started"
        );
        let mut steps = Vec::with_capacity(self.config.horizon.total_steps());
        for t in self.config.horizon.timesteps() {
            steps.push(self.step(t)?);
        }
        self.stats.connections = self
            .groups
            .iter()
            .flat_map(|g| g.slots())
            .map(|s| s.sessions())
            .sum();
        info!(
            strategy = self.strategy.name(),
            connections = self.stats.connections,
            max_queue_len = self.stats.max_queue_len,
            "simulation finished"
        );

        Ok(SimulationOutput {
            strategy: self.strategy.name().to_string(),
            horizon: self.config.horizon,
            grid_max_kw: self.config.grid_max_kw,
            steps,
            vehicles: self.vehicles,
            stats: self.stats,
        })
    }

    /// Vehicle records in their current state.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Charging groups in their current state.
    pub fn groups(&self) -> &[ChargingGroup] {
        &self.groups
    }

    /// Returns a reference to the driver settings.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
