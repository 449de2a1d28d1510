//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use ev_charge_sim::fleet::VehicleProfile;
use ev_charge_sim::sim::allocation::ShareDivisor;
use ev_charge_sim::sim::assignment::AssignmentTable;
use ev_charge_sim::sim::engine::Engine;
use ev_charge_sim::sim::horizon::Horizon;
use ev_charge_sim::sim::strategy::{DedicatedShare, SharedPool, StaticAssignment, Strategy};
use ev_charge_sim::sim::types::{SimConfig, SimulationOutput};

/// CP rated power used across fixtures (kW).
pub const RATED_KW: f32 = 7.2;

/// Two days at 15-minute resolution.
pub fn default_horizon() -> Horizon {
    Horizon::new(15, 2)
}

/// Driver settings with a 100 kW connection.
pub fn default_config(horizon: &Horizon) -> SimConfig {
    SimConfig::new(horizon.clone(), 100.0, RATED_KW)
}

/// Household series with an evening peak, 20-60 kW.
pub fn evening_household(horizon: &Horizon) -> Vec<f32> {
    horizon
        .timesteps()
        .map(|t| {
            let h = horizon.hour_of_day(t);
            if (17.0..22.0).contains(&h) { 60.0 } else { 20.0 }
        })
        .collect()
}

/// Constant household series.
pub fn flat_household(horizon: &Horizon, kw: f32) -> Vec<f32> {
    vec![kw; horizon.total_steps()]
}

/// Commuter leaving at `dep_hour` and returning `away_hours` later each day.
///
/// Starts at 40 kWh with SOC-critical 6 kWh; callers keep two trips under
/// 34 kWh so SOC never falls below SOC-critical.
pub fn commuter(
    id: usize,
    horizon: &Horizon,
    dep_hour: f32,
    away_hours: f32,
    trip_kwh: f32,
) -> VehicleProfile {
    let mut t_dep = Vec::new();
    let mut t_arr = Vec::new();
    let mut energy = Vec::new();
    for day in 0..horizon.days {
        let dep = horizon.step_at(day, dep_hour);
        let arr = dep + horizon.steps_for_hours(away_hours);
        if dep == 0 || arr >= horizon.total_steps() {
            continue;
        }
        t_dep.push(dep);
        t_arr.push(arr);
        energy.push(trip_kwh);
    }
    VehicleProfile::new(
        id,
        60.0,
        6.0,
        54.0,
        40.0,
        t_dep,
        t_arr,
        energy,
        horizon.total_steps(),
    )
    .expect("fixture profile should be valid")
}

/// Fleet of `n` commuters with staggered departures and trip sizes.
pub fn mixed_fleet(horizon: &Horizon, n: usize) -> Vec<VehicleProfile> {
    (0..n)
        .map(|id| {
            let dep_hour = 6.5 + (id % 5) as f32 * 0.5;
            let away = 8.0 + (id % 3) as f32;
            let trip = 4.0 + (id % 4) as f32 * 3.0;
            commuter(id, horizon, dep_hour, away, trip)
        })
        .collect()
}

/// One strategy per configuration for a fleet of `fleet_size` vehicles.
pub fn all_strategies(fleet_size: usize) -> Vec<Strategy> {
    vec![
        Strategy::Dedicated(DedicatedShare),
        Strategy::Shared(SharedPool {
            num_cp: 3,
            max_duration_steps: Some(12),
        }),
        Strategy::Assigned(StaticAssignment {
            table: AssignmentTable::round_robin(3, fleet_size).expect("valid round robin"),
            max_duration_steps: Some(12),
        }),
    ]
}

/// Runs `strategy` over the default fixtures.
pub fn run_default(strategy: Strategy, fleet_size: usize) -> SimulationOutput {
    let horizon = default_horizon();
    Engine::new(
        default_config(&horizon),
        strategy,
        mixed_fleet(&horizon, fleet_size),
        evening_household(&horizon),
    )
    .expect("engine should build")
    .run()
    .expect("run should succeed")
}

/// Upper bound of simultaneous connections implied by a divisor.
pub fn divisor_points(divisor: ShareDivisor, vehicles_home: usize) -> usize {
    match divisor {
        ShareDivisor::VehiclesAtHome => vehicles_home,
        ShareDivisor::InstalledPoints(n) => n,
    }
}
