use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::{ScheduleError, SimError};
use crate::household::gaussian_noise;
use crate::sim::horizon::Horizon;

use super::vehicle::{VehicleId, VehicleProfile};

/// Daily commuting pattern used to synthesise travel schedules.
#[derive(Debug, Clone)]
pub struct TravelParams {
    /// Probability that a vehicle makes its trip on a given day (0.0-1.0).
    pub trip_probability: f32,
    /// Mean departure hour of day.
    pub departure_hour_mean: f32,
    /// Standard deviation of the departure hour.
    pub departure_hour_std: f32,
    /// Mean time away from home (hours).
    pub away_hours_mean: f32,
    /// Standard deviation of the time away (hours).
    pub away_hours_std: f32,
    /// Minimum energy used by one trip (kWh).
    pub trip_kwh_min: f32,
    /// Maximum energy used by one trip (kWh).
    pub trip_kwh_max: f32,
}

/// Battery attributes shared by the generated fleet.
#[derive(Debug, Clone)]
pub struct BatteryParams {
    /// Usable capacity (kWh).
    pub capacity_kwh: f32,
    /// SOC-critical as a fraction of capacity.
    pub soc_critical_frac: f32,
    /// SOC-max as a fraction of capacity.
    pub soc_max_frac: f32,
    /// Initial SOC as a fraction of capacity.
    pub soc_init_frac: f32,
}

/// Seeded generator of per-vehicle travel schedules.
///
/// For each vehicle and day it samples at most one round trip: a departure
/// hour and a time away (Gaussian around the configured means), and a trip
/// energy drawn uniformly from the configured range. Trips that would
/// overlap the previous one or run past the horizon are dropped.
#[derive(Debug, Clone)]
pub struct TravelGenerator {
    pub travel: TravelParams,
    pub battery: BatteryParams,
    rng: StdRng,
}

impl TravelGenerator {
    /// Creates a generator.
    ///
    /// # Arguments
    ///
    /// * `travel` - Commuting pattern
    /// * `battery` - Battery attributes applied to every vehicle
    /// * `seed` - Random seed for reproducible schedules
    pub fn new(travel: TravelParams, battery: BatteryParams, seed: u64) -> Self {
        Self {
            travel,
            battery,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Samples the schedule of one vehicle over `horizon`.
    ///
    /// # Errors
    ///
    /// Returns a `ScheduleError` if the battery fractions are inconsistent.
    pub fn profile(&mut self, id: VehicleId, horizon: &Horizon) -> Result<VehicleProfile, ScheduleError> {
        let b = &self.battery;
        let capacity = b.capacity_kwh;
        let soc_critical = capacity * b.soc_critical_frac;
        let soc_max = capacity * b.soc_max_frac;
        let soc_init = capacity * b.soc_init_frac;
        let max_trip_kwh = (soc_max - soc_critical).max(0.0);

        let total = horizon.total_steps();
        let mut t_dep = Vec::new();
        let mut t_arr = Vec::new();
        let mut energy = Vec::new();

        for day in 0..horizon.days {
            if self.rng.random::<f32>() >= self.travel.trip_probability {
                continue;
            }
            let dep_hour = (self.travel.departure_hour_mean
                + gaussian_noise(&mut self.rng, self.travel.departure_hour_std))
            .clamp(0.0, 24.0 - horizon.dt_hours);
            let away_hours = (self.travel.away_hours_mean
                + gaussian_noise(&mut self.rng, self.travel.away_hours_std))
            .max(horizon.dt_hours);
            let trip_kwh = self
                .rng
                .random_range(self.travel.trip_kwh_min..=self.travel.trip_kwh_max)
                .min(max_trip_kwh);

            let mut dep = horizon.step_at(day, dep_hour);
            if let Some(&prev_arr) = t_arr.last() {
                dep = dep.max(prev_arr + 1);
            }
            let arr = dep + horizon.steps_for_hours(away_hours).max(1);
            if dep == 0 || arr >= total {
                continue;
            }

            t_dep.push(dep);
            t_arr.push(arr);
            energy.push(trip_kwh);
        }

        VehicleProfile::new(
            id,
            capacity,
            soc_critical,
            soc_max,
            soc_init,
            t_dep,
            t_arr,
            energy,
            total,
        )
    }

    /// Samples `size` vehicles with ids `0..size`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Schedule` naming the first vehicle that fails validation.
    pub fn fleet(&mut self, size: usize, horizon: &Horizon) -> Result<Vec<VehicleProfile>, SimError> {
        (0..size)
            .map(|id| {
                self.profile(id, horizon)
                    .map_err(|source| SimError::Schedule { vehicle: id, source })
            })
            .collect()
    }
}
