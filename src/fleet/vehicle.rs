use serde::Serialize;

use crate::error::ScheduleError;

/// Index of a vehicle within the fleet.
pub type VehicleId = usize;

/// Static attributes and travel schedule of one EV.
///
/// Fully validated at construction and never mutated afterwards. Timestamps
/// are step indices on the simulation horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleProfile {
    pub id: VehicleId,
    /// Usable battery capacity (kWh).
    pub capacity_kwh: f32,
    /// Minimum allowed SOC (kWh).
    pub soc_critical_kwh: f32,
    /// Charging target and upper SOC bound (kWh).
    pub soc_max_kwh: f32,
    /// SOC at the first timestep (kWh).
    pub soc_init_kwh: f32,
    /// Departure steps, strictly increasing.
    pub t_dep: Vec<usize>,
    /// Arrival steps, `t_dep[k] < t_arr[k] < t_dep[k + 1]`.
    pub t_arr: Vec<usize>,
    /// Energy consumed by trip `k`, deducted at `t_arr[k]` (kWh).
    pub travel_energy_kwh: Vec<f32>,
}

impl VehicleProfile {
    /// Builds a profile after checking bounds and schedule consistency.
    ///
    /// # Errors
    ///
    /// Returns a `ScheduleError` if the three schedule lists differ in
    /// length, are not strictly interleaved, leave the horizon, carry
    /// negative trip energy, or the SOC bounds are inconsistent.
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        id: VehicleId,
        capacity_kwh: f32,
        soc_critical_kwh: f32,
        soc_max_kwh: f32,
        soc_init_kwh: f32,
        t_dep: Vec<usize>,
        t_arr: Vec<usize>,
        travel_energy_kwh: Vec<f32>,
        total_steps: usize,
    ) -> Result<Self, ScheduleError> {
        if t_dep.len() != t_arr.len() || t_arr.len() != travel_energy_kwh.len() {
            return Err(ScheduleError::LengthMismatch {
                departures: t_dep.len(),
                arrivals: t_arr.len(),
                energies: travel_energy_kwh.len(),
            });
        }
        if ![capacity_kwh, soc_critical_kwh, soc_max_kwh, soc_init_kwh]
            .iter()
            .all(|kwh| kwh.is_finite())
        {
            return Err(ScheduleError::Bounds("battery values must be finite".into()));
        }
        if capacity_kwh <= 0.0 {
            return Err(ScheduleError::Bounds("capacity must be > 0".into()));
        }
        if soc_critical_kwh < 0.0 || soc_critical_kwh > soc_max_kwh {
            return Err(ScheduleError::Bounds(
                "soc_critical must lie in [0, soc_max]".into(),
            ));
        }
        if soc_max_kwh > capacity_kwh {
            return Err(ScheduleError::Bounds("soc_max must be <= capacity".into()));
        }
        if soc_init_kwh < 0.0 || soc_init_kwh > soc_max_kwh {
            return Err(ScheduleError::Bounds(
                "soc_init must lie in [0, soc_max]".into(),
            ));
        }

        let mut last: Option<usize> = None;
        for (trip, (&dep, &arr)) in t_dep.iter().zip(&t_arr).enumerate() {
            if last.is_some_and(|prev| dep <= prev) || arr <= dep {
                return Err(ScheduleError::NotInterleaved { trip });
            }
            last = Some(arr);
        }
        if let Some(&timestep) = t_dep.iter().chain(&t_arr).find(|&&t| t >= total_steps) {
            return Err(ScheduleError::OutsideHorizon {
                timestep,
                total_steps,
            });
        }
        if let Some((trip, &energy_kwh)) = travel_energy_kwh
            .iter()
            .enumerate()
            .find(|(_, e)| !e.is_finite() || **e < 0.0)
        {
            return Err(ScheduleError::NegativeEnergy { trip, energy_kwh });
        }

        Ok(Self {
            id,
            capacity_kwh,
            soc_critical_kwh,
            soc_max_kwh,
            soc_init_kwh,
            t_dep,
            t_arr,
            travel_energy_kwh,
        })
    }

    /// Returns `true` when the vehicle is parked at home during step `t`.
    ///
    /// The vehicle is away over `[t_dep[k], t_arr[k])`.
    pub fn is_home(&self, t: usize) -> bool {
        // Number of departures at or before t.
        let departed = self.t_dep.partition_point(|&d| d <= t);
        if departed == 0 {
            return true;
        }
        self.t_arr[departed - 1] <= t
    }

    /// Returns `true` when `t` is one of the departure steps.
    pub fn departs_at(&self, t: usize) -> bool {
        self.t_dep.binary_search(&t).is_ok()
    }

    /// Trip index whose arrival falls on `t`, if any.
    pub fn arrival_index(&self, t: usize) -> Option<usize> {
        self.t_arr.binary_search(&t).ok()
    }

    /// Smallest departure strictly after `t`, or `final_step` if none remains.
    pub fn next_departure(&self, t: usize, final_step: usize) -> usize {
        let idx = self.t_dep.partition_point(|&d| d <= t);
        self.t_dep.get(idx).copied().unwrap_or(final_step)
    }
}

/// Mutable per-step series of one vehicle, written by the SOC engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleState {
    /// Presence flag per step.
    pub at_home: Vec<bool>,
    /// Delivered charging power per step (kW, >= 0).
    pub charging_kw: Vec<f32>,
    /// SOC at the end of each step (kWh).
    pub soc_kwh: Vec<f32>,
    /// SOC carried into the step being processed.
    #[serde(skip)]
    pub(crate) working_soc_kwh: f32,
}

impl VehicleState {
    fn new(profile: &VehicleProfile, total_steps: usize) -> Self {
        Self {
            at_home: (0..total_steps).map(|t| profile.is_home(t)).collect(),
            charging_kw: vec![0.0; total_steps],
            soc_kwh: vec![0.0; total_steps],
            working_soc_kwh: profile.soc_init_kwh,
        }
    }
}

/// Vehicle record: immutable profile plus runtime series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub profile: VehicleProfile,
    pub state: VehicleState,
}

impl Vehicle {
    /// Wraps a validated profile with zeroed series sized to the horizon.
    pub fn new(profile: VehicleProfile, total_steps: usize) -> Self {
        let state = VehicleState::new(&profile, total_steps);
        Self { profile, state }
    }

    pub fn id(&self) -> VehicleId {
        self.profile.id
    }

    /// SOC the vehicle holds within the current step, before charging.
    pub fn current_soc_kwh(&self) -> f32 {
        self.state.working_soc_kwh
    }

    /// Current SOC as a fraction of SOC-max.
    pub fn soc_fraction(&self) -> f32 {
        if self.profile.soc_max_kwh > 0.0 {
            self.state.working_soc_kwh / self.profile.soc_max_kwh
        } else {
            1.0
        }
    }

    /// Returns `true` once the working SOC has reached SOC-max.
    pub fn is_full(&self) -> bool {
        self.state.working_soc_kwh >= self.profile.soc_max_kwh
    }

    /// A vehicle wants a charging point when it is home, will not leave
    /// at `t`, and is below SOC-max. The arrival step itself only books the
    /// trip energy; the vehicle queues from the following step.
    pub fn needs_charge(&self, t: usize) -> bool {
        self.state.at_home[t]
            && !self.profile.departs_at(t)
            && self.profile.arrival_index(t).is_none()
            && !self.is_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commuter() -> VehicleProfile {
        VehicleProfile::new(
            0,
            50.0,
            5.0,
            40.0,
            30.0,
            vec![8, 32],
            vec![18, 40],
            vec![10.0, 4.0],
            48,
        )
        .unwrap()
    }

    #[test]
    fn presence_follows_schedule() {
        let p = commuter();
        assert!(p.is_home(0));
        assert!(p.is_home(7));
        assert!(!p.is_home(8));
        assert!(!p.is_home(17));
        assert!(p.is_home(18));
        assert!(p.is_home(31));
        assert!(!p.is_home(32));
        assert!(p.is_home(40));
        assert!(p.is_home(47));
    }

    #[test]
    fn next_departure_is_strictly_after() {
        let p = commuter();
        assert_eq!(p.next_departure(0, 47), 8);
        assert_eq!(p.next_departure(8, 47), 32);
        assert_eq!(p.next_departure(32, 47), 47);
    }

    #[test]
    fn arrival_lookup() {
        let p = commuter();
        assert_eq!(p.arrival_index(18), Some(0));
        assert_eq!(p.arrival_index(40), Some(1));
        assert_eq!(p.arrival_index(19), None);
        assert!(p.departs_at(32));
        assert!(!p.departs_at(33));
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = VehicleProfile::new(0, 50.0, 5.0, 40.0, 30.0, vec![8], vec![18, 20], vec![1.0], 48);
        assert!(matches!(err, Err(ScheduleError::LengthMismatch { .. })));
    }

    #[test]
    fn overlapping_trips_rejected() {
        let err = VehicleProfile::new(
            0,
            50.0,
            5.0,
            40.0,
            30.0,
            vec![8, 15],
            vec![18, 20],
            vec![1.0, 1.0],
            48,
        );
        assert_eq!(err, Err(ScheduleError::NotInterleaved { trip: 1 }));
    }

    #[test]
    fn arrival_before_departure_rejected() {
        let err = VehicleProfile::new(0, 50.0, 5.0, 40.0, 30.0, vec![8], vec![8], vec![1.0], 48);
        assert_eq!(err, Err(ScheduleError::NotInterleaved { trip: 0 }));
    }

    #[test]
    fn schedule_outside_horizon_rejected() {
        let err = VehicleProfile::new(0, 50.0, 5.0, 40.0, 30.0, vec![8], vec![60], vec![1.0], 48);
        assert!(matches!(err, Err(ScheduleError::OutsideHorizon { timestep: 60, .. })));
    }

    #[test]
    fn negative_energy_rejected() {
        let err = VehicleProfile::new(0, 50.0, 5.0, 40.0, 30.0, vec![8], vec![18], vec![-1.0], 48);
        assert!(matches!(err, Err(ScheduleError::NegativeEnergy { trip: 0, .. })));
    }

    #[test]
    fn soc_bounds_checked() {
        let err = VehicleProfile::new(0, 50.0, 5.0, 60.0, 30.0, vec![], vec![], vec![], 48);
        assert!(matches!(err, Err(ScheduleError::Bounds(_))));
        let err = VehicleProfile::new(0, 50.0, 5.0, 40.0, 45.0, vec![], vec![], vec![], 48);
        assert!(matches!(err, Err(ScheduleError::Bounds(_))));
    }

    #[test]
    fn non_finite_values_rejected() {
        let err = VehicleProfile::new(0, 50.0, f32::NAN, 40.0, 30.0, vec![], vec![], vec![], 48);
        assert!(matches!(err, Err(ScheduleError::Bounds(_))));
        let err = VehicleProfile::new(0, f32::INFINITY, 5.0, 40.0, 30.0, vec![], vec![], vec![], 48);
        assert!(matches!(err, Err(ScheduleError::Bounds(_))));
        let err =
            VehicleProfile::new(0, 50.0, 5.0, 40.0, 30.0, vec![8], vec![18], vec![f32::NAN], 48);
        assert!(matches!(err, Err(ScheduleError::NegativeEnergy { trip: 0, .. })));
    }

    #[test]
    fn vehicle_series_sized_to_horizon() {
        let v = Vehicle::new(commuter(), 48);
        assert_eq!(v.state.soc_kwh.len(), 48);
        assert_eq!(v.state.charging_kw.len(), 48);
        assert!(!v.state.at_home[10]);
        assert_eq!(v.current_soc_kwh(), 30.0);
        assert!((v.soc_fraction() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn needs_charge_excludes_departure_step() {
        let v = Vehicle::new(commuter(), 48);
        assert!(v.needs_charge(0));
        assert!(!v.needs_charge(8));
        assert!(!v.needs_charge(10));
    }

    #[test]
    fn needs_charge_starts_after_arrival_step() {
        let v = Vehicle::new(commuter(), 48);
        assert!(!v.needs_charge(18));
        assert!(v.needs_charge(19));
    }
}
