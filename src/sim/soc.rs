//! State-of-charge evolution: trip deductions at arrival, charging with
//! clip-back at SOC-max.

use tracing::warn;

use crate::fleet::Vehicle;

/// Trip energy removed from a vehicle at its arrival step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalDeduction {
    /// Trip index within the vehicle schedule.
    pub trip: usize,
    /// Energy actually removed (kWh); less than the trip cost only when
    /// the battery would otherwise go negative.
    pub energy_kwh: f32,
    /// SOC after the deduction fell below SOC-critical.
    pub below_critical: bool,
}

/// Opens step `t` for `vehicle`: deducts the trip energy if `t` is an
/// arrival step. SOC never goes below zero.
pub fn begin_step(vehicle: &mut Vehicle, t: usize) -> Option<ArrivalDeduction> {
    let trip = vehicle.profile.arrival_index(t)?;
    let cost = vehicle.profile.travel_energy_kwh[trip];
    let before = vehicle.state.working_soc_kwh;
    let after = (before - cost).max(0.0);
    vehicle.state.working_soc_kwh = after;

    let below_critical = after < vehicle.profile.soc_critical_kwh;
    if below_critical {
        warn!(
            vehicle = vehicle.id(),
            t,
            soc_kwh = after,
            soc_critical_kwh = vehicle.profile.soc_critical_kwh,
            "arrived below critical SOC"
        );
    }

    Some(ArrivalDeduction {
        trip,
        energy_kwh: before - after,
        below_critical,
    })
}

/// Closes step `t`: applies `allocated_kwh` if the vehicle is charging and
/// records SOC and charging power.
///
/// Energy that would push SOC past SOC-max is not drawn. Returns the
/// energy actually delivered (kWh).
///
/// # Arguments
///
/// * `vehicle` - Vehicle to advance
/// * `t` - Current step
/// * `allocated_kwh` - Energy granted this step, `None` when not charging
/// * `dt_hours` - Step length, used to record power in kW
pub fn finish_step(vehicle: &mut Vehicle, t: usize, allocated_kwh: Option<f32>, dt_hours: f32) -> f32 {
    let prev = vehicle.state.working_soc_kwh;
    let soc_max = vehicle.profile.soc_max_kwh;

    let (soc, delivered) = match allocated_kwh {
        None => (prev, 0.0),
        Some(alloc) => {
            let alloc = alloc.max(0.0);
            let potential = prev + alloc;
            if potential > soc_max {
                (soc_max, (soc_max - prev).max(0.0))
            } else {
                (potential, alloc)
            }
        }
    };

    vehicle.state.working_soc_kwh = soc;
    vehicle.state.soc_kwh[t] = soc;
    vehicle.state.charging_kw[t] = if dt_hours > 0.0 { delivered / dt_hours } else { 0.0 };
    delivered
}
