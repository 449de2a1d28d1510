//! Post-hoc KPI computation from a completed run.

use std::fmt;

use serde::Serialize;

use super::types::SimulationOutput;

/// SOC tolerance when deciding whether a vehicle left full (kWh).
const FULL_TOLERANCE_KWH: f32 = 1e-3;

/// Aggregate key performance indicators derived from a complete simulation run.
///
/// Computed post-hoc from [`SimulationOutput`] so the reported metrics
/// always agree with the step and vehicle records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiReport {
    /// Peak household plus EV load (kW).
    pub peak_total_kw: f32,
    /// Peak EV load (kW).
    pub peak_ev_kw: f32,
    /// Energy delivered to vehicles over the horizon (kWh).
    pub ev_energy_kwh: f32,
    /// Total number of departures.
    pub departures: usize,
    /// Departures with SOC below SOC-max.
    pub departures_not_full: usize,
    /// Mean SOC fraction at departure (0.0-1.0).
    pub mean_departure_soc: f32,
    /// Lowest SOC fraction any vehicle reached.
    pub min_soc: f32,
    /// Arrivals that left a vehicle below SOC-critical.
    pub critical_soc_events: usize,
    /// Longest admission queue observed.
    pub max_queue_len: usize,
}

impl KpiReport {
    /// Computes all KPIs from a completed run.
    ///
    /// A vehicle's departure SOC is its SOC at the end of the step before
    /// it leaves (its initial SOC if it leaves at step 0).
    pub fn from_output(output: &SimulationOutput) -> Self {
        let dt = output.horizon.dt_hours;

        let mut peak_total = 0.0_f32;
        let mut peak_ev = 0.0_f32;
        let mut ev_energy = 0.0_f32;
        for s in &output.steps {
            peak_total = peak_total.max(s.total_kw);
            peak_ev = peak_ev.max(s.ev_kw);
            ev_energy += s.ev_kw * dt;
        }

        let mut departures = 0_usize;
        let mut not_full = 0_usize;
        let mut departure_soc_sum = 0.0_f32;
        let mut min_soc = if output.vehicles.is_empty() { 0.0 } else { 1.0_f32 };

        for v in &output.vehicles {
            let p = &v.profile;
            if p.capacity_kwh <= 0.0 {
                continue;
            }
            for &t_dep in &p.t_dep {
                let soc = if t_dep == 0 {
                    p.soc_init_kwh
                } else {
                    v.state.soc_kwh[t_dep - 1]
                };
                departures += 1;
                departure_soc_sum += soc / p.capacity_kwh;
                if soc < p.soc_max_kwh - FULL_TOLERANCE_KWH {
                    not_full += 1;
                }
            }
            let lowest = v
                .state
                .soc_kwh
                .iter()
                .copied()
                .fold(p.soc_init_kwh, f32::min);
            min_soc = min_soc.min(lowest / p.capacity_kwh);
        }

        let mean_departure_soc = if departures > 0 {
            departure_soc_sum / departures as f32
        } else {
            0.0
        };

        Self {
            peak_total_kw: peak_total,
            peak_ev_kw: peak_ev,
            ev_energy_kwh: ev_energy,
            departures,
            departures_not_full: not_full,
            mean_departure_soc,
            min_soc,
            critical_soc_events: output.stats.critical_soc_events,
            max_queue_len: output.stats.max_queue_len,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Peak total load:       {:.2} kW", self.peak_total_kw)?;
        writeln!(f, "Peak EV load:          {:.2} kW", self.peak_ev_kw)?;
        writeln!(f, "EV energy delivered:   {:.2} kWh", self.ev_energy_kwh)?;
        writeln!(
            f,
            "Departures not full:   {} of {}",
            self.departures_not_full, self.departures
        )?;
        writeln!(
            f,
            "Mean departure SOC:    {:.1}%",
            self.mean_departure_soc * 100.0
        )?;
        writeln!(f, "Minimum SOC:           {:.1}%", self.min_soc * 100.0)?;
        writeln!(f, "Critical SOC events:   {}", self.critical_soc_events)?;
        write!(f, "Max queue length:      {}", self.max_queue_len)
    }
}
