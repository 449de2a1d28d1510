//! Non-EV building demand: a synthetic apartment profile or a CSV series.

use std::io::Read;
use std::path::Path;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use crate::error::SimError;
use crate::sim::horizon::Horizon;

/// Generator for the aggregate household demand of an apartment building.
///
/// Each apartment follows a daily sinusoid around `base_kw` with amplitude
/// `amp_kw`; the building adds Gaussian noise on top. Demand never goes
/// negative.
///
/// # Examples
///
/// ```
/// use ev_charge_sim::household::HouseholdLoad;
/// use ev_charge_sim::sim::horizon::Horizon;
///
/// let mut load = HouseholdLoad::new(
///     40,   // apartments
///     0.6,  // base_kw per apartment
///     0.4,  // amp_kw per apartment
///     1.2,  // phase_rad
///     0.0,  // noise_std (kW, building level)
///     7,    // seed
/// );
/// let series = load.series(&Horizon::new(60, 1));
/// assert_eq!(series.len(), 24);
/// assert!(series.iter().all(|&kw| kw >= 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct HouseholdLoad {
    /// Number of apartments in the building.
    pub apartments: usize,

    /// Mean demand of one apartment (kW).
    pub base_kw: f32,

    /// Daily swing of one apartment (kW).
    pub amp_kw: f32,

    /// Phase offset of the daily sinusoid (radians).
    pub phase_rad: f32,

    /// Standard deviation of building-level noise (kW).
    pub noise_std: f32,

    rng: StdRng,
}

impl HouseholdLoad {
    /// Creates a household demand generator.
    ///
    /// # Arguments
    ///
    /// * `apartments` - Number of apartments sharing the grid connection
    /// * `base_kw` - Mean demand per apartment in kW
    /// * `amp_kw` - Sinusoid amplitude per apartment in kW
    /// * `phase_rad` - Phase offset in radians (0 = mean at midnight)
    /// * `noise_std` - Standard deviation of building-level noise in kW
    /// * `seed` - Random seed for reproducible noise
    pub fn new(
        apartments: usize,
        base_kw: f32,
        amp_kw: f32,
        phase_rad: f32,
        noise_std: f32,
        seed: u64,
    ) -> Self {
        Self {
            apartments,
            base_kw,
            amp_kw,
            phase_rad,
            noise_std,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Building demand at step `t` in kW.
    pub fn demand_kw(&mut self, horizon: &Horizon, t: usize) -> f32 {
        let day_pos = horizon.step_of_day(t) as f32 / horizon.steps_per_day as f32; // [0,1)
        let angle = 2.0 * std::f32::consts::PI * day_pos + self.phase_rad;
        let per_apartment = self.base_kw + self.amp_kw * angle.sin();
        let noise = gaussian_noise(&mut self.rng, self.noise_std);

        (per_apartment * self.apartments as f32 + noise).max(0.0)
    }

    /// Demand over the whole horizon, one value per step.
    pub fn series(&mut self, horizon: &Horizon) -> Vec<f32> {
        horizon.timesteps().map(|t| self.demand_kw(horizon, t)).collect()
    }
}

/// Zero-mean Gaussian sample via the Box-Muller transform.
pub(crate) fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}

#[derive(Debug, Deserialize)]
struct HouseholdRow {
    household_kw: f32,
}

/// Reads a household series from CSV with a `household_kw` column.
///
/// # Errors
///
/// Returns `SimError::Csv` on malformed input, `SimError::HouseholdValue`
/// for a negative or non-finite value, and `SimError::HouseholdSeries` if
/// the row count differs from the horizon.
pub fn read_series_csv(reader: impl Read, horizon: &Horizon) -> Result<Vec<f32>, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut series = Vec::with_capacity(horizon.total_steps());
    for row in rdr.deserialize::<HouseholdRow>() {
        let household_kw = row?.household_kw;
        if !household_kw.is_finite() || household_kw < 0.0 {
            return Err(SimError::HouseholdValue {
                timestep: series.len(),
                household_kw,
            });
        }
        series.push(household_kw);
    }
    if series.len() != horizon.total_steps() {
        return Err(SimError::HouseholdSeries {
            expected: horizon.total_steps(),
            got: series.len(),
        });
    }
    Ok(series)
}

/// Reads a household series from a CSV file.
///
/// # Errors
///
/// Same as [`read_series_csv`], plus `SimError::Io` if the file cannot be opened.
pub fn read_series_file(path: &Path, horizon: &Horizon) -> Result<Vec<f32>, SimError> {
    let file = std::fs::File::open(path)?;
    read_series_csv(std::io::BufReader::new(file), horizon)
}
