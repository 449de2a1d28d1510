use crate::error::SimError;

use super::allocation::headroom_kw;

/// Building grid connection that aggregates household and EV load against
/// a fixed capacity.
///
/// Load convention: all values are positive consumption in kW.
#[derive(Debug, Clone)]
pub struct GridConnection {
    name: &'static str,
    max_kw: f32,
    load_kw: f32,
}

impl GridConnection {
    /// Creates a grid connection with capacity `max_kw`.
    ///
    /// # Panics
    ///
    /// Panics if `max_kw` is negative.
    pub fn with_capacity(name: &'static str, max_kw: f32) -> Self {
        assert!(max_kw >= 0.0);
        Self {
            name,
            max_kw,
            load_kw: 0.0,
        }
    }

    /// Checks the whole household series against capacity before any
    /// simulation state is touched.
    ///
    /// # Errors
    ///
    /// Returns `SimError::HouseholdValue` at the first negative or
    /// non-finite value, and `SimError::CapacityExceeded` at the first step
    /// where household demand alone exceeds capacity.
    pub fn validate_household(&self, household_kw: &[f32]) -> Result<(), SimError> {
        if let Some(timestep) = household_kw
            .iter()
            .position(|&kw| !kw.is_finite() || kw < 0.0)
        {
            return Err(SimError::HouseholdValue {
                timestep,
                household_kw: household_kw[timestep],
            });
        }
        match household_kw.iter().position(|&kw| kw > self.max_kw) {
            Some(timestep) => Err(SimError::CapacityExceeded {
                timestep,
                household_kw: household_kw[timestep],
                grid_max_kw: self.max_kw,
            }),
            None => Ok(()),
        }
    }

    /// Capacity left for EV charging given `household_kw`.
    pub fn headroom_kw(&self, household_kw: f32) -> f32 {
        headroom_kw(self.max_kw, household_kw)
    }

    /// Resets accumulated load to zero.
    pub fn reset(&mut self) {
        self.load_kw = 0.0;
    }

    /// Adds a load contribution.
    pub fn add_load_kw(&mut self, kw: f32) {
        self.load_kw += kw;
    }

    /// Returns the accumulated load in kW.
    pub fn load_kw(&self) -> f32 {
        self.load_kw
    }

    pub fn max_kw(&self) -> f32 {
        self.max_kw
    }

    /// Returns `true` when accumulated load is within capacity, allowing
    /// `tolerance_kw` of rounding slack.
    pub fn within_capacity(&self, tolerance_kw: f32) -> bool {
        self.load_kw <= self.max_kw + tolerance_kw
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_and_reset() {
        let mut grid = GridConnection::with_capacity("Building", 100.0);
        grid.add_load_kw(60.0);
        grid.add_load_kw(14.4);
        assert!((grid.load_kw() - 74.4).abs() < 1e-4);
        assert!(grid.within_capacity(0.0));
        grid.add_load_kw(30.0);
        assert!(!grid.within_capacity(1e-3));
        grid.reset();
        assert_eq!(grid.load_kw(), 0.0);
        assert_eq!(grid.name(), "Building");
    }

    #[test]
    fn household_series_within_capacity() {
        let grid = GridConnection::with_capacity("Building", 500.0);
        assert!(grid.validate_household(&[100.0, 500.0, 0.0]).is_ok());
    }

    #[test]
    fn household_overload_reports_first_step() {
        let grid = GridConnection::with_capacity("Building", 500.0);
        let err = grid.validate_household(&[100.0, 600.0, 700.0]);
        assert!(matches!(
            err,
            Err(SimError::CapacityExceeded { timestep: 1, .. })
        ));
    }

    #[test]
    fn non_finite_or_negative_household_rejected() {
        let grid = GridConnection::with_capacity("Building", 500.0);
        let err = grid.validate_household(&[100.0, f32::NAN, 700.0]);
        assert!(matches!(err, Err(SimError::HouseholdValue { timestep: 1, .. })));
        let err = grid.validate_household(&[100.0, 90.0, -1.0]);
        assert!(matches!(err, Err(SimError::HouseholdValue { timestep: 2, .. })));
        let err = grid.validate_household(&[f32::INFINITY]);
        assert!(matches!(err, Err(SimError::HouseholdValue { timestep: 0, .. })));
    }

    #[test]
    fn headroom_is_capacity_minus_household() {
        let grid = GridConnection::with_capacity("Building", 500.0);
        assert_eq!(grid.headroom_kw(420.0), 80.0);
    }
}
