//! Power allocation: grid headroom split across charging connections.

/// How headroom is divided at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareDivisor {
    /// Split among every vehicle currently at home (dedicated points).
    VehiclesAtHome,
    /// Split among a fixed number of installed charging points.
    InstalledPoints(usize),
}

/// Grid capacity remaining after household demand (kW).
///
/// May be negative; the driver rejects such series before the run starts.
pub fn headroom_kw(grid_max_kw: f32, household_kw: f32) -> f32 {
    grid_max_kw - household_kw
}

/// Power available to each active connection (kW), before the rated cap.
///
/// # Arguments
///
/// * `headroom_kw` - Remaining grid capacity at this step
/// * `divisor` - Sharing rule of the charging configuration
/// * `vehicles_at_home` - Number of vehicles parked at home at this step
pub fn share_kw(headroom_kw: f32, divisor: ShareDivisor, vehicles_at_home: usize) -> f32 {
    let n = match divisor {
        ShareDivisor::VehiclesAtHome => vehicles_at_home.max(1),
        ShareDivisor::InstalledPoints(n) => n.max(1),
    };
    (headroom_kw / n as f32).max(0.0)
}

/// Power granted to one actively charging vehicle (kW): the share,
/// clipped to the rated power of a charging point.
pub fn allocated_kw(share_kw: f32, rated_kw: f32) -> f32 {
    share_kw.min(rated_kw).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_subtracts_household() {
        assert_eq!(headroom_kw(500.0, 320.0), 180.0);
        assert_eq!(headroom_kw(500.0, 600.0), -100.0);
    }

    #[test]
    fn dedicated_share_divides_by_vehicles_home() {
        let s = share_kw(100.0, ShareDivisor::VehiclesAtHome, 4);
        assert_eq!(s, 25.0);
    }

    #[test]
    fn dedicated_share_with_nobody_home() {
        let s = share_kw(100.0, ShareDivisor::VehiclesAtHome, 0);
        assert_eq!(s, 100.0);
    }

    #[test]
    fn pooled_share_ignores_occupancy() {
        let s = share_kw(30.0, ShareDivisor::InstalledPoints(5), 40);
        assert_eq!(s, 6.0);
    }

    #[test]
    fn allocation_clips_to_rated_power() {
        assert_eq!(allocated_kw(25.0, 7.2), 7.2);
        assert_eq!(allocated_kw(6.0, 7.2), 6.0);
        assert_eq!(allocated_kw(-1.0, 7.2), 0.0);
    }
}
