//! Static vehicle to charging-point partition used by the assigned configuration.

use crate::error::AssignmentError;
use crate::fleet::VehicleId;

use super::slot::CpId;

/// Bidirectional vehicle/charging-point map.
///
/// Every fleet vehicle maps to exactly one installed charging point; a
/// charging point may serve any number of vehicles, including none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentTable {
    cp_of: Vec<CpId>,
    vehicles_of: Vec<Vec<VehicleId>>,
}

impl AssignmentTable {
    /// Builds the table from explicit `(cp, vehicles)` groups.
    ///
    /// # Errors
    ///
    /// Returns an `AssignmentError` if a charging point is unknown or
    /// listed twice, a vehicle is unknown or assigned twice, or a fleet
    /// vehicle is left unassigned.
    pub fn from_groups(
        groups: &[(CpId, Vec<VehicleId>)],
        num_cp: usize,
        fleet_size: usize,
    ) -> Result<Self, AssignmentError> {
        if num_cp == 0 {
            return Err(AssignmentError::NoChargingPoints);
        }
        let mut cp_of: Vec<Option<CpId>> = vec![None; fleet_size];
        let mut vehicles_of: Vec<Vec<VehicleId>> = vec![Vec::new(); num_cp];
        let mut seen_cp = vec![false; num_cp];

        for (cp, vehicles) in groups {
            let cp = *cp;
            if cp >= num_cp {
                return Err(AssignmentError::UnknownChargingPoint { cp, num_cp });
            }
            if seen_cp[cp] {
                return Err(AssignmentError::DuplicateChargingPoint(cp));
            }
            seen_cp[cp] = true;

            for &v in vehicles {
                let slot = cp_of.get_mut(v).ok_or(AssignmentError::UnknownVehicle {
                    vehicle: v,
                    fleet_size,
                })?;
                if slot.is_some() {
                    return Err(AssignmentError::AssignedTwice(v));
                }
                *slot = Some(cp);
                vehicles_of[cp].push(v);
            }
        }

        let cp_of = cp_of
            .into_iter()
            .enumerate()
            .map(|(v, cp)| cp.ok_or(AssignmentError::Unassigned(v)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { cp_of, vehicles_of })
    }

    /// Assigns vehicle `i` to charging point `i % num_cp`.
    ///
    /// # Errors
    ///
    /// Returns `AssignmentError::NoChargingPoints` if `num_cp` is zero.
    pub fn round_robin(num_cp: usize, fleet_size: usize) -> Result<Self, AssignmentError> {
        if num_cp == 0 {
            return Err(AssignmentError::NoChargingPoints);
        }
        let mut vehicles_of = vec![Vec::new(); num_cp];
        let cp_of: Vec<CpId> = (0..fleet_size).map(|v| v % num_cp).collect();
        for (v, &cp) in cp_of.iter().enumerate() {
            vehicles_of[cp].push(v);
        }
        Ok(Self { cp_of, vehicles_of })
    }

    /// Charging point serving `vehicle`.
    pub fn cp_of(&self, vehicle: VehicleId) -> Option<CpId> {
        self.cp_of.get(vehicle).copied()
    }

    /// Vehicles served by `cp`, in assignment order.
    pub fn vehicles_of(&self, cp: CpId) -> &[VehicleId] {
        self.vehicles_of.get(cp).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_cp(&self) -> usize {
        self.vehicles_of.len()
    }

    pub fn fleet_size(&self) -> usize {
        self.cp_of.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_groups_build_both_directions() {
        let t = AssignmentTable::from_groups(&[(0, vec![0, 2]), (1, vec![1])], 2, 3).unwrap();
        assert_eq!(t.cp_of(2), Some(0));
        assert_eq!(t.cp_of(1), Some(1));
        assert_eq!(t.vehicles_of(0), &[0, 2]);
        assert_eq!(t.vehicles_of(1), &[1]);
    }

    #[test]
    fn unlisted_cp_serves_nobody() {
        let t = AssignmentTable::from_groups(&[(0, vec![0, 1])], 3, 2).unwrap();
        assert!(t.vehicles_of(2).is_empty());
        assert_eq!(t.num_cp(), 3);
    }

    #[test]
    fn unknown_cp_rejected() {
        let err = AssignmentTable::from_groups(&[(4, vec![0])], 2, 1);
        assert_eq!(err, Err(AssignmentError::UnknownChargingPoint { cp: 4, num_cp: 2 }));
    }

    #[test]
    fn duplicate_vehicle_rejected() {
        let err = AssignmentTable::from_groups(&[(0, vec![0]), (1, vec![0])], 2, 1);
        assert_eq!(err, Err(AssignmentError::AssignedTwice(0)));
    }

    #[test]
    fn duplicate_cp_rejected() {
        let err = AssignmentTable::from_groups(&[(0, vec![0]), (0, vec![1])], 2, 2);
        assert_eq!(err, Err(AssignmentError::DuplicateChargingPoint(0)));
    }

    #[test]
    fn missing_vehicle_rejected() {
        let err = AssignmentTable::from_groups(&[(0, vec![0])], 1, 2);
        assert_eq!(err, Err(AssignmentError::Unassigned(1)));
    }

    #[test]
    fn unknown_vehicle_rejected() {
        let err = AssignmentTable::from_groups(&[(0, vec![0, 5])], 1, 1);
        assert_eq!(
            err,
            Err(AssignmentError::UnknownVehicle {
                vehicle: 5,
                fleet_size: 1
            })
        );
    }

    #[test]
    fn round_robin_covers_every_vehicle_once() {
        let t = AssignmentTable::round_robin(3, 7).unwrap();
        for v in 0..7 {
            assert_eq!(t.cp_of(v), Some(v % 3));
        }
        let total: usize = (0..3).map(|cp| t.vehicles_of(cp).len()).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn round_robin_needs_points() {
        assert_eq!(
            AssignmentTable::round_robin(0, 3),
            Err(AssignmentError::NoChargingPoints)
        );
    }
}
