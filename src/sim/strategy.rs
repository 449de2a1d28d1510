//! Charging configurations: how charging points are grouped and how grid
//! headroom is shared.

use std::fmt;

use crate::error::AssignmentError;
use crate::fleet::VehicleId;

use super::allocation::ShareDivisor;
use super::assignment::AssignmentTable;
use super::queue::ChargingGroup;
use super::slot::ChargingPoint;

/// Topology of one charging configuration.
///
/// Implemented by the three configurations; the engine is generic over it.
pub trait ChargingStrategy {
    /// Short human-readable name.
    fn name(&self) -> &'static str;

    /// Builds the charging groups for a fleet of `fleet_size` vehicles.
    /// Every vehicle must be a member of exactly one group.
    fn build_groups(&self, fleet_size: usize) -> Vec<ChargingGroup>;

    /// Divisor applied to headroom to obtain the per-connection share.
    fn divisor(&self) -> ShareDivisor;
}

/// Configuration 1: every vehicle owns a dedicated connection; headroom is
/// split among all vehicles at home. No waiting and no duration cap.
#[derive(Debug, Default, Clone, Copy)]
pub struct DedicatedShare;

impl ChargingStrategy for DedicatedShare {
    fn name(&self) -> &'static str {
        "dedicated"
    }

    fn build_groups(&self, fleet_size: usize) -> Vec<ChargingGroup> {
        (0..fleet_size)
            .map(|v| ChargingGroup::new(v, vec![v], vec![ChargingPoint::new(v)], None))
            .collect()
    }

    fn divisor(&self) -> ShareDivisor {
        ShareDivisor::VehiclesAtHome
    }
}

/// Configuration 2: one pool of `num_cp` points shared by the whole fleet
/// through a single admission queue.
#[derive(Debug, Clone, Copy)]
pub struct SharedPool {
    pub num_cp: usize,
    pub max_duration_steps: Option<usize>,
}

impl ChargingStrategy for SharedPool {
    fn name(&self) -> &'static str {
        "shared"
    }

    fn build_groups(&self, fleet_size: usize) -> Vec<ChargingGroup> {
        let members: Vec<VehicleId> = (0..fleet_size).collect();
        let slots = (0..self.num_cp).map(ChargingPoint::new).collect();
        vec![ChargingGroup::new(0, members, slots, self.max_duration_steps)]
    }

    fn divisor(&self) -> ShareDivisor {
        ShareDivisor::InstalledPoints(self.num_cp)
    }
}

/// Configuration 3: each point serves a fixed subset of vehicles with its
/// own queue.
#[derive(Debug, Clone)]
pub struct StaticAssignment {
    pub table: AssignmentTable,
    pub max_duration_steps: Option<usize>,
}

impl ChargingStrategy for StaticAssignment {
    fn name(&self) -> &'static str {
        "assigned"
    }

    fn build_groups(&self, _fleet_size: usize) -> Vec<ChargingGroup> {
        (0..self.table.num_cp())
            .map(|cp| {
                ChargingGroup::new(
                    cp,
                    self.table.vehicles_of(cp).to_vec(),
                    vec![ChargingPoint::new(cp)],
                    self.max_duration_steps,
                )
            })
            .collect()
    }

    fn divisor(&self) -> ShareDivisor {
        ShareDivisor::InstalledPoints(self.table.num_cp())
    }
}

/// Checks that `groups` place every vehicle `0..fleet_size` in exactly
/// one group.
///
/// # Errors
///
/// Returns the first `AssignmentError` found: a member outside the fleet,
/// a vehicle in two groups, or a vehicle in none.
pub fn check_single_assignment(
    groups: &[ChargingGroup],
    fleet_size: usize,
) -> Result<(), AssignmentError> {
    let mut assigned = vec![false; fleet_size];
    for &v in groups.iter().flat_map(|g| g.members()) {
        let Some(seen) = assigned.get_mut(v) else {
            return Err(AssignmentError::UnknownVehicle {
                vehicle: v,
                fleet_size,
            });
        };
        if *seen {
            return Err(AssignmentError::AssignedTwice(v));
        }
        *seen = true;
    }
    match assigned.iter().position(|&seen| !seen) {
        Some(v) => Err(AssignmentError::Unassigned(v)),
        None => Ok(()),
    }
}

/// Runtime choice among the three configurations.
#[derive(Debug, Clone)]
pub enum Strategy {
    Dedicated(DedicatedShare),
    Shared(SharedPool),
    Assigned(StaticAssignment),
}

impl ChargingStrategy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::Dedicated(s) => s.name(),
            Strategy::Shared(s) => s.name(),
            Strategy::Assigned(s) => s.name(),
        }
    }

    fn build_groups(&self, fleet_size: usize) -> Vec<ChargingGroup> {
        match self {
            Strategy::Dedicated(s) => s.build_groups(fleet_size),
            Strategy::Shared(s) => s.build_groups(fleet_size),
            Strategy::Assigned(s) => s.build_groups(fleet_size),
        }
    }

    fn divisor(&self) -> ShareDivisor {
        match self {
            Strategy::Dedicated(s) => s.divisor(),
            Strategy::Shared(s) => s.divisor(),
            Strategy::Assigned(s) => s.divisor(),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
