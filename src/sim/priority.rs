//! Queue ordering: vehicles leaving soonest first, then the most depleted.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::fleet::{Vehicle, VehicleId};

/// Sort key of one queued vehicle at step `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityKey {
    /// Next departure strictly after `t` (or the final step).
    pub next_departure: usize,
    /// Working SOC divided by SOC-max.
    pub soc_fraction: f32,
}

impl PriorityKey {
    /// Computes the key of `vehicle` at step `t`.
    pub fn of(vehicle: &Vehicle, t: usize, final_step: usize) -> Self {
        Self {
            next_departure: vehicle.profile.next_departure(t, final_step),
            soc_fraction: vehicle.soc_fraction(),
        }
    }

    /// Ascending on next departure, ties broken by ascending SOC fraction.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.next_departure
            .cmp(&other.next_departure)
            .then_with(|| self.soc_fraction.total_cmp(&other.soc_fraction))
    }
}

/// Re-sorts `queue` in place by [`PriorityKey`]. The sort is stable, so
/// vehicles with equal keys keep their arrival order.
pub fn sort_queue(queue: &mut VecDeque<VehicleId>, vehicles: &[Vehicle], t: usize, final_step: usize) {
    queue.make_contiguous().sort_by(|&a, &b| {
        let ka = PriorityKey::of(&vehicles[a], t, final_step);
        let kb = PriorityKey::of(&vehicles[b], t, final_step);
        ka.compare(&kb)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::VehicleProfile;

    fn vehicle(id: usize, soc: f32, dep: usize) -> Vehicle {
        let profile = VehicleProfile::new(id, 50.0, 0.0, 40.0, soc, vec![dep], vec![dep + 4], vec![1.0], 96)
            .unwrap();
        Vehicle::new(profile, 96)
    }

    #[test]
    fn earliest_departure_first() {
        let fleet = vec![vehicle(0, 10.0, 50), vehicle(1, 30.0, 20), vehicle(2, 5.0, 70)];
        let mut queue: VecDeque<VehicleId> = VecDeque::from(vec![0, 1, 2]);
        sort_queue(&mut queue, &fleet, 0, 95);
        assert_eq!(queue, VecDeque::from(vec![1, 0, 2]));
    }

    #[test]
    fn equal_departure_prefers_depleted() {
        let fleet = vec![vehicle(0, 30.0, 20), vehicle(1, 10.0, 20), vehicle(2, 20.0, 20)];
        let mut queue: VecDeque<VehicleId> = VecDeque::from(vec![0, 1, 2]);
        sort_queue(&mut queue, &fleet, 0, 95);
        assert_eq!(queue, VecDeque::from(vec![1, 2, 0]));
    }

    #[test]
    fn full_ties_keep_arrival_order() {
        let fleet = vec![vehicle(0, 10.0, 20), vehicle(1, 10.0, 20)];
        let mut queue: VecDeque<VehicleId> = VecDeque::from(vec![1, 0]);
        sort_queue(&mut queue, &fleet, 0, 95);
        assert_eq!(queue, VecDeque::from(vec![1, 0]));
    }

    #[test]
    fn no_remaining_departure_uses_final_step() {
        let v = vehicle(0, 10.0, 20);
        let key = PriorityKey::of(&v, 30, 95);
        assert_eq!(key.next_departure, 95);
        assert!((key.soc_fraction - 0.25).abs() < 1e-6);
    }
}
