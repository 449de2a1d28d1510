//! Admission queue and charging-point pool of one charging group.

use std::collections::VecDeque;

use tracing::debug;

use crate::fleet::{Vehicle, VehicleId};

use super::priority::sort_queue;
use super::slot::{ChargingPoint, CpId, SlotError};

/// Why a connected vehicle was released from its charging point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The vehicle leaves home at this step.
    Departure,
    /// SOC reached SOC-max.
    Full,
    /// Continuous connection reached the configured maximum.
    DurationCap,
}

/// A completed disconnect transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnect {
    pub cp: CpId,
    pub vehicle: VehicleId,
    pub reason: DisconnectReason,
}

/// A set of charging points shared by a fixed set of member vehicles.
///
/// Vehicles wait in a FIFO queue that is re-sorted by priority every step
/// before free points are handed out.
#[derive(Debug, Clone)]
pub struct ChargingGroup {
    id: usize,
    members: Vec<VehicleId>,
    slots: Vec<ChargingPoint>,
    queue: VecDeque<VehicleId>,
    /// `queued[v]` mirrors membership of `v` in `queue`.
    queued: Vec<bool>,
    max_duration_steps: Option<usize>,
}

impl ChargingGroup {
    /// Creates a group of `slots` serving `members`.
    ///
    /// `max_duration_steps` forces a disconnect once a vehicle has been
    /// connected that long; `None` disables the cap.
    pub fn new(
        id: usize,
        members: Vec<VehicleId>,
        slots: Vec<ChargingPoint>,
        max_duration_steps: Option<usize>,
    ) -> Self {
        let queued = vec![false; members.iter().max().map_or(0, |&v| v + 1)];
        Self {
            id,
            members,
            slots,
            queue: VecDeque::new(),
            queued,
            max_duration_steps,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn members(&self) -> &[VehicleId] {
        &self.members
    }

    pub fn slots(&self) -> &[ChargingPoint] {
        &self.slots
    }

    /// Vehicles waiting, head first.
    pub fn queue(&self) -> &VecDeque<VehicleId> {
        &self.queue
    }

    /// Vehicles currently connected to one of the group's points.
    pub fn connected(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.slots.iter().filter_map(ChargingPoint::vehicle)
    }

    pub fn is_connected(&self, vehicle: VehicleId) -> bool {
        self.connected().any(|v| v == vehicle)
    }

    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_free()).count()
    }

    /// Drops queued vehicles that no longer need a point, then appends
    /// members that are home, below SOC-max, and neither queued nor
    /// connected.
    pub fn update_queue(&mut self, vehicles: &[Vehicle], t: usize) {
        let queued = &mut self.queued;
        self.queue.retain(|&v| {
            let keep = vehicles[v].needs_charge(t);
            queued[v] = keep;
            keep
        });

        for &v in &self.members {
            if vehicles[v].needs_charge(t)
                && !self.queued[v]
                && !self.slots.iter().any(|s| s.vehicle() == Some(v))
            {
                self.queue.push_back(v);
                self.queued[v] = true;
            }
        }
    }

    /// Re-sorts the queue by departure urgency and depletion.
    pub fn sort_queue(&mut self, vehicles: &[Vehicle], t: usize, final_step: usize) {
        sort_queue(&mut self.queue, vehicles, t, final_step);
    }

    /// Hands free points to the head of the queue.
    ///
    /// Does nothing while `allow_connect` is false (blackout window).
    ///
    /// # Errors
    ///
    /// Propagates a `SlotError` from an illegal slot transition.
    pub fn connect_waiting(
        &mut self,
        t: usize,
        allow_connect: bool,
    ) -> Result<Vec<(CpId, VehicleId)>, SlotError> {
        let mut connected = Vec::new();
        if !allow_connect {
            return Ok(connected);
        }
        while !self.queue.is_empty() {
            let Some(slot) = self.slots.iter_mut().find(|s| s.is_free()) else {
                break;
            };
            let Some(v) = self.queue.pop_front() else {
                break;
            };
            self.queued[v] = false;
            slot.connect(v, t)?;
            debug!(group = self.id, cp = slot.id(), vehicle = v, t, "connected");
            connected.push((slot.id(), v));
        }
        Ok(connected)
    }

    /// Releases vehicles that depart at `t`, are full, or hit the duration
    /// cap, and passes each freed point to the next queued vehicle.
    ///
    /// # Errors
    ///
    /// Propagates a `SlotError` from an illegal slot transition.
    pub fn evaluate_disconnects(
        &mut self,
        vehicles: &[Vehicle],
        t: usize,
        allow_connect: bool,
    ) -> Result<Vec<Disconnect>, SlotError> {
        let mut released = Vec::new();
        for slot in &mut self.slots {
            let Some(v) = slot.vehicle() else {
                continue;
            };
            let vehicle = &vehicles[v];
            let reason = if vehicle.profile.departs_at(t) || !vehicle.state.at_home[t] {
                Some(DisconnectReason::Departure)
            } else if vehicle.is_full() {
                Some(DisconnectReason::Full)
            } else if self
                .max_duration_steps
                .is_some_and(|cap| slot.duration(t) >= cap)
            {
                Some(DisconnectReason::DurationCap)
            } else {
                None
            };
            let Some(reason) = reason else {
                continue;
            };

            slot.disconnect(t)?;
            debug!(group = self.id, cp = slot.id(), vehicle = v, t, ?reason, "disconnected");
            released.push(Disconnect {
                cp: slot.id(),
                vehicle: v,
                reason,
            });

            if !allow_connect {
                continue;
            }
            if let Some(next) = self.queue.pop_front() {
                self.queued[next] = false;
                slot.connect(next, t)?;
                debug!(group = self.id, cp = slot.id(), vehicle = next, t, "connected");
            }
        }
        Ok(released)
    }
}
