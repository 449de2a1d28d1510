//! Charging-point connection state machine.

use thiserror::Error;

use crate::fleet::VehicleId;

/// Index of an installed charging point.
pub type CpId = usize;

/// Illegal transition on a charging point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("charging point {cp} is already occupied by vehicle {vehicle}")]
    Occupied { cp: CpId, vehicle: VehicleId },
    #[error("charging point {0} has no vehicle connected")]
    NotConnected(CpId),
}

/// Connection state of one charging point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Occupied { vehicle: VehicleId, since: usize },
}

/// One physical charger, connected to at most one vehicle at a time.
#[derive(Debug, Clone)]
pub struct ChargingPoint {
    id: CpId,
    state: SlotState,
    /// Step at which the last connection ended.
    last_end: Option<usize>,
    /// Number of completed connect transitions.
    sessions: usize,
}

impl ChargingPoint {
    /// Creates a free charging point.
    pub fn new(id: CpId) -> Self {
        Self {
            id,
            state: SlotState::Free,
            last_end: None,
            sessions: 0,
        }
    }

    pub fn id(&self) -> CpId {
        self.id
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn is_free(&self) -> bool {
        self.state == SlotState::Free
    }

    /// Vehicle currently connected, if any.
    pub fn vehicle(&self) -> Option<VehicleId> {
        match self.state {
            SlotState::Free => None,
            SlotState::Occupied { vehicle, .. } => Some(vehicle),
        }
    }

    /// Step at which the current connection started.
    pub fn charging_start(&self) -> Option<usize> {
        match self.state {
            SlotState::Free => None,
            SlotState::Occupied { since, .. } => Some(since),
        }
    }

    /// Step at which the most recent connection ended.
    pub fn charging_end(&self) -> Option<usize> {
        self.last_end
    }

    /// Number of connections made so far.
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Continuous connection time at step `t`, in steps. Zero while free.
    pub fn duration(&self, t: usize) -> usize {
        match self.state {
            SlotState::Free => 0,
            SlotState::Occupied { since, .. } => t.saturating_sub(since),
        }
    }

    /// Connects `vehicle` at step `t`.
    ///
    /// # Errors
    ///
    /// Returns `SlotError::Occupied` if another vehicle is connected.
    pub fn connect(&mut self, vehicle: VehicleId, t: usize) -> Result<(), SlotError> {
        if let SlotState::Occupied { vehicle: current, .. } = self.state {
            return Err(SlotError::Occupied {
                cp: self.id,
                vehicle: current,
            });
        }
        self.state = SlotState::Occupied { vehicle, since: t };
        self.sessions += 1;
        Ok(())
    }

    /// Disconnects the current vehicle at step `t` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `SlotError::NotConnected` if the slot is already free.
    pub fn disconnect(&mut self, t: usize) -> Result<VehicleId, SlotError> {
        match self.state {
            SlotState::Free => Err(SlotError::NotConnected(self.id)),
            SlotState::Occupied { vehicle, .. } => {
                self.state = SlotState::Free;
                self.last_end = Some(t);
                Ok(vehicle)
            }
        }
    }
}
