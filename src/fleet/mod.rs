//! Vehicle records and the synthetic travel-demand generator.

/// Seeded commuting schedules.
pub mod travel;
pub mod vehicle;

pub use travel::{BatteryParams, TravelGenerator, TravelParams};
pub use vehicle::{Vehicle, VehicleId, VehicleProfile, VehicleState};
