//! Simulator for uncoordinated EV charging in a residential building.
//!
//! Vehicles arrive, queue for charging points, and charge at a share of the
//! grid headroom left by household demand. Three charging configurations
//! are supported: a dedicated point per vehicle, a shared pool, and a static
//! vehicle to point assignment.

pub mod config;
pub mod error;
pub mod fleet;
pub mod household;
/// CSV and JSON export.
pub mod io;
pub mod runner;
/// Simulation driver, queueing, allocation, and SOC modules.
pub mod sim;
