pub mod allocation;
pub mod assignment;
/// Daily no-charging windows.
pub mod blackout;
pub mod engine;
/// Building grid connection and capacity checks.
pub mod grid;
pub mod horizon;
pub mod kpi;
pub mod priority;
pub mod queue;
pub mod slot;
pub mod soc;
pub mod strategy;
pub mod types;
