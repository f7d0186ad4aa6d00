//! Concurrent road-intersection simulation: vehicles on their own OS
//! threads queue up at intersections that admit them one at a time,
//! gated by a traffic light cycling on its own thread.

pub mod control_system;
pub mod monitoring;
pub mod shared_data;
pub mod simulation_engine;
