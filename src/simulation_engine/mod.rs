// simulation_engine/mod.rs
pub mod intersections;
pub mod streets;
pub mod vehicles;
pub mod waiting_vehicles;
