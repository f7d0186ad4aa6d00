// src/shared_data.rs

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::simulation_engine::intersections::IntersectionId;

/// One completed crossing of an intersection by a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossingRecord {
    pub vehicle_id: u64,
    pub intersection_id: IntersectionId,
    /// Time spent between requesting entry and being granted it.
    pub waited_ms: u64,
    pub timestamp: u64,
}

/// Aggregated view over all recorded crossings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossingSummary {
    pub total_crossings: usize,
    pub average_wait_ms: f64,
    pub max_wait_ms: u64,
    pub timestamp: u64,
}

/// Seconds since the Unix epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is set before the unix epoch")
        .as_secs()
}
