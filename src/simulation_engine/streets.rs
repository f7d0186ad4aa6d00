use std::sync::Arc;

use crate::simulation_engine::intersections::IntersectionId;

/// Represents a street (road connection between two intersections).
///
/// Streets are two-way: a vehicle may traverse them in either direction.
/// The topology is fixed before the simulation starts and never mutated
/// afterwards, so streets are shared as plain `Arc`s without locking.
#[derive(Debug, Clone)]
pub struct Street {
    pub id: u32,
    pub name: String,
    /// One end of the street.
    pub from: IntersectionId,
    /// The other end of the street.
    pub to: IntersectionId,
    /// Length of the street in meters.
    pub length_meters: f64,
}

impl Street {
    pub fn new(
        id: u32,
        name: &str,
        from: IntersectionId,
        to: IntersectionId,
        length_meters: f64,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: name.to_string(),
            from,
            to,
            length_meters,
        })
    }

    /// Returns the endpoint on the far side of the street as seen from `here`.
    pub fn opposite_end(&self, here: IntersectionId) -> IntersectionId {
        if self.from == here {
            self.to
        } else {
            self.from
        }
    }

    /// Whether this street touches the given intersection.
    pub fn connects(&self, intersection: IntersectionId) -> bool {
        self.from == intersection || self.to == intersection
    }
}

/// Builds the street network for the demo grid: a ring of four
/// intersections plus both diagonals, so every intersection has three
/// outgoing options.
pub fn create_streets() -> Vec<Arc<Street>> {
    vec![
        Street::new(0, "North Street", IntersectionId(0), IntersectionId(1), 120.0),
        Street::new(1, "East Street", IntersectionId(1), IntersectionId(2), 90.0),
        Street::new(2, "South Street", IntersectionId(2), IntersectionId(3), 120.0),
        Street::new(3, "West Street", IntersectionId(3), IntersectionId(0), 90.0),
        Street::new(4, "First Diagonal", IntersectionId(0), IntersectionId(2), 150.0),
        Street::new(5, "Second Diagonal", IntersectionId(1), IntersectionId(3), 150.0),
    ]
}
