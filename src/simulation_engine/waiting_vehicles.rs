use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::simulation_engine::intersections::CrossingPermit;
use crate::simulation_engine::vehicles::Vehicle;

struct Inner {
    vehicles: Vec<Vehicle>,
    permits: Vec<oneshot::Sender<CrossingPermit>>,
}

/// Thread-safe FIFO of vehicles waiting in front of an intersection.
///
/// Each waiting vehicle is paired with the sending half of a one-shot
/// channel. The admission loop fires that sender exactly once to grant
/// entry; the vehicle thread blocks on the receiving half inside
/// `Intersection::request_entry`.
///
/// Invariant: `vehicles` and `permits` always have the same length and are
/// index-aligned. Both live behind a single mutex so no reader can observe
/// one updated without the other. The mutex is only held for the push and
/// pop themselves, never across a signal wait, a light wait, or logging.
pub struct WaitingVehicles {
    inner: Mutex<Inner>,
}

impl WaitingVehicles {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                vehicles: Vec::new(),
                permits: Vec::new(),
            }),
        }
    }

    /// Number of vehicles currently waiting.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        debug_assert_eq!(inner.vehicles.len(), inner.permits.len());
        inner.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a vehicle and its entry signal to the back of the queue.
    pub fn push_back(&self, vehicle: Vehicle, permit_tx: oneshot::Sender<CrossingPermit>) {
        let mut inner = self.inner.lock().unwrap();
        inner.vehicles.push(vehicle);
        inner.permits.push(permit_tx);
        debug_assert_eq!(inner.vehicles.len(), inner.permits.len());
    }

    /// Grants entry to the vehicle at the head of the queue by firing its
    /// one-shot signal with the given permit, and removes the entry.
    ///
    /// The whole operation happens under the queue lock, so no caller can
    /// observe an admitted entry still queued or a removed entry that was
    /// never signaled. Calling this on an empty queue is a precondition
    /// violation by the admission loop and panics.
    ///
    /// Returns the admitted vehicle so the caller can log it after the
    /// lock is released.
    pub fn permit_entry_to_first_in_queue(&self, permit: CrossingPermit) -> Vehicle {
        let mut inner = self.inner.lock().unwrap();
        assert!(
            !inner.vehicles.is_empty(),
            "permit_entry_to_first_in_queue called on an empty queue"
        );

        let first_vehicle = inner.vehicles.remove(0);
        let first_permit = inner.permits.remove(0);
        debug_assert_eq!(inner.vehicles.len(), inner.permits.len());

        if first_permit.send(permit).is_err() {
            // The receiving half only disappears if the waiting vehicle
            // thread died, which breaks the admission invariant.
            panic!(
                "entry signal for vehicle {} had no receiver",
                first_vehicle.id
            );
        }

        first_vehicle
    }
}

impl Default for WaitingVehicles {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersections::IntersectionId;
    use crate::simulation_engine::vehicles::VehicleType;

    fn test_vehicle(id: u64) -> Vehicle {
        Vehicle::new(id, VehicleType::Car, 50.0)
    }

    #[test]
    fn push_back_keeps_vehicle_and_signal_lists_aligned() {
        let queue = WaitingVehicles::new();
        assert_eq!(queue.len(), 0);

        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();
        queue.push_back(test_vehicle(1), tx1);
        queue.push_back(test_vehicle(2), tx2);

        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn permit_entry_fires_head_signal_and_removes_entry() {
        let queue = WaitingVehicles::new();
        let (tx, mut rx) = oneshot::channel();
        queue.push_back(test_vehicle(7), tx);

        let admitted = queue.permit_entry_to_first_in_queue(CrossingPermit::new(IntersectionId(0)));

        assert_eq!(admitted.id, 7);
        assert_eq!(queue.len(), 0);
        let permit = rx.try_recv().expect("signal should have fired");
        assert_eq!(permit.intersection_id(), IntersectionId(0));
    }

    #[test]
    fn permit_entry_respects_fifo_order() {
        let queue = WaitingVehicles::new();
        let (tx1, mut rx1) = oneshot::channel();
        let (tx2, mut rx2) = oneshot::channel();
        queue.push_back(test_vehicle(1), tx1);
        queue.push_back(test_vehicle(2), tx2);

        let admitted = queue.permit_entry_to_first_in_queue(CrossingPermit::new(IntersectionId(0)));

        assert_eq!(admitted.id, 1);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    #[should_panic(expected = "empty queue")]
    fn permit_entry_on_empty_queue_panics() {
        let queue = WaitingVehicles::new();
        queue.permit_entry_to_first_in_queue(CrossingPermit::new(IntersectionId(0)));
    }
}
