use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::control_system::traffic_light::{LightPhase, TrafficLight};
use crate::simulation_engine::streets::Street;
use crate::simulation_engine::vehicles::Vehicle;
use crate::simulation_engine::waiting_vehicles::WaitingVehicles;

/// Unique identifier for an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntersectionId(pub u32);

/// Proof that the holder was admitted into an intersection and has not yet
/// departed.
///
/// A permit is minted only by the admission loop, cannot be cloned, and is
/// consumed by `Intersection::notify_departure`, so a departure without a
/// matching prior admission does not compile and a double departure moves
/// out of a used value.
#[derive(Debug)]
#[must_use = "a crossing permit must be returned via notify_departure"]
pub struct CrossingPermit {
    intersection_id: IntersectionId,
}

impl CrossingPermit {
    pub(crate) fn new(intersection_id: IntersectionId) -> Self {
        Self { intersection_id }
    }

    /// The intersection this permit was issued for.
    pub fn intersection_id(&self) -> IntersectionId {
        self.intersection_id
    }
}

/// Heartbeat interval of the admission loop. Wakeups normally arrive
/// through the condvar; the timeout only bounds the latency of a missed
/// notification.
const ADMISSION_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A road intersection that admits vehicles one at a time.
///
/// Vehicles call `request_entry` from their own threads and block until the
/// background admission loop grants them the head of the waiting queue and
/// the traffic light shows green. The returned `CrossingPermit` is handed
/// back through `notify_departure` once the vehicle has crossed, which
/// frees the intersection for the next vehicle in line.
///
/// Lock order: the admission loop takes the occupancy lock first and the
/// queue lock (inside `WaitingVehicles`) second. No path takes them in the
/// opposite order, and neither lock is ever held across a blocking wait or
/// a log call.
pub struct Intersection {
    pub id: IntersectionId,
    pub name: String,
    /// Streets touching this intersection. Immutable after construction.
    streets: Vec<Arc<Street>>,
    waiting_vehicles: WaitingVehicles,
    traffic_light: TrafficLight,
    /// True while a vehicle is inside the intersection. Set by the
    /// admission loop, cleared only by `notify_departure`.
    occupancy: Mutex<bool>,
    admission_wakeup: Condvar,
    shutdown: AtomicBool,
    admission_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Intersection {
    /// Creates an intersection with a default traffic light.
    pub fn new(id: IntersectionId, name: String, streets: Vec<Arc<Street>>) -> Self {
        Self::with_traffic_light(id, name, streets, TrafficLight::new())
    }

    /// Creates an intersection with a specific traffic light, e.g. one
    /// with a custom cycle range.
    pub fn with_traffic_light(
        id: IntersectionId,
        name: String,
        streets: Vec<Arc<Street>>,
        traffic_light: TrafficLight,
    ) -> Self {
        Self {
            id,
            name,
            streets,
            waiting_vehicles: WaitingVehicles::new(),
            traffic_light,
            occupancy: Mutex::new(false),
            admission_wakeup: Condvar::new(),
            shutdown: AtomicBool::new(false),
            admission_thread: Mutex::new(None),
        }
    }

    pub fn traffic_light(&self) -> &TrafficLight {
        &self.traffic_light
    }

    /// Number of vehicles currently waiting in front of this intersection.
    pub fn waiting_count(&self) -> usize {
        self.waiting_vehicles.len()
    }

    /// All streets leaving this intersection except the one the query
    /// arrives on. Pure lookup over the static topology.
    pub fn resolve_outgoing(&self, incoming: &Street) -> Vec<Arc<Street>> {
        self.streets
            .iter()
            .filter(|street| street.id != incoming.id)
            .cloned()
            .collect()
    }

    /// Queues the vehicle for entry and blocks the calling thread until it
    /// is both first in line and the light shows green.
    ///
    /// Being popped from the queue is necessary but not sufficient: the
    /// light gate is checked after the entry signal fires, so a vehicle
    /// whose turn arrives during a red phase keeps waiting for green.
    pub fn request_entry(&self, vehicle: Vehicle) -> CrossingPermit {
        log::info!(
            "Intersection {}: vehicle {:?} {} is waiting for entry",
            self.id.0,
            vehicle.vehicle_type,
            vehicle.id
        );

        let (permit_tx, permit_rx) = oneshot::channel();
        self.waiting_vehicles.push_back(vehicle.clone(), permit_tx);
        // The queue just became non-empty. Notifying under the occupancy
        // lock pairs with the admission loop's predicate check, so the
        // wakeup cannot be lost.
        {
            let _occupied = self.occupancy.lock().unwrap();
            self.admission_wakeup.notify_one();
        }

        let permit = permit_rx.blocking_recv().unwrap_or_else(|_| {
            panic!(
                "entry signal for vehicle {} was dropped before it fired",
                vehicle.id
            )
        });

        if self.traffic_light.current_phase() != LightPhase::Green {
            self.traffic_light.wait_for_green();
        }
        log::info!(
            "Intersection {}: vehicle {:?} {} is granted entry",
            self.id.0,
            vehicle.vehicle_type,
            vehicle.id
        );

        permit
    }

    /// Reports that the admitted vehicle has left the intersection,
    /// consuming its permit and freeing the slot for the next admission.
    pub fn notify_departure(&self, permit: CrossingPermit) {
        assert_eq!(
            permit.intersection_id(),
            self.id,
            "crossing permit returned to the wrong intersection"
        );

        {
            let mut occupied = self.occupancy.lock().unwrap();
            *occupied = false;
            self.admission_wakeup.notify_one();
        }
        log::debug!("Intersection {}: occupant departed", self.id.0);
    }

    /// Starts the traffic-light cycle thread and the admission-loop thread
    /// for this intersection. Both run until `shutdown` is called.
    pub fn simulate(self: &Arc<Self>) {
        self.traffic_light.simulate();

        let mut slot = self.admission_thread.lock().unwrap();
        if slot.is_some() {
            return;
        }
        let this = Arc::clone(self);
        *slot = Some(thread::spawn(move || this.process_vehicle_queue()));
    }

    /// Stops the admission loop and the light cycle and joins both
    /// threads. Vehicles still blocked in `request_entry` are unaffected;
    /// they have no cancellation path.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        {
            let _occupied = self.occupancy.lock().unwrap();
            self.admission_wakeup.notify_all();
        }
        if let Some(handle) = self.admission_thread.lock().unwrap().take() {
            handle.join().expect("admission loop thread panicked");
        }
        self.traffic_light.shutdown();
    }

    /// Perpetual admission loop: whenever the queue is non-empty and no
    /// vehicle occupies the intersection, mark it occupied and fire the
    /// entry signal of the vehicle at the head of the queue.
    fn process_vehicle_queue(&self) {
        log::debug!("{}: admission loop started", self.name);

        let mut occupied = self.occupancy.lock().unwrap();
        while !self.shutdown.load(Ordering::Relaxed) {
            if !*occupied && !self.waiting_vehicles.is_empty() {
                // One vehicle at a time: the flag is cleared by
                // notify_departure, never by this loop.
                *occupied = true;
                drop(occupied);

                let vehicle = self
                    .waiting_vehicles
                    .permit_entry_to_first_in_queue(CrossingPermit::new(self.id));
                log::debug!(
                    "Intersection {}: vehicle {:?} {} reached the head of the queue",
                    self.id.0,
                    vehicle.vehicle_type,
                    vehicle.id
                );

                occupied = self.occupancy.lock().unwrap();
            } else {
                let (guard, _timed_out) = self
                    .admission_wakeup
                    .wait_timeout(occupied, ADMISSION_POLL_INTERVAL)
                    .unwrap();
                occupied = guard;
            }
        }

        log::debug!("{}: admission loop stopped", self.name);
    }
}

/// Builds the intersections of the demo grid, each wired to the streets
/// that touch it.
pub fn create_intersections(streets: &[Arc<Street>]) -> Vec<Arc<Intersection>> {
    (0..4)
        .map(|n| {
            let id = IntersectionId(n);
            let connected: Vec<Arc<Street>> = streets
                .iter()
                .filter(|street| street.connects(id))
                .cloned()
                .collect();
            Arc::new(Intersection::new(
                id,
                format!("Intersection {}", n),
                connected,
            ))
        })
        .collect()
}
