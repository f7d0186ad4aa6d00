use intersection_sim::monitoring::crossing_monitor::CrossingMonitor;
use intersection_sim::shared_data::{current_timestamp, CrossingRecord};
use intersection_sim::simulation_engine::intersections::{create_intersections, Intersection};
use intersection_sim::simulation_engine::streets::{create_streets, Street};
use intersection_sim::simulation_engine::vehicles::{Vehicle, VehicleType};
use rand::Rng;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const VEHICLE_COUNT: u64 = 6;
const CROSSINGS_PER_VEHICLE: usize = 3;
/// Time a vehicle spends inside an intersection while crossing it.
const CROSSING_TIME: Duration = Duration::from_millis(400);

/// Creates a vehicle with a random type and a speed drawn from the range
/// typical for that type.
/// Car: 50%, Truck: 25%, Bus: 15%, EmergencyVan: 10%.
fn spawn_vehicle(id: u64) -> Vehicle {
    let mut rng = rand::rng();
    let rand_val: f64 = rng.random_range(0.0..1.0);
    let vehicle_type = if rand_val < 0.50 {
        VehicleType::Car
    } else if rand_val < 0.75 {
        VehicleType::Truck
    } else if rand_val < 0.90 {
        VehicleType::Bus
    } else {
        VehicleType::EmergencyVan
    };

    let speed = match vehicle_type {
        VehicleType::Car => rng.random_range(40.0..100.0),
        VehicleType::Bus => rng.random_range(40.0..80.0),
        VehicleType::Truck => rng.random_range(40.0..70.0),
        VehicleType::EmergencyVan => rng.random_range(60.0..120.0),
    };

    Vehicle::new(id, vehicle_type, speed)
}

/// Drives a single vehicle through a fixed number of crossings: travel
/// the current street, request entry at the intersection on its far end,
/// cross, report the departure, then pick a random outgoing street.
fn drive_vehicle(
    vehicle: Vehicle,
    start_street: Arc<Street>,
    intersections: Vec<Arc<Intersection>>,
    monitor: Arc<CrossingMonitor>,
) {
    let mut rng = rand::rng();
    let mut street = Arc::clone(&start_street);
    let mut position = street.from;

    for _ in 0..CROSSINGS_PER_VEHICLE {
        let destination = street.opposite_end(position);
        let travel_time_secs = street.length_meters / vehicle.speed;
        log::info!(
            "Vehicle {:?} {} traveling {} (to intersection {}) in {:.2} seconds",
            vehicle.vehicle_type,
            vehicle.id,
            street.name,
            destination.0,
            travel_time_secs
        );
        thread::sleep(Duration::from_secs_f64(travel_time_secs));

        let Some(intersection) = intersections.iter().find(|i| i.id == destination) else {
            break;
        };

        let waiting_since = Instant::now();
        let permit = intersection.request_entry(vehicle.clone());
        let waited_ms = waiting_since.elapsed().as_millis() as u64;

        thread::sleep(CROSSING_TIME);
        intersection.notify_departure(permit);

        monitor.record(CrossingRecord {
            vehicle_id: vehicle.id,
            intersection_id: intersection.id,
            waited_ms,
            timestamp: current_timestamp(),
        });

        let outgoing = intersection.resolve_outgoing(&street);
        if outgoing.is_empty() {
            break;
        }
        street = Arc::clone(&outgoing[rng.random_range(0..outgoing.len())]);
        position = destination;
    }

    log::info!(
        "Vehicle {:?} {} finished its route",
        vehicle.vehicle_type,
        vehicle.id
    );
}

fn main() {
    env_logger::init();

    let streets = create_streets();
    let intersections = create_intersections(&streets);
    for intersection in &intersections {
        intersection.simulate();
    }

    let monitor = Arc::new(CrossingMonitor::new());
    let mut rng = rand::rng();

    let handles: Vec<_> = (1..=VEHICLE_COUNT)
        .map(|id| {
            let vehicle = spawn_vehicle(id);
            let start_street = Arc::clone(&streets[rng.random_range(0..streets.len())]);
            let intersections = intersections.clone();
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || drive_vehicle(vehicle, start_street, intersections, monitor))
        })
        .collect();

    for handle in handles {
        handle.join().expect("vehicle thread panicked");
    }

    let summary = monitor.summary();
    match serde_json::to_string(&summary) {
        Ok(json) => log::info!("simulation finished: {}", json),
        Err(e) => log::error!("failed to serialize crossing summary: {}", e),
    }
    if let Err(e) = monitor.export_csv("crossings.csv") {
        log::error!("failed to export crossing records: {}", e);
    }

    for intersection in &intersections {
        intersection.shutdown();
    }
}
