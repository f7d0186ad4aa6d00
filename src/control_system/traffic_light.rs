use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;

/// The two phases a traffic light cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPhase {
    Red,
    Green,
}

struct LightInner {
    phase: Mutex<LightPhase>,
    phase_changed: Condvar,
    shutdown: AtomicBool,
}

/// A traffic light that flips between red and green on its own timed
/// cycle, independent of the vehicles waiting at the intersection.
///
/// The phase lives behind its own mutex, disjoint from the waiting-queue
/// lock, so the cycle thread can never be stalled by admission traffic.
pub struct TrafficLight {
    inner: Arc<LightInner>,
    cycle_ms: (u64, u64),
    cycle_thread: Mutex<Option<JoinHandle<()>>>,
}

/// Cycle duration range in milliseconds, drawn anew after every flip.
const DEFAULT_CYCLE_MS: (u64, u64) = (4000, 6000);

impl TrafficLight {
    /// Creates a light in the red phase with the default cycle range.
    pub fn new() -> Self {
        Self::with_cycle_millis(DEFAULT_CYCLE_MS.0, DEFAULT_CYCLE_MS.1)
    }

    /// Creates a light whose cycle duration is drawn from
    /// `min_ms..=max_ms`. Admin knob, also used to pin the phase in tests
    /// by picking a very long cycle.
    pub fn with_cycle_millis(min_ms: u64, max_ms: u64) -> Self {
        assert!(min_ms > 0 && min_ms <= max_ms, "invalid cycle range");
        Self {
            inner: Arc::new(LightInner {
                phase: Mutex::new(LightPhase::Red),
                phase_changed: Condvar::new(),
                shutdown: AtomicBool::new(false),
            }),
            cycle_ms: (min_ms, max_ms),
            cycle_thread: Mutex::new(None),
        }
    }

    /// Non-blocking snapshot of the current phase.
    pub fn current_phase(&self) -> LightPhase {
        *self.inner.phase.lock().unwrap()
    }

    /// Blocks the calling thread until the phase is green. Returns
    /// immediately if it already is.
    pub fn wait_for_green(&self) {
        let mut phase = self.inner.phase.lock().unwrap();
        while *phase != LightPhase::Green {
            phase = self.inner.phase_changed.wait(phase).unwrap();
        }
    }

    /// Directly sets the phase, waking any vehicles blocked in
    /// `wait_for_green` when switching to green. Admin override, in the
    /// same spirit as adjusting light timings from a control panel.
    pub fn force_phase(&self, new_phase: LightPhase) {
        let mut phase = self.inner.phase.lock().unwrap();
        *phase = new_phase;
        if new_phase == LightPhase::Green {
            self.inner.phase_changed.notify_all();
        }
    }

    /// Starts the phase-cycle thread. Calling this more than once has no
    /// effect.
    pub fn simulate(&self) {
        let mut slot = self.cycle_thread.lock().unwrap();
        if slot.is_some() {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let (min_ms, max_ms) = self.cycle_ms;
        let handle = thread::spawn(move || {
            let mut rng = rand::rng();
            let mut cycle_duration = Duration::from_millis(rng.random_range(min_ms..=max_ms));
            let mut last_switch = Instant::now();

            while !inner.shutdown.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(1));
                if last_switch.elapsed() < cycle_duration {
                    continue;
                }

                let switched_to = {
                    let mut phase = inner.phase.lock().unwrap();
                    *phase = match *phase {
                        LightPhase::Red => LightPhase::Green,
                        LightPhase::Green => LightPhase::Red,
                    };
                    if *phase == LightPhase::Green {
                        inner.phase_changed.notify_all();
                    }
                    *phase
                };
                log::debug!("traffic light switched to {:?}", switched_to);

                cycle_duration = Duration::from_millis(rng.random_range(min_ms..=max_ms));
                last_switch = Instant::now();
            }
        });
        *slot = Some(handle);
    }

    /// Stops the phase-cycle thread and joins it. Vehicles already blocked
    /// in `wait_for_green` are not woken; they have no cancellation path.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.cycle_thread.lock().unwrap().take() {
            handle.join().expect("traffic light cycle thread panicked");
        }
    }
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_red() {
        let light = TrafficLight::new();
        assert_eq!(light.current_phase(), LightPhase::Red);
    }

    #[test]
    fn force_phase_is_visible_in_snapshot() {
        let light = TrafficLight::new();
        light.force_phase(LightPhase::Green);
        assert_eq!(light.current_phase(), LightPhase::Green);
        light.force_phase(LightPhase::Red);
        assert_eq!(light.current_phase(), LightPhase::Red);
    }

    #[test]
    fn wait_for_green_returns_immediately_when_already_green() {
        let light = TrafficLight::new();
        light.force_phase(LightPhase::Green);
        light.wait_for_green();
    }

    #[test]
    fn wait_for_green_blocks_until_phase_flips() {
        let light = Arc::new(TrafficLight::new());
        let waiter = {
            let light = Arc::clone(&light);
            thread::spawn(move || light.wait_for_green())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());

        light.force_phase(LightPhase::Green);
        waiter.join().expect("waiter thread panicked");
    }

    #[test]
    fn cycle_thread_eventually_turns_green() {
        let light = TrafficLight::with_cycle_millis(10, 20);
        light.simulate();
        light.wait_for_green();
        light.shutdown();
    }
}
