use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use crate::shared_data::{current_timestamp, CrossingRecord, CrossingSummary};

/// Collects crossing records from all vehicle threads.
///
/// Purely in-process: vehicle threads push records as they finish a
/// crossing, and the driver pulls a summary at the end of the run.
pub struct CrossingMonitor {
    records: Mutex<Vec<CrossingRecord>>,
}

impl CrossingMonitor {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn record(&self, record: CrossingRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregates all records collected so far.
    pub fn summary(&self) -> CrossingSummary {
        let records = self.records.lock().unwrap();
        let total_crossings = records.len();
        let total_wait: u64 = records.iter().map(|r| r.waited_ms).sum();
        let max_wait_ms = records.iter().map(|r| r.waited_ms).max().unwrap_or(0);
        let average_wait_ms = if total_crossings == 0 {
            0.0
        } else {
            total_wait as f64 / total_crossings as f64
        };

        CrossingSummary {
            total_crossings,
            average_wait_ms,
            max_wait_ms,
            timestamp: current_timestamp(),
        }
    }

    /// Appends all collected records to a CSV file, writing a header only
    /// when the file does not exist yet.
    pub fn export_csv(&self, filename: &str) -> Result<(), Box<dyn Error>> {
        let records = self.records.lock().unwrap();
        let file_exists = Path::new(filename).exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(filename)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(!file_exists)
            .from_writer(file);
        for record in records.iter() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for CrossingMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersections::IntersectionId;

    fn record(vehicle_id: u64, waited_ms: u64) -> CrossingRecord {
        CrossingRecord {
            vehicle_id,
            intersection_id: IntersectionId(0),
            waited_ms,
            timestamp: current_timestamp(),
        }
    }

    #[test]
    fn summary_of_empty_monitor_is_zeroed() {
        let monitor = CrossingMonitor::new();
        let summary = monitor.summary();
        assert_eq!(summary.total_crossings, 0);
        assert_eq!(summary.average_wait_ms, 0.0);
        assert_eq!(summary.max_wait_ms, 0);
    }

    #[test]
    fn summary_aggregates_wait_times() {
        let monitor = CrossingMonitor::new();
        monitor.record(record(1, 10));
        monitor.record(record(2, 30));
        monitor.record(record(3, 20));

        let summary = monitor.summary();
        assert_eq!(summary.total_crossings, 3);
        assert_eq!(summary.average_wait_ms, 20.0);
        assert_eq!(summary.max_wait_ms, 30);
    }
}
