//! Relay load sampling: a bounded sliding window of `(t_real, cpuSeconds, bytes)`
//! used to report a CPU/bandwidth rate over the last second of real time.

use std::collections::VecDeque;

use serde::Serialize;

pub(crate) const DEFAULT_WINDOW_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy)]
struct Sample {
    t_real: f64,
    cpu_seconds: f64,
    bytes: u64,
}

#[derive(Debug, Clone)]
pub struct RelayLoadMonitor {
    window: VecDeque<Sample>,
    capacity: usize,
    peak_cpu_seconds: f64,
    peak_bytes: u64,
}

impl Default for RelayLoadMonitor {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }
}

impl RelayLoadMonitor {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            peak_cpu_seconds: 0.0,
            peak_bytes: 0,
        }
    }

    pub fn record(&mut self, t_real: f64, cpu_seconds: f64, bytes: u64) {
        if self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(Sample {
            t_real,
            cpu_seconds,
            bytes,
        });
        self.peak_cpu_seconds = self.peak_cpu_seconds.max(cpu_seconds);
        self.peak_bytes = self.peak_bytes.max(bytes);
    }

    /// Snapshot the window as observed at real time `now`. The events/bytes
    /// rate is computed over samples within the trailing one second.
    pub fn snapshot(&self, now: f64) -> RelayLoadSnapshot {
        let one_second_ago = now - 1.0;
        let (mut recent_events, mut recent_bytes) = (0u64, 0u64);
        let (mut total_cpu_seconds, mut total_bytes) = (0.0, 0u64);
        for sample in &self.window {
            total_cpu_seconds += sample.cpu_seconds;
            total_bytes += sample.bytes;
            if sample.t_real > one_second_ago {
                recent_events += 1;
                recent_bytes += sample.bytes;
            }
        }
        RelayLoadSnapshot {
            samples_in_window: self.window.len() as u64,
            events_per_second: recent_events as f64,
            bytes_per_second: recent_bytes as f64,
            peak_cpu_seconds: self.peak_cpu_seconds,
            peak_bytes: self.peak_bytes,
            total_cpu_seconds,
            total_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelayLoadSnapshot {
    pub samples_in_window: u64,
    pub events_per_second: f64,
    pub bytes_per_second: f64,
    pub peak_cpu_seconds: f64,
    pub peak_bytes: u64,
    pub total_cpu_seconds: f64,
    pub total_bytes: u64,
}
