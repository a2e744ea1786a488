//! This module provides a way to gather throughput metrics for the runner
//!

use std::time::Duration;
use std::time::Instant;

use log::debug;

#[derive(Debug)]
struct RawMetrics {
    record_start: Instant,
    instructions_executed: usize,
}

#[derive(Debug)]
pub struct Metrics {
    pub recorded_time: Duration,
    pub instructions_per_second: usize,
}

pub struct Collector {
    collecting: RawMetrics,
}

impl Collector {
    pub fn new() -> Self {
        Self {
            collecting: RawMetrics {
                record_start: Instant::now(),
                instructions_executed: 0,
            },
        }
    }

    pub fn collect(&mut self) -> Metrics {
        debug!("Raw metrics: {:?}", self.collecting);
        let recorded_time = self.collecting.record_start.elapsed();
        let micros = recorded_time.as_micros().max(1);
        let instructions_per_second =
            (self.collecting.instructions_executed as u128) * 1_000_000 / micros;

        let metrics = Metrics {
            recorded_time,
            instructions_per_second: instructions_per_second as usize,
        };

        self.collecting.record_start = Instant::now();
        self.collecting.instructions_executed = 0;

        metrics
    }

    pub fn observe_instructions(&mut self, count: usize) {
        self.collecting.instructions_executed += count;
    }

    pub fn elapsed(&self) -> Duration {
        self.collecting.record_start.elapsed()
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}
