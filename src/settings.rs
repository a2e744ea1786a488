use std::time::Duration;

/// Runner configuration options
#[derive(Clone, Debug)]
pub struct ComputerSettings {
    /// Instructions executed while holding the computer lock. The default
    /// approximates a 3 MHz K1801VM1 over one slice period
    pub instructions_per_slice: usize,

    /// Wall time each slice is paced to
    pub slice_period: Duration,

    /// How often throughput metrics are logged
    pub metrics_period: Duration,

    /// Start executing right away instead of waiting for `resume`
    pub start_running: bool,
}

pub const DEFAULT_INSTRUCTIONS_PER_SLICE: usize = 3000;
pub const DEFAULT_SLICE_PERIOD: Duration = Duration::from_millis(10);
pub const DEFAULT_METRICS_PERIOD: Duration = Duration::from_secs(5);

impl Default for ComputerSettings {
    fn default() -> Self {
        Self {
            instructions_per_slice: DEFAULT_INSTRUCTIONS_PER_SLICE,
            slice_period: DEFAULT_SLICE_PERIOD,
            metrics_period: DEFAULT_METRICS_PERIOD,
            start_running: true,
        }
    }
}
