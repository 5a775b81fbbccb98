//! Streaming latency statistics.

/// Running mean and variance over every observation (Welford's algorithm).
///
/// Constant memory regardless of how many requests the process serves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation in.
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean of all observations, 0 before the first.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, 0 with fewer than two observations.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}
