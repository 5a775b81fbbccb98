//! Periodic host utilization sampling.
//!
//! # Responsibilities
//! - Every period, read CPU load and memory utilization
//! - Push both as gauges
//! - Keep ticking through read or delivery failures

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::metrics::sample::{MetricSample, MetricValue};
use crate::metrics::sender::MetricsSender;
use crate::observability::metrics as local;

pub const CPU: &str = "cpu";
pub const MEMORY: &str = "memory";

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("load average unavailable")]
    LoadAverage,

    #[error("core count unavailable: {0}")]
    Cores(#[source] std::io::Error),

    #[error("memory statistics unavailable: {0}")]
    Memory(#[source] std::io::Error),

    #[error("total memory reported as zero")]
    ZeroMemory,

    #[error("{0} sampling is not supported on this platform")]
    Unsupported(&'static str),
}

/// Source of host utilization figures.
pub trait SystemProbe: Send + Sync {
    /// 1-minute load average per core, as a percentage.
    fn cpu_usage_percentage(&self) -> Result<f64, SamplingError>;

    /// Used memory over total memory, as a percentage.
    fn memory_usage_percentage(&self) -> Result<f64, SamplingError>;
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Load average over core count, as a percentage rounded to two decimals.
pub fn cpu_percentage(load_1m: f64, cores: usize) -> f64 {
    round2(load_1m / cores.max(1) as f64 * 100.0)
}

/// `(total - free) / total` as a percentage rounded to two decimals.
pub fn memory_percentage(total: u64, free: u64) -> Result<f64, SamplingError> {
    if total == 0 {
        return Err(SamplingError::ZeroMemory);
    }
    let used = total.saturating_sub(free);
    Ok(round2(used as f64 / total as f64 * 100.0))
}

/// Reads the running host through libc.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn cpu_usage_percentage(&self) -> Result<f64, SamplingError> {
        let load = load_average_1m()?;
        let cores = std::thread::available_parallelism()
            .map_err(SamplingError::Cores)?
            .get();
        Ok(cpu_percentage(load, cores))
    }

    fn memory_usage_percentage(&self) -> Result<f64, SamplingError> {
        let (total, free) = memory_totals()?;
        memory_percentage(total, free)
    }
}

#[cfg(unix)]
fn load_average_1m() -> Result<f64, SamplingError> {
    let mut loads = [0f64; 3];
    let filled = unsafe { libc::getloadavg(loads.as_mut_ptr(), 3) };
    if filled < 1 {
        return Err(SamplingError::LoadAverage);
    }
    Ok(loads[0])
}

#[cfg(not(unix))]
fn load_average_1m() -> Result<f64, SamplingError> {
    Err(SamplingError::Unsupported("cpu"))
}

#[cfg(target_os = "linux")]
fn memory_totals() -> Result<(u64, u64), SamplingError> {
    let mut info: libc::sysinfo = unsafe { std::mem::zeroed() };
    if unsafe { libc::sysinfo(&mut info) } != 0 {
        return Err(SamplingError::Memory(std::io::Error::last_os_error()));
    }
    let unit = u64::from(info.mem_unit.max(1));
    Ok((info.totalram as u64 * unit, info.freeram as u64 * unit))
}

#[cfg(not(target_os = "linux"))]
fn memory_totals() -> Result<(u64, u64), SamplingError> {
    Err(SamplingError::Unsupported("memory"))
}

/// Background task pushing host gauges on a fixed period.
pub struct SystemSampler {
    sender: MetricsSender,
    probe: Arc<dyn SystemProbe>,
    period: Duration,
}

impl SystemSampler {
    pub fn new(sender: MetricsSender, period: Duration) -> Self {
        Self {
            sender,
            probe: Arc::new(HostProbe),
            period,
        }
    }

    /// Replace the host probe.
    pub fn with_probe(mut self, probe: Arc<dyn SystemProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Take one reading and push whatever could be read.
    pub fn sample_once(&self) -> Vec<MetricSample> {
        let cpu = self
            .probe
            .cpu_usage_percentage()
            .map_err(|e| tracing::warn!(error = %e, "Failed to sample CPU usage"))
            .ok();
        let memory = self
            .probe
            .memory_usage_percentage()
            .map_err(|e| tracing::warn!(error = %e, "Failed to sample memory usage"))
            .ok();
        local::record_host(cpu, memory);

        let samples: Vec<_> = [(CPU, cpu), (MEMORY, memory)]
            .into_iter()
            .filter_map(|(name, value)| {
                value.map(|v| MetricSample::gauge(name, MetricValue::Double(v), "%"))
            })
            .collect();

        for sample in &samples {
            self.sender.send(sample.clone());
        }
        samples
    }

    /// Tick until shutdown. The first reading is taken one period after start.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(period_secs = self.period.as_secs_f64(), "System sampler starting");

        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let samples = self.sample_once();
                    tracing::debug!(pushed = samples.len(), "System sample taken");
                }
                _ = shutdown.recv() => {
                    tracing::info!("System sampler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
