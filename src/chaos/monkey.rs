//! Random failure injection for order creation.

use std::sync::atomic::{AtomicBool, Ordering};

type Draw = Box<dyn Fn() -> f64 + Send + Sync>;

/// Runtime-toggleable failure injector.
pub struct ChaosMonkey {
    enabled: AtomicBool,
    failure_ratio: f64,
    draw: Draw,
}

impl ChaosMonkey {
    pub fn new(enabled: bool, failure_ratio: f64) -> Self {
        Self::with_draw(enabled, failure_ratio, fastrand::f64)
    }

    /// Use `draw` instead of the thread RNG. It must return values in `[0, 1)`.
    pub fn with_draw(
        enabled: bool,
        failure_ratio: f64,
        draw: impl Fn() -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            failure_ratio: failure_ratio.clamp(0.0, 1.0),
            draw: Box::new(draw),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            tracing::info!(enabled, "Chaos toggled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn failure_ratio(&self) -> f64 {
        self.failure_ratio
    }

    /// True when chaos is on and this draw lands under the failure ratio.
    pub fn should_fail(&self) -> bool {
        self.is_enabled() && (self.draw)() < self.failure_ratio
    }
}

impl std::fmt::Debug for ChaosMonkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaosMonkey")
            .field("enabled", &self.is_enabled())
            .field("failure_ratio", &self.failure_ratio)
            .finish()
    }
}
