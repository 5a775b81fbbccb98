//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! SIGINT / SIGTERM (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → server stops accepting, sampler loop exits
//!     → dispatcher drained for a bounded time
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
