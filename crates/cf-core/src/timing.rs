//! Lightweight performance timing.
//!
//! A scoped timer that reports elapsed wall time through `tracing` when
//! dropped. Gated behind the `CF_TIMING` environment variable so production
//! runs pay nothing beyond one env lookup per timer.

use std::time::Instant;

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    std::env::var_os("CF_TIMING").is_some()
}

/// Scoped timer: emits an `info` event with the elapsed seconds on drop.
pub struct ScopedTimer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl ScopedTimer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Elapsed time in seconds, regardless of whether timing is enabled.
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if self.enabled {
            tracing::info!(label = self.label, elapsed_s = self.elapsed(), "timing");
        }
    }
}
