//! Scheduler timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing policy for the capture-and-validate loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Timer period while the camera is active.
    pub tick_period_ms: u64,
    /// Minimum time between two dispatched attempts, independent of the
    /// tick period.
    pub min_gap_ms: u64,
    /// Delay between an admitted tick and the capture, leaving the
    /// current video rendering pass alone.
    pub capture_delay_ms: u64,
    /// How long a granted result stays displayed.
    pub success_reset_ms: u64,
    /// Show `Processing` while a request is outstanding.
    pub show_processing: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 5000,
            min_gap_ms: 3000,
            capture_delay_ms: 50,
            success_reset_ms: 3000,
            show_processing: false,
        }
    }
}

impl SchedulerConfig {
    /// Timer period.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Minimum spacing between attempts.
    pub fn min_gap(&self) -> Duration {
        Duration::from_millis(self.min_gap_ms)
    }

    /// Delay from an admitted tick to the capture.
    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    /// Display time of a granted result.
    pub fn success_reset(&self) -> Duration {
        Duration::from_millis(self.success_reset_ms)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), SchedulerConfigError> {
        if self.tick_period_ms == 0 {
            return Err(SchedulerConfigError::ZeroTickPeriod);
        }
        if self.capture_delay_ms >= self.tick_period_ms {
            return Err(SchedulerConfigError::CaptureDelayTooLong);
        }
        Ok(())
    }
}

/// Scheduler configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerConfigError {
    #[error("tick period must be greater than zero")]
    /// `tick_period_ms` is zero.
    ZeroTickPeriod,
    #[error("capture delay must be shorter than the tick period")]
    /// `capture_delay_ms` is not shorter than the tick period.
    CaptureDelayTooLong,
}
