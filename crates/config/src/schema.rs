use perfwatch_core::{PerfError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure parsed from `perfwatch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfwatchConfig {
    /// Ring, cache and threshold settings for the telemetry monitor.
    pub monitor: MonitorConfig,
    /// Settings for the simulated render loop in the `perfwatch` binary.
    pub harness: HarnessConfig,
}

impl PerfwatchConfig {
    pub fn validate(&self) -> Result<()> {
        self.monitor.validate()?;
        self.harness.validate()
    }
}

/// Construction parameters for a performance monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Number of frame timestamps the ring keeps.
    pub capacity: usize,
    /// How many of the most recent frames feed the FPS figure.
    pub sample_window: usize,
    /// Maximum age of a cached FPS reading (milliseconds).
    pub fps_ttl_ms: u64,
    /// Maximum age of a cached memory reading (milliseconds).
    pub memory_ttl_ms: u64,
    /// Maximum age of a cached degradation verdict (milliseconds).
    pub degraded_ttl_ms: u64,
    /// Frame rates strictly below this count as degraded.
    pub fps_floor: f64,
    /// Resident memory strictly above this (MB) counts as degraded.
    pub memory_ceiling_mb: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            capacity:          120,
            sample_window:     10,
            fps_ttl_ms:        100,
            memory_ttl_ms:     500,
            degraded_ttl_ms:   500,
            fps_floor:         30.0,
            memory_ceiling_mb: 500.0,
        }
    }
}

fn whole_millis_ceil(d: Duration) -> u64 {
    u64::try_from(d.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

impl MonitorConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_sample_window(mut self, sample_window: usize) -> Self {
        self.sample_window = sample_window;
        self
    }

    /// Sub-millisecond remainders round up to the next millisecond.
    pub fn with_fps_ttl(mut self, ttl: Duration) -> Self {
        self.fps_ttl_ms = whole_millis_ceil(ttl);
        self
    }

    /// Sub-millisecond remainders round up to the next millisecond.
    pub fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory_ttl_ms = whole_millis_ceil(ttl);
        self
    }

    /// Sub-millisecond remainders round up to the next millisecond.
    pub fn with_degraded_ttl(mut self, ttl: Duration) -> Self {
        self.degraded_ttl_ms = whole_millis_ceil(ttl);
        self
    }

    pub fn with_fps_floor(mut self, fps_floor: f64) -> Self {
        self.fps_floor = fps_floor;
        self
    }

    pub fn with_memory_ceiling_mb(mut self, memory_ceiling_mb: f64) -> Self {
        self.memory_ceiling_mb = memory_ceiling_mb;
        self
    }

    pub fn fps_ttl(&self) -> Duration {
        Duration::from_millis(self.fps_ttl_ms)
    }

    pub fn memory_ttl(&self) -> Duration {
        Duration::from_millis(self.memory_ttl_ms)
    }

    pub fn degraded_ttl(&self) -> Duration {
        Duration::from_millis(self.degraded_ttl_ms)
    }

    /// Reject parameters that would make the monitor meaningless.
    ///
    /// This is the only place a monitor can fail; everything after
    /// construction degrades to sentinel values instead.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PerfError::misconfigured("capacity", "must be greater than zero"));
        }
        if self.sample_window == 0 {
            return Err(PerfError::misconfigured("sample_window", "must be greater than zero"));
        }
        for (field, ttl) in [
            ("fps_ttl_ms", self.fps_ttl_ms),
            ("memory_ttl_ms", self.memory_ttl_ms),
            ("degraded_ttl_ms", self.degraded_ttl_ms),
        ] {
            if ttl == 0 {
                return Err(PerfError::misconfigured(field, "must be greater than zero"));
            }
        }
        if !self.fps_floor.is_finite() || self.fps_floor < 0.0 {
            return Err(PerfError::misconfigured(
                "fps_floor",
                format!("must be a finite, non-negative number (got {})", self.fps_floor),
            ));
        }
        if !self.memory_ceiling_mb.is_finite() || self.memory_ceiling_mb < 0.0 {
            return Err(PerfError::misconfigured(
                "memory_ceiling_mb",
                format!(
                    "must be a finite, non-negative number (got {})",
                    self.memory_ceiling_mb
                ),
            ));
        }
        Ok(())
    }
}

/// Simulated render loop driven by the `perfwatch` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Frames the producer thread tries to record per second.
    pub target_fps: f64,
    /// How often the monitoring task polls a snapshot (milliseconds).
    pub poll_interval_ms: u64,
    /// Stall the producer every N frames.  `0` disables stalls.
    pub stall_every: u64,
    /// Length of each stall (milliseconds).
    pub stall_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_fps:       60.0,
            poll_interval_ms: 1_000,
            stall_every:      0,
            stall_ms:         0,
        }
    }
}

impl HarnessConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_fps.is_finite() || self.target_fps <= 0.0 {
            return Err(PerfError::misconfigured(
                "target_fps",
                format!("must be a positive number (got {})", self.target_fps),
            ));
        }
        if Duration::try_from_secs_f64(1.0 / self.target_fps).is_err() {
            return Err(PerfError::misconfigured(
                "target_fps",
                format!("frame interval of 1/{} s is out of range", self.target_fps),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(PerfError::misconfigured("poll_interval_ms", "must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_field(config: &MonitorConfig) -> &'static str {
        match config.validate() {
            Err(PerfError::Misconfiguration { field, .. }) => field,
            other => panic!("expected misconfiguration, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = PerfwatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.capacity, 120);
        assert_eq!(config.monitor.sample_window, 10);
        assert_eq!(config.monitor.fps_ttl(), Duration::from_millis(100));
        assert_eq!(config.monitor.memory_ttl(), Duration::from_millis(500));
        assert_eq!(config.monitor.degraded_ttl(), Duration::from_millis(500));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = MonitorConfig::default().with_capacity(0);
        assert_eq!(rejected_field(&config), "capacity");
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = MonitorConfig::default().with_sample_window(0);
        assert_eq!(rejected_field(&config), "sample_window");
    }

    #[test]
    fn zero_ttls_are_rejected() {
        let fps = MonitorConfig::default().with_fps_ttl(Duration::ZERO);
        assert_eq!(rejected_field(&fps), "fps_ttl_ms");

        let memory = MonitorConfig::default().with_memory_ttl(Duration::ZERO);
        assert_eq!(rejected_field(&memory), "memory_ttl_ms");

        let degraded = MonitorConfig::default().with_degraded_ttl(Duration::ZERO);
        assert_eq!(rejected_field(&degraded), "degraded_ttl_ms");
    }

    #[test]
    fn sub_millisecond_ttls_round_up() {
        let config = MonitorConfig::default()
            .with_fps_ttl(Duration::from_micros(1_900))
            .with_memory_ttl(Duration::from_micros(10))
            .with_degraded_ttl(Duration::from_millis(250));

        assert_eq!(config.fps_ttl_ms, 2);
        assert_eq!(config.memory_ttl_ms, 1);
        assert_eq!(config.degraded_ttl_ms, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_finite_thresholds_are_rejected() {
        let floor = MonitorConfig::default().with_fps_floor(f64::NAN);
        assert_eq!(rejected_field(&floor), "fps_floor");

        let ceiling = MonitorConfig::default().with_memory_ceiling_mb(-1.0);
        assert_eq!(rejected_field(&ceiling), "memory_ceiling_mb");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: PerfwatchConfig = toml::from_str(
            r#"
            [monitor]
            capacity = 240
            fps_floor = 55.0

            [harness]
            stall_every = 30
            stall_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.capacity, 240);
        assert_eq!(config.monitor.fps_floor, 55.0);
        assert_eq!(config.monitor.sample_window, 10);
        assert_eq!(config.harness.stall_every, 30);
        assert_eq!(config.harness.target_fps, 60.0);
    }

    #[test]
    fn harness_rejects_zero_fps() {
        let harness = HarnessConfig {
            target_fps: 0.0,
            ..HarnessConfig::default()
        };
        assert!(harness.validate().is_err());
    }

    #[test]
    fn harness_rejects_unrepresentable_frame_interval() {
        let harness = HarnessConfig {
            target_fps: 1e-20,
            ..HarnessConfig::default()
        };
        assert!(matches!(
            harness.validate(),
            Err(PerfError::Misconfiguration { field: "target_fps", .. })
        ));
    }

    #[test]
    fn harness_accepts_slow_but_representable_rate() {
        let harness = HarnessConfig {
            target_fps: 0.5,
            ..HarnessConfig::default()
        };
        assert!(harness.validate().is_ok());
        assert_eq!(harness.frame_interval(), Duration::from_secs(2));
    }
}
