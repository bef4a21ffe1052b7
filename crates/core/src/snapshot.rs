use chrono::{DateTime, Local};

/// A point-in-time reading of every derived metric.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfSnapshot {
    /// Frames per second over the most recent sample window.
    pub fps: f64,
    /// Resident memory of this process in megabytes.
    pub memory_mb: f64,
    /// Whether either metric crossed its threshold.
    pub degraded: bool,
    /// Valid frames currently held by the ring (saturates at capacity).
    pub recorded_frames: usize,
    /// Wall-clock time the snapshot was assembled.
    pub taken_at: DateTime<Local>,
}

impl PerfSnapshot {
    /// Assemble a snapshot stamped with the current local time.
    pub fn new(fps: f64, memory_mb: f64, degraded: bool, recorded_frames: usize) -> Self {
        Self {
            fps,
            memory_mb,
            degraded,
            recorded_frames,
            taken_at: Local::now(),
        }
    }

    /// Average frame time in milliseconds, or `0.0` when no rate is known.
    #[must_use]
    pub fn frame_time_ms(&self) -> f64 {
        if self.fps <= 0.0 {
            return 0.0;
        }
        1000.0 / self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(fps: f64) -> PerfSnapshot {
        PerfSnapshot::new(fps, 0.0, false, 0)
    }

    #[test]
    fn frame_time_from_fps() {
        assert!((snapshot(50.0).frame_time_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn frame_time_zero_without_rate() {
        assert_eq!(snapshot(0.0).frame_time_ms(), 0.0);
    }
}
