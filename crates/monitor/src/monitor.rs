use crate::cache::TtlCache;
use crate::fps::fps_over_window;
use crate::ring::FrameRing;
use perfwatch_config::MonitorConfig;
use perfwatch_core::{Clock, MonotonicClock, PerfSnapshot, Result};
use perfwatch_system::{bytes_to_mb, MemoryProbe, ProcessMemoryProbe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::{debug, trace, warn};

/// Live frame-rate and memory telemetry for one render loop.
///
/// One producer calls [`record_frame`](Self::record_frame) per frame; any
/// number of threads may read [`current_fps`](Self::current_fps),
/// [`memory_usage_mb`](Self::memory_usage_mb) and
/// [`is_degraded`](Self::is_degraded) concurrently.
///
/// Each derived value is cached for its own TTL.  Recording a frame does not
/// invalidate the FPS cache: a reading may lag the newest frames by up to
/// `fps_ttl`, which caps how often the ring is rescanned under heavy polling.
///
/// Nothing here returns an error after construction.  Too few frames read as
/// `0.0` FPS and a failed memory query reads as `0.0` MB.  No threads or
/// timers are started.
#[derive(Debug)]
pub struct PerformanceMonitor {
    config:   MonitorConfig,
    clock:    Arc<dyn Clock>,
    probe:    Arc<dyn MemoryProbe>,
    frames:   RwLock<FrameRing>,
    fps:      TtlCache<f64>,
    memory:   TtlCache<f64>,
    degraded: TtlCache<bool>,
}

impl PerformanceMonitor {
    /// Build a monitor on the process clock and the OS memory probe.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Self::with_parts(
            config,
            Arc::new(MonotonicClock::new()),
            Arc::new(ProcessMemoryProbe::new()),
        )
    }

    /// Build a monitor with an explicit time source and memory probe.
    ///
    /// Fails with a misconfiguration error if any size, window or TTL is zero.
    pub fn with_parts(
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Result<Self> {
        config.validate()?;
        let frames = FrameRing::new(config.capacity)?;

        debug!(
            capacity = config.capacity,
            sample_window = config.sample_window,
            fps_ttl_ms = config.fps_ttl_ms,
            memory_ttl_ms = config.memory_ttl_ms,
            degraded_ttl_ms = config.degraded_ttl_ms,
            fps_floor = config.fps_floor,
            memory_ceiling_mb = config.memory_ceiling_mb,
            "performance monitor created"
        );

        Ok(Self {
            fps: TtlCache::new(config.fps_ttl()),
            memory: TtlCache::new(config.memory_ttl()),
            degraded: TtlCache::new(config.degraded_ttl()),
            frames: RwLock::new(frames),
            config,
            clock,
            probe,
        })
    }

    // ── Producer ──────────────────────────────────────────────────────────────

    /// Record that a frame was produced now.
    pub fn record_frame(&self) {
        // Read the clock under the lock so the ring stays in time order.
        let mut frames = self.frames.write().unwrap_or_else(PoisonError::into_inner);
        frames.push(self.clock.now_secs());
    }

    /// Record a frame at an explicit timestamp (seconds on this monitor's clock).
    ///
    /// Writers are serialized by the ring's write lock.
    pub fn record_frame_at(&self, timestamp: f64) {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(timestamp);
    }

    /// Forget all frames and cached readings.
    pub fn reset(&self) {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.fps.invalidate();
        self.memory.invalidate();
        self.degraded.invalidate();
        debug!("performance monitor reset");
    }

    // ── Readers ───────────────────────────────────────────────────────────────

    fn frames(&self) -> RwLockReadGuard<'_, FrameRing> {
        self.frames.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Frames per second over the configured sample window.
    pub fn current_fps(&self) -> f64 {
        self.fps.get_or_refresh(self.clock.as_ref(), || {
            let fps = fps_over_window(&self.frames(), self.config.sample_window);
            trace!(fps, "fps recomputed");
            fps
        })
    }

    /// Resident memory of this process in megabytes.
    pub fn memory_usage_mb(&self) -> f64 {
        self.memory.get_or_refresh(self.clock.as_ref(), || {
            let mb = match self.probe.resident_bytes() {
                Some(bytes) => bytes_to_mb(bytes),
                None => {
                    debug!("memory probe failed; reporting 0 MB");
                    0.0
                }
            };
            trace!(memory_mb = mb, "memory recomputed");
            mb
        })
    }

    /// `true` when FPS is below the floor or memory is above the ceiling.
    pub fn is_degraded(&self) -> bool {
        self.degraded.get_or_refresh(self.clock.as_ref(), || {
            let fps = self.current_fps();
            let memory_mb = self.memory_usage_mb();
            let degraded =
                fps < self.config.fps_floor || memory_mb > self.config.memory_ceiling_mb;
            trace!(fps, memory_mb, degraded, "degradation recomputed");
            degraded
        })
    }

    /// Valid frames currently held, saturating at [`capacity`](Self::capacity).
    pub fn recorded_frames(&self) -> usize {
        self.frames().len()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Up to `k` most recent frame timestamps, oldest first.
    pub fn recent_frames(&self, k: usize) -> Vec<f64> {
        self.frames().recent(k)
    }

    /// Every metric at once, read through the same caches as the getters.
    pub fn snapshot(&self) -> PerfSnapshot {
        PerfSnapshot::new(
            self.current_fps(),
            self.memory_usage_mb(),
            self.is_degraded(),
            self.recorded_frames(),
        )
    }

    // ── Non-blocking variants ─────────────────────────────────────────────────
    //
    // These move the synchronous call onto Tokio's blocking pool and must be
    // awaited inside a Tokio runtime.

    async fn offload<T, F>(self: Arc<Self>, fallback: T, read: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> T + Send + 'static,
    {
        match tokio::task::spawn_blocking(move || read(&self)).await {
            Ok(value) => value,
            Err(e) => {
                warn!("telemetry read failed on blocking pool: {e}");
                fallback
            }
        }
    }

    pub async fn current_fps_async(self: Arc<Self>) -> f64 {
        self.offload(0.0, Self::current_fps).await
    }

    pub async fn memory_usage_mb_async(self: Arc<Self>) -> f64 {
        self.offload(0.0, Self::memory_usage_mb).await
    }

    pub async fn is_degraded_async(self: Arc<Self>) -> bool {
        self.offload(false, Self::is_degraded).await
    }

    /// Snapshot taken on the blocking pool.  A failed read yields an
    /// all-zero, non-degraded snapshot.
    pub async fn snapshot_async(self: Arc<Self>) -> PerfSnapshot {
        self.offload(PerfSnapshot::new(0.0, 0.0, false, 0), Self::snapshot)
            .await
    }
}
