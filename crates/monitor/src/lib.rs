//! Frame-rate and memory telemetry with bounded-staleness caching.
//!
//! [`PerformanceMonitor`] owns a [`FrameRing`] of frame timestamps and three
//! [`TtlCache`]s (FPS, resident memory, degradation verdict).  It is built
//! explicitly by its owner; nothing is global and nothing runs in the
//! background.
//!
//! ```
//! use perfwatch_config::MonitorConfig;
//! use perfwatch_monitor::PerformanceMonitor;
//!
//! let monitor = PerformanceMonitor::new(MonitorConfig::default())?;
//! monitor.record_frame();
//! assert_eq!(monitor.current_fps(), 0.0); // one frame has no rate yet
//! # Ok::<(), perfwatch_core::PerfError>(())
//! ```

pub mod cache;
pub mod fps;
pub mod monitor;
pub mod ring;

pub use cache::TtlCache;
pub use fps::{fps_over_window, DEFAULT_SAMPLE_WINDOW};
pub use monitor::PerformanceMonitor;
pub use ring::FrameRing;
