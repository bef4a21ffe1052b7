//! Frame-rate derivation over a short recency window.
//!
//! A window of a handful of frames reacts to fresh jank within a few frames
//! while still averaging over several intervals, so one late frame does not
//! dominate the figure the way a single last-delta reading would.

use crate::ring::FrameRing;

/// Frames considered when no window is configured.
pub const DEFAULT_SAMPLE_WINDOW: usize = 10;

/// Frames per second across the `window` most recent samples of `ring`.
///
/// Returns `0.0` with fewer than two samples, or when the samples don't
/// span a positive amount of time.
pub fn fps_over_window(ring: &FrameRing, window: usize) -> f64 {
    let Some((first, last, available)) = ring.window_bounds(window) else {
        return 0.0;
    };
    if available < 2 {
        return 0.0;
    }

    let elapsed = last - first;
    if elapsed <= 0.0 || !elapsed.is_finite() {
        return 0.0;
    }
    (available - 1) as f64 / elapsed
}
