//! Simulated render loop wired to a [`PerformanceMonitor`].
//!
//! - Producer thread: records frames at the configured rate, with optional stalls
//! - Poll timer: snapshots the monitor off the async runtime and logs it
//! - Config watcher: rebuilds the session when the file changes
//! - Ctrl-C: stops the producer and exits

use anyhow::{Context, Result};
use perfwatch_config::{
    default_path, load as load_config, ConfigWatcher, HarnessConfig, PerfwatchConfig,
};
use perfwatch_monitor::PerformanceMonitor;
use perfwatch_system::format_bytes;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Config location: `$PERFWATCH_CONFIG`, else the XDG default.
fn config_path() -> PathBuf {
    std::env::var_os("PERFWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(default_path)
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One monitor plus the producer thread feeding it.
struct Session {
    config:   PerfwatchConfig,
    monitor:  Arc<PerformanceMonitor>,
    stop:     Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
}

impl Session {
    fn start(config: PerfwatchConfig) -> Result<Self> {
        let monitor = Arc::new(PerformanceMonitor::new(config.monitor.clone())?);
        let stop = Arc::new(AtomicBool::new(false));

        let producer = {
            let monitor = Arc::clone(&monitor);
            let stop = Arc::clone(&stop);
            let harness = config.harness.clone();
            std::thread::Builder::new()
                .name("perfwatch-producer".into())
                .spawn(move || produce(&monitor, &stop, &harness))
                .context("cannot spawn producer thread")?
        };

        info!(
            target_fps = config.harness.target_fps,
            fps_floor = config.monitor.fps_floor,
            memory_ceiling_mb = config.monitor.memory_ceiling_mb,
            "session started"
        );

        Ok(Self {
            config,
            monitor,
            stop,
            producer: Some(producer),
        })
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.producer.take() {
            if handle.join().is_err() {
                error!("producer thread panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Frame loop: record, then sleep until the next frame is due.
fn produce(monitor: &PerformanceMonitor, stop: &AtomicBool, harness: &HarnessConfig) {
    let interval = harness.frame_interval();
    let stall = Duration::from_millis(harness.stall_ms);
    let mut next = Instant::now();
    let mut frame: u64 = 0;

    while !stop.load(Ordering::Acquire) {
        monitor.record_frame();
        frame += 1;

        if harness.stall_every > 0 && frame % harness.stall_every == 0 {
            std::thread::sleep(stall);
        }

        next += interval;
        let now = Instant::now();
        if next > now {
            std::thread::sleep(next - now);
        } else {
            // Fell behind; don't try to catch up with a burst.
            next = now;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

pub async fn run() -> Result<()> {
    let path = config_path();
    let config = load_config(&path)
        .with_context(|| format!("loading config from '{}'", path.display()))?;

    let mut session = Session::start(config)?;
    let (watcher, mut changes) = ConfigWatcher::spawn(&path);

    let mut ticker = tokio::time::interval(session.config.harness.poll_interval());
    let mut was_degraded = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = Arc::clone(&session.monitor).snapshot_async().await;
                let memory = format_bytes((snapshot.memory_mb * (1 << 20) as f64) as u64);

                info!(
                    fps = snapshot.fps,
                    frame_ms = snapshot.frame_time_ms(),
                    memory = %memory,
                    frames = snapshot.recorded_frames,
                    "telemetry"
                );

                match (was_degraded, snapshot.degraded) {
                    (false, true) => warn!(
                        "performance degraded: {:.1} fps, {memory} resident",
                        snapshot.fps
                    ),
                    (true, false) => info!("performance recovered"),
                    _ => {}
                }
                was_degraded = snapshot.degraded;
            }
            Some(()) = changes.recv() => {
                match load_config(watcher.path()) {
                    Ok(cfg) if cfg == session.config => {}
                    Ok(cfg) => match Session::start(cfg) {
                        Ok(next) => {
                            info!("Config reloaded; session restarted");
                            // Replacing drops, and so stops, the old session.
                            session = next;
                            ticker = tokio::time::interval(session.config.harness.poll_interval());
                            was_degraded = false;
                        }
                        Err(e) => warn!("Cannot start session from reloaded config: {e:#}"),
                    },
                    Err(e) => warn!("Config reload failed, keeping current session: {e}"),
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("cannot listen for Ctrl-C: {e}");
                }
                info!("shutting down");
                break;
            }
        }
    }

    session.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_config::MonitorConfig;

    #[test]
    fn producer_feeds_the_monitor_until_stopped() {
        let monitor = Arc::new(PerformanceMonitor::new(MonitorConfig::default()).unwrap());
        let stop = Arc::new(AtomicBool::new(false));
        let harness = HarnessConfig {
            target_fps: 500.0,
            ..HarnessConfig::default()
        };

        let handle = {
            let monitor = Arc::clone(&monitor);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || produce(&monitor, &stop, &harness))
        };
        std::thread::sleep(Duration::from_millis(100));
        stop.store(true, Ordering::Release);
        handle.join().unwrap();

        let frames = monitor.recorded_frames();
        assert!(frames >= 2, "only {frames} frames recorded");
        assert!(monitor.current_fps() > 0.0);
    }
}
