use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Watches a config file for changes and sends a notification on every write.
///
/// The parent directory is watched rather than the file itself, so a config
/// that doesn't exist yet is picked up as soon as it is created.  If the
/// parent is missing too, the nearest existing ancestor is watched until the
/// directory chain appears.  Bursts of filesystem events collapse into a
/// single pending notification.
///
/// The watch task lives on the current Tokio runtime and ends as soon as the
/// receiver is dropped.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// use perfwatch_config::ConfigWatcher;
///
/// let (_, mut rx) = ConfigWatcher::spawn("/home/user/.config/perfwatch/perfwatch.toml");
/// while rx.recv().await.is_some() {
///     println!("config changed, rebuilding monitor");
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`.
    /// Returns the watcher handle and a receiver that fires on every detected change.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `true` if `event` is a write or create touching `target`.
fn touches(event: &Event, target: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p.file_name() == target.file_name())
}

/// Deepest existing directory on the way down to `dir` (`dir` itself if present).
fn nearest_existing(dir: &Path) -> PathBuf {
    dir.ancestors()
        .find(|a| !a.as_os_str().is_empty() && a.is_dir())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Queue a change notification.  `false` once the receiver is gone.
fn signal_change(tx: &mpsc::Sender<()>) -> bool {
    match tx.try_send(()) {
        Ok(()) => true,
        Err(TrySendError::Full(())) => {
            debug!("Config change already pending");
            true
        }
        Err(TrySendError::Closed(())) => false,
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<()>) {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (sync_tx, mut sync_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = sync_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    // Until the config directory exists, watch the closest ancestor that does
    // and step down each time a missing level appears.
    let mut watched = nearest_existing(&dir);
    if let Err(e) = watcher.watch(&watched, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", watched.display());
        return;
    }

    if watched == dir {
        info!("Watching config file: {}", path.display());
    } else {
        info!(
            "'{}' does not exist yet; watching '{}' until it appears",
            dir.display(),
            watched.display()
        );
    }

    loop {
        let event = tokio::select! {
            _ = tx.closed() => break,
            event = sync_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("Watcher error: {e}");
                continue;
            }
        };

        if watched != dir {
            let nearer = nearest_existing(&dir);
            if nearer == watched {
                continue;
            }
            if let Err(e) = watcher.unwatch(&watched) {
                debug!("Failed to unwatch '{}': {e}", watched.display());
            }
            if let Err(e) = watcher.watch(&nearer, RecursiveMode::NonRecursive) {
                error!("Failed to watch '{}': {e}", nearer.display());
                return;
            }
            info!("Now watching '{}'", nearer.display());
            watched = nearer;

            // The file may have landed before the new watch was in place.
            if watched == dir && path.exists() && !signal_change(&tx) {
                break;
            }
            continue;
        }

        if touches(&event, &path) && !signal_change(&tx) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn modify_of_target_counts() {
        let target = Path::new("/cfg/perfwatch/perfwatch.toml");
        let e = event(EventKind::Modify(ModifyKind::Any), "/cfg/perfwatch/perfwatch.toml");
        assert!(touches(&e, target));
    }

    #[test]
    fn create_of_target_counts() {
        let target = Path::new("/cfg/perfwatch/perfwatch.toml");
        let e = event(EventKind::Create(CreateKind::File), "/cfg/perfwatch/perfwatch.toml");
        assert!(touches(&e, target));
    }

    #[test]
    fn sibling_files_and_removals_are_ignored() {
        let target = Path::new("/cfg/perfwatch/perfwatch.toml");
        let sibling = event(EventKind::Modify(ModifyKind::Any), "/cfg/perfwatch/other.toml");
        let removed = event(EventKind::Remove(RemoveKind::File), "/cfg/perfwatch/perfwatch.toml");
        assert!(!touches(&sibling, target));
        assert!(!touches(&removed, target));
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "perfwatch-watch-{}-{name}",
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn nearest_existing_steps_down_as_directories_appear() {
        let base = scratch_dir("ancestors");
        let target = base.join("a").join("b");

        assert_eq!(nearest_existing(&target), base);

        std::fs::create_dir(base.join("a")).unwrap();
        assert_eq!(nearest_existing(&target), base.join("a"));

        std::fs::create_dir(&target).unwrap();
        assert_eq!(nearest_existing(&target), target);

        std::fs::remove_dir_all(&base).ok();
    }

    #[tokio::test]
    async fn idle_watch_task_ends_when_receiver_is_dropped() {
        let base = scratch_dir("idle");
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(watch_loop(base.join("perfwatch.toml"), tx));

        drop(rx);
        let finished = tokio::time::timeout(Duration::from_secs(5), task).await;
        assert!(finished.is_ok(), "watch task still running after receiver dropped");

        std::fs::remove_dir_all(&base).ok();
    }
}
