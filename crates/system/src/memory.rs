use std::sync::{Mutex, PoisonError};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

const MIB: u64 = 1 << 20;

/// Source of the resident memory footprint of the current process.
///
/// Implementations must not panic and should return quickly; `None` signals
/// that the OS could not be queried.
pub trait MemoryProbe: Send + Sync + std::fmt::Debug {
    /// Resident set size in bytes.
    fn resident_bytes(&self) -> Option<u64>;
}

/// Probe backed by `sysinfo`, refreshing only this process's memory counters.
pub struct ProcessMemoryProbe {
    pid:    Option<Pid>,
    system: Mutex<System>,
}

impl std::fmt::Debug for ProcessMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessMemoryProbe")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Cannot resolve current pid; memory will read as 0: {e}");
                None
            }
        };

        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);

        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(pid).map(sysinfo::Process::memory)
    }
}

/// Probe that always reports the same reading.
///
/// Useful for exercising threshold logic without depending on the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMemoryProbe {
    bytes: Option<u64>,
}

impl FixedMemoryProbe {
    pub fn bytes(bytes: u64) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// A probe reporting `mb` megabytes.
    pub fn megabytes(mb: f64) -> Self {
        Self::bytes((mb.max(0.0) * MIB as f64) as u64)
    }

    /// A probe whose every query fails.
    pub fn failing() -> Self {
        Self { bytes: None }
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        self.bytes
    }
}

/// Convert a byte count to (binary) megabytes.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

/// Format a byte count as a human-readable string (e.g. `"7.3 GiB"`).
pub fn format_bytes(bytes: u64) -> String {
    const GIB: u64 = 1 << 30;
    const KIB: u64 = 1 << 10;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
