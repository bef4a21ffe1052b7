//! OS-level probes for the current process.

pub mod memory;

pub use memory::{bytes_to_mb, format_bytes, FixedMemoryProbe, MemoryProbe, ProcessMemoryProbe};
