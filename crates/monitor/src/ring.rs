//! Fixed-capacity store of frame timestamps.
//!
//! The backing slice is allocated once at construction; recording a frame
//! only writes a slot and bumps two indices.

use perfwatch_core::{PerfError, Result};

/// Ring of the last `capacity` frame timestamps (seconds).
///
/// `write_index` is the next slot to overwrite and `recorded` saturates at
/// `capacity`.  Together they locate the valid samples: the newest lives at
/// `write_index - 1` and the oldest `recorded - 1` slots before it, all
/// modulo `capacity`.
#[derive(Debug, Clone)]
pub struct FrameRing {
    slots:       Box<[f64]>,
    write_index: usize,
    recorded:    usize,
}

impl FrameRing {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PerfError::misconfigured("capacity", "must be greater than zero"));
        }
        Ok(Self {
            slots:       vec![0.0; capacity].into_boxed_slice(),
            write_index: 0,
            recorded:    0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of valid samples, at most [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        self.recorded
    }

    pub fn is_empty(&self) -> bool {
        self.recorded == 0
    }

    /// Store `timestamp`, overwriting the oldest sample once full.
    pub fn push(&mut self, timestamp: f64) {
        let capacity = self.slots.len();
        self.slots[self.write_index] = timestamp;
        self.write_index = (self.write_index + 1) % capacity;
        if self.recorded < capacity {
            self.recorded += 1;
        }
    }

    pub fn clear(&mut self) {
        self.write_index = 0;
        self.recorded = 0;
    }

    fn last_index(&self) -> usize {
        let capacity = self.slots.len();
        (self.write_index + capacity - 1) % capacity
    }

    fn first_index(&self, available: usize) -> usize {
        let capacity = self.slots.len();
        (self.last_index() + capacity - (available - 1)) % capacity
    }

    /// Oldest and newest timestamps of the `k` most recent samples, plus how
    /// many samples that window actually spans.  `None` when empty or `k == 0`.
    ///
    /// Allocation-free; this is what the FPS calculation reads.
    pub fn window_bounds(&self, k: usize) -> Option<(f64, f64, usize)> {
        let available = k.min(self.recorded);
        if available == 0 {
            return None;
        }
        let first = self.slots[self.first_index(available)];
        let last = self.slots[self.last_index()];
        Some((first, last, available))
    }

    /// Up to `k` most recent samples, oldest first.
    pub fn recent(&self, k: usize) -> Vec<f64> {
        let available = k.min(self.recorded);
        if available == 0 {
            return Vec::new();
        }
        let capacity = self.slots.len();
        let first = self.first_index(available);
        (0..available)
            .map(|offset| self.slots[(first + offset) % capacity])
            .collect()
    }
}
