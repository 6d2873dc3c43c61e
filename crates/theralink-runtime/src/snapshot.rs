//! Snapshot publication
//!
//! The pipeline task is the only writer. Readers (UI polling loops, HTTP
//! handlers) get a shared `Arc` of the latest complete value and never see
//! a half-updated one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Atomically swapped latest value
pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
    version: AtomicU64,
}

impl<T> SnapshotCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            version: AtomicU64::new(0),
        }
    }

    /// Replace the published value
    pub fn publish(&self, value: T) {
        let value = Arc::new(value);
        *self.current.write() = value;
        self.version.fetch_add(1, Ordering::Release);
    }

    pub fn latest(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Number of publications so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}
