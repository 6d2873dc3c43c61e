//! Latest-wins frame slot
//!
//! A depth-1 buffer between frame acquisition and the pipeline. Publishing
//! while a frame is still pending replaces it, so the pipeline always works
//! on the newest frame and never builds a backlog.

use parking_lot::Mutex;
use theralink_core::{TheraLinkError, TheraLinkResult};
use tokio::sync::Notify;
use tracing::trace;

struct SlotState<T> {
    pending: Option<T>,
    closed: bool,
    published: u64,
    dropped: u64,
}

/// Single-item handoff where newer items overwrite older ones
pub struct FrameSlot<T> {
    state: Mutex<SlotState<T>>,
    notify: Notify,
}

impl<T> FrameSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                pending: None,
                closed: false,
                published: 0,
                dropped: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Store an item, replacing any unconsumed one
    ///
    /// Returns `true` if an older item was discarded.
    pub fn publish(&self, item: T) -> TheraLinkResult<bool> {
        let displaced = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(TheraLinkError::PipelineClosed);
            }
            state.published += 1;
            let displaced = state.pending.replace(item).is_some();
            if displaced {
                state.dropped += 1;
            }
            displaced
        };

        if displaced {
            trace!("frame superseded before processing");
        }
        self.notify.notify_one();
        Ok(displaced)
    }

    /// Take the pending item without waiting
    pub fn try_take(&self) -> Option<T> {
        self.state.lock().pending.take()
    }

    /// Wait for the next item; `None` once closed and drained
    ///
    /// Cancel safe: an item is only removed in the poll that returns it.
    pub async fn take(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock();
                if let Some(item) = state.pending.take() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Reject further items and wake any waiter
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Items ever published
    pub fn published(&self) -> u64 {
        self.state.lock().published
    }

    /// Items overwritten before being taken
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
