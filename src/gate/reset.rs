/*
 * The reset request, posted from the reset button's interrupt handler and
 * consumed by the reset coordinator.
 *
 * The signal holds at most one pending request. Pressing reset twice before
 * the coordinator gets to run results in a single reset.
 */

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};

pub struct ResetSignal {
    pending: Signal<CriticalSectionRawMutex, ()>,
}

impl ResetSignal {
    pub const fn new() -> Self {
        ResetSignal {
            pending: Signal::new(),
        }
    }

    /// Post a reset request. Never blocks, safe to call from an interrupt
    /// handler. Posting wakes the waiting coordinator.
    pub fn trigger(&self) {
        self.pending.signal(());
    }

    /// Wait for a reset request and consume it.
    pub async fn wait(&self) {
        self.pending.wait().await
    }

    pub fn is_pending(&self) -> bool {
        self.pending.signaled()
    }

    /// Drop a pending request without acting on it.
    pub fn clear(&self) {
        self.pending.reset();
    }
}

impl Default for ResetSignal {
    fn default() -> Self {
        Self::new()
    }
}
