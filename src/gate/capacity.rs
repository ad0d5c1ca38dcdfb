/*
 * The pool of places in the room.
 *
 * Every person inside holds one token, so the number of outstanding tokens is
 * the occupancy count. There is only one value: it is guarded by a critical
 * section and changes exclusively through the conditional transitions below.
 * Acquiring and releasing never wait. A full or empty pool is an answer, not a
 * reason to block.
 *
 * The critical section makes the pool usable from thread mode, from the
 * interrupt executor and from interrupt handlers alike.
 */

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

use crate::config::CAPACITY;

pub struct CapacityPool {
    outstanding: Mutex<CriticalSectionRawMutex, Cell<usize>>,
}

impl CapacityPool {
    /// A pool with no tokens handed out.
    pub const fn new() -> Self {
        CapacityPool {
            outstanding: Mutex::new(Cell::new(0)),
        }
    }

    /*
     * Apply `step` to the outstanding count in one critical section. The
     * count is only written when `step` accepts it.
     */
    fn transition(&self, step: impl FnOnce(usize) -> Option<usize>) -> Option<usize> {
        self.outstanding.lock(|outstanding| {
            let next = step(outstanding.get())?;
            outstanding.set(next);
            Some(next)
        })
    }

    /// Take a token if there is room. Returns the occupancy after admission.
    pub fn admit(&self) -> Option<usize> {
        self.transition(|count| (count < CAPACITY).then_some(count + 1))
    }

    /// Give a token back if any are out. Returns the occupancy after departure.
    pub fn depart(&self) -> Option<usize> {
        self.transition(|count| count.checked_sub(1))
    }

    pub fn try_acquire(&self) -> bool {
        self.admit().is_some()
    }

    pub fn release(&self) -> bool {
        self.depart().is_some()
    }

    /// Release tokens one by one until none are left. Returns how many were
    /// released.
    pub fn drain(&self) -> usize {
        let mut drained = 0;
        while self.release() {
            drained += 1;
        }
        drained
    }

    /// Snapshot of the occupancy. Stale as soon as it is returned, never use
    /// it to decide whether to acquire or release.
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.lock(Cell::get)
    }

    pub const fn capacity(&self) -> usize {
        CAPACITY
    }
}

impl Default for CapacityPool {
    fn default() -> Self {
        Self::new()
    }
}
