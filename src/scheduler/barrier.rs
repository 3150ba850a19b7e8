//! Counting join barrier.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Releases waiters once a known number of arrivals has been counted.
///
/// Every `arrive` is a Release and `wait` observes the count with Acquire,
/// so anything a task wrote before arriving is visible after `wait` returns.
/// A barrier expecting zero arrivals is released from the start.
#[derive(Debug)]
pub struct JoinBarrier {
    expected: usize,
    arrived: AtomicUsize,
    notify: Notify,
}

impl JoinBarrier {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            arrived: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Number of arrivals so far.
    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.arrived() >= self.expected
    }

    /// Count one terminal write. Returns the arrival count including this one.
    pub fn arrive(&self) -> usize {
        let count = self.arrived.fetch_add(1, Ordering::AcqRel) + 1;
        if count == self.expected {
            self.notify.notify_waiters();
        }
        count
    }

    /// Wait until every expected arrival has happened.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a release in between is not missed.
            let notified = self.notify.notified();
            if self.is_released() {
                return;
            }
            notified.await;
        }
    }
}
