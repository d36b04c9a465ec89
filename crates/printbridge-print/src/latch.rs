// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-resolution latches.
//
// A rendering host can report both a failure and a stale success for the same
// surface. Whatever arrives first wins; everything after it is observed and
// dropped.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::oneshot;

/// Atomic "already resolved" flag.
#[derive(Debug, Default)]
pub struct SignalLatch {
    fired: AtomicBool,
}

impl SignalLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set. Returns true for exactly one caller.
    pub fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Write-once result cell.
///
/// The first [`resolve`](Self::resolve) delivers its value to the paired
/// receiver; later calls return false and their value is discarded.
#[derive(Debug)]
pub struct ResolutionLatch<T> {
    latch: SignalLatch,
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> ResolutionLatch<T> {
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                latch: SignalLatch::new(),
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Deliver `value` if nothing was delivered before.
    ///
    /// Returns true when this call resolved the latch, even if the receiver
    /// has already gone away.
    pub fn resolve(&self, value: T) -> bool {
        if !self.latch.try_fire() {
            return false;
        }
        let sender = self.sender.lock().expect("latch lock poisoned").take();
        if let Some(tx) = sender {
            let _ = tx.send(value);
        }
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.latch.is_fired()
    }
}
