// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded in-memory log of finished jobs. Lost on restart.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use printbridge_core::types::PrintJob;

#[derive(Clone)]
pub struct JobHistory {
    jobs: Arc<Mutex<VecDeque<PrintJob>>>,
    capacity: usize,
}

impl JobHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Remember a finished job, evicting the oldest once full.
    pub fn record(&self, job: PrintJob) {
        if self.capacity == 0 {
            return;
        }
        let mut jobs = self.jobs.lock().expect("history lock poisoned");
        while jobs.len() >= self.capacity {
            jobs.pop_front();
        }
        jobs.push_back(job);
    }

    /// Newest first.
    pub fn recent(&self) -> Vec<PrintJob> {
        let jobs = self.jobs.lock().expect("history lock poisoned");
        jobs.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
