// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PrintBridge Print: upload store, render surface lifecycle and the print
// job state machine. This crate sits between the HTTP surface in
// `printbridge-server` and the host capability in `printbridge-host`.

pub mod history;
pub mod latch;
pub mod orchestrator;
pub mod store;
pub mod surface;

pub use history::JobHistory;
pub use latch::{ResolutionLatch, SignalLatch};
pub use orchestrator::{OrchestratorSettings, PrintOrchestrator};
pub use store::{StoredFile, UploadEntry, UploadStore, hash_bytes, spawn_sweeper};
pub use surface::{SurfaceLease, SurfacePool, SurfaceStats};
