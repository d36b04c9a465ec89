// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PrintBridge server: the HTTP facade business applications talk to, plus
// the service wiring and data directory handling used by the binary.

pub mod api;
pub mod data_dir;
pub mod services;

pub use api::router;
pub use services::AppServices;
