// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! PrintBridge: host render/print capability.
//!
//! Defines the trait seam between the print orchestrator and whatever can
//! actually load a document and queue it on an OS printer, plus the
//! implementations shipped with the service.

pub mod scripted;
pub mod stub;
pub mod traits;

#[cfg(unix)]
pub mod cups;

use std::sync::Arc;

pub use scripted::{LoadScript, RecordedPrint, ScriptedHost};
pub use stub::StubHost;
pub use traits::{
    HostSurface, PrintOutcome, PrinterCatalog, RenderHost, SignalSender, SurfaceSignal,
};

/// Pick the host implementation for this machine.
///
/// On Unix the CUPS client tools are used when `lp` is on the `PATH`;
/// otherwise a stub host is returned so the service can still accept uploads.
pub fn render_host() -> Arc<dyn RenderHost> {
    #[cfg(unix)]
    {
        if find_on_path("lp").is_some() {
            tracing::info!("using CUPS render host");
            return Arc::new(cups::CupsHost::new());
        }
        tracing::warn!("`lp` not found on PATH, printing disabled");
    }
    Arc::new(stub::StubHost)
}

/// Locate an executable on the `PATH`.
pub fn find_on_path(program: &str) -> Option<std::path::PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
