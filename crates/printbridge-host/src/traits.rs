// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the host render/print capability.
//
// The orchestrator never talks to CUPS (or anything else) directly. It holds
// an `Arc<dyn RenderHost>` handed to it at construction, so tests and other
// platforms can substitute their own host.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use printbridge_core::error::Result;
use printbridge_core::types::{DocumentUrl, PrintRequest, SurfaceId};

/// Unified host capability: printer enumeration plus render surfaces.
pub trait RenderHost: PrinterCatalog + Send + Sync {
    /// Human-readable host name (e.g. "CUPS", "scripted").
    fn host_name(&self) -> &str;

    /// Allocate a fresh, hidden render surface. Never returns a reused one.
    fn open_surface(&self, id: SurfaceId) -> Result<Arc<dyn HostSurface>>;
}

/// One-shot printer enumeration.
#[async_trait]
pub trait PrinterCatalog: Send + Sync {
    /// Names of the printers the host can submit to.
    ///
    /// Fails with `CatalogUnavailable` while the host is not initialised.
    async fn list_printers(&self) -> Result<Vec<String>>;
}

/// An isolated context that loads one document and prints it.
#[async_trait]
pub trait HostSurface: Send + Sync {
    /// Start loading `document`. Returns immediately; the outcome arrives on
    /// `signals`. A misbehaving host may send more than one signal.
    fn load(&self, document: &DocumentUrl, signals: SignalSender);

    /// Submit the loaded document to the printing subsystem. Resolves once,
    /// when the subsystem has accepted or refused the job.
    async fn print(&self, request: &PrintRequest) -> PrintOutcome;

    /// Tear the surface down. Calling it twice is harmless.
    fn close(&self);
}

/// Load-completion signals emitted by a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceSignal {
    LoadFinished,
    LoadFailed { code: i32, description: String },
}

/// Channel a surface reports its load signals on.
pub type SignalSender = mpsc::UnboundedSender<SurfaceSignal>;

/// Verdict of the printing subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    /// Accepted; the subsystem owns the physical job from here.
    Submitted,
    /// Refused, with the subsystem's reason if it gave one.
    Failed(Option<String>),
}
