// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub host for machines without a printing subsystem.
//
// Every operation fails; the service still starts so uploads and the
// heartbeat keep working.

use std::sync::Arc;

use async_trait::async_trait;

use printbridge_core::error::{PrintBridgeError, Result};
use printbridge_core::types::SurfaceId;

use crate::traits::*;

/// No-op host returned when no printing subsystem was found.
pub struct StubHost;

impl RenderHost for StubHost {
    fn host_name(&self) -> &str {
        "stub"
    }

    fn open_surface(&self, id: SurfaceId) -> Result<Arc<dyn HostSurface>> {
        tracing::warn!(surface_id = %id, "RenderHost::open_surface called on stub host");
        Err(PrintBridgeError::SurfaceUnavailable(
            "no printing subsystem on this machine".into(),
        ))
    }
}

#[async_trait]
impl PrinterCatalog for StubHost {
    async fn list_printers(&self) -> Result<Vec<String>> {
        tracing::warn!("PrinterCatalog::list_printers called on stub host");
        Err(PrintBridgeError::CatalogUnavailable(
            "no printing subsystem on this machine".into(),
        ))
    }
}
