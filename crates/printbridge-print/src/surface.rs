// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render surface lifecycle.
//
// Not a pool in the reuse sense: every job gets a brand-new surface, and the
// pool's job is to make sure that surface never outlives its job by more than
// the cleanup grace period. Destruction is idempotent, so the grace timer,
// `shutdown` and a dropped lease can all race to destroy the same surface.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use printbridge_core::error::{PrintBridgeError, Result};
use printbridge_core::types::{DocumentUrl, PrintRequest, SurfaceId};
use printbridge_host::{HostSurface, PrintOutcome, RenderHost, SurfaceSignal};

use crate::latch::SignalLatch;

/// Snapshot of surface bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurfaceStats {
    pub created: usize,
    pub destroyed: usize,
    pub live: usize,
}

/// One surface plus its load-signal latch.
struct SurfaceSlot {
    id: SurfaceId,
    surface: Mutex<Option<Arc<dyn HostSurface>>>,
    latch: SignalLatch,
}

impl SurfaceSlot {
    fn handle(&self) -> Option<Arc<dyn HostSurface>> {
        self.surface.lock().expect("surface lock poisoned").clone()
    }

    fn is_destroyed(&self) -> bool {
        self.surface.lock().expect("surface lock poisoned").is_none()
    }
}

struct PoolInner {
    host: Arc<dyn RenderHost>,
    grace: Duration,
    next_id: AtomicU64,
    live: Mutex<HashMap<SurfaceId, Arc<SurfaceSlot>>>,
    created: AtomicUsize,
    destroyed: AtomicUsize,
    shutting_down: AtomicBool,
}

impl PoolInner {
    /// Close the surface if it is still open. Returns false if it was already gone.
    fn destroy(&self, slot: &SurfaceSlot) -> bool {
        let taken = slot.surface.lock().expect("surface lock poisoned").take();
        let Some(surface) = taken else {
            return false;
        };
        surface.close();
        self.live.lock().expect("pool lock poisoned").remove(&slot.id);
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        debug!(surface_id = %slot.id, "render surface destroyed");
        true
    }

    fn schedule_destroy(self: &Arc<Self>, slot: Arc<SurfaceSlot>) {
        if self.shutting_down.load(Ordering::Acquire) {
            self.destroy(&slot);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let pool = Arc::clone(self);
                let grace = self.grace;
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    if !pool.destroy(&slot) {
                        debug!(surface_id = %slot.id, "cleanup timer defused, surface already gone");
                    }
                });
            }
            // No runtime left to host a timer: tear down now.
            Err(_) => {
                self.destroy(&slot);
            }
        }
    }
}

/// Lifecycle manager for render surfaces. Cheap to clone.
#[derive(Clone)]
pub struct SurfacePool {
    inner: Arc<PoolInner>,
}

impl SurfacePool {
    /// `grace` is how long a retired surface lingers before it is destroyed.
    pub fn new(host: Arc<dyn RenderHost>, grace: Duration) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                host,
                grace,
                next_id: AtomicU64::new(1),
                live: Mutex::new(HashMap::new()),
                created: AtomicUsize::new(0),
                destroyed: AtomicUsize::new(0),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// Allocate a fresh surface for one job.
    pub fn acquire(&self) -> Result<SurfaceLease> {
        if self.inner.shutting_down.load(Ordering::Acquire) {
            return Err(PrintBridgeError::SurfaceUnavailable(
                "service is shutting down".into(),
            ));
        }

        let id = SurfaceId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let surface = self.inner.host.open_surface(id)?;
        let slot = Arc::new(SurfaceSlot {
            id,
            surface: Mutex::new(Some(surface)),
            latch: SignalLatch::new(),
        });
        self.inner
            .live
            .lock()
            .expect("pool lock poisoned")
            .insert(id, Arc::clone(&slot));
        self.inner.created.fetch_add(1, Ordering::SeqCst);
        debug!(surface_id = %id, host = self.inner.host.host_name(), "render surface created");

        Ok(SurfaceLease {
            slot,
            pool: Arc::clone(&self.inner),
            retired: false,
        })
    }

    /// Destroy every live surface immediately. Later grace timers become no-ops
    /// and no new surfaces are handed out.
    pub fn shutdown(&self) -> usize {
        self.inner.shutting_down.store(true, Ordering::Release);
        let slots: Vec<_> = self
            .inner
            .live
            .lock()
            .expect("pool lock poisoned")
            .drain()
            .map(|(_, slot)| slot)
            .collect();
        let count = slots.iter().filter(|slot| self.inner.destroy(slot)).count();
        info!(count, "render surfaces destroyed on shutdown");
        count
    }

    pub fn stats(&self) -> SurfaceStats {
        SurfaceStats {
            created: self.inner.created.load(Ordering::SeqCst),
            destroyed: self.inner.destroyed.load(Ordering::SeqCst),
            live: self.inner.live.lock().expect("pool lock poisoned").len(),
        }
    }

    pub fn grace(&self) -> Duration {
        self.inner.grace
    }
}

/// Exclusive use of one surface for the duration of one job.
///
/// Dropping the lease (or calling [`retire`](Self::retire)) schedules the
/// surface's destruction after the pool's grace period.
pub struct SurfaceLease {
    slot: Arc<SurfaceSlot>,
    pool: Arc<PoolInner>,
    retired: bool,
}

impl SurfaceLease {
    pub fn id(&self) -> SurfaceId {
        self.slot.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.slot.is_destroyed()
    }

    /// Start loading `document` and return the first load signal to arrive.
    ///
    /// Later signals for this surface are logged and dropped. If the host
    /// closes its side without signalling, the receiver errors.
    pub fn load(&self, document: &DocumentUrl) -> Result<oneshot::Receiver<SurfaceSignal>> {
        let surface = self.slot.handle().ok_or_else(|| {
            PrintBridgeError::SurfaceUnavailable(format!("{} already destroyed", self.slot.id))
        })?;

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        let (first_tx, first_rx) = oneshot::channel();
        let slot = Arc::clone(&self.slot);

        tokio::spawn(async move {
            let mut first_tx = Some(first_tx);
            while let Some(signal) = signal_rx.recv().await {
                if slot.latch.try_fire() {
                    if let Some(tx) = first_tx.take() {
                        let _ = tx.send(signal);
                    }
                } else {
                    warn!(surface_id = %slot.id, ?signal, "ignoring load signal after resolution");
                }
            }
        });

        surface.load(document, signal_tx);
        Ok(first_rx)
    }

    /// Submit the loaded document. Fails without contacting the host when the
    /// surface has already been destroyed.
    pub async fn print(&self, request: &PrintRequest) -> PrintOutcome {
        match self.slot.handle() {
            Some(surface) => surface.print(request).await,
            None => PrintOutcome::Failed(Some("render surface destroyed before printing".into())),
        }
    }

    /// Hand the surface back for destruction after the grace period.
    pub fn retire(mut self) {
        self.retired = true;
        debug!(surface_id = %self.slot.id, grace = ?self.pool.grace, "render surface retired");
        self.pool.schedule_destroy(Arc::clone(&self.slot));
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        if !self.retired {
            warn!(surface_id = %self.slot.id, "surface lease dropped without retire, scheduling cleanup");
            self.pool.schedule_destroy(Arc::clone(&self.slot));
        }
    }
}
