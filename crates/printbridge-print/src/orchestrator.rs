// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print job orchestration.
//
// One job = one fresh render surface, driven through
//
//   Pending -> Loading -> Submitted -> Succeeded | Failed
//
// The caller awaits a single `JobResult`. The job runs in its own task and
// keeps running if the caller goes away; its surface is always retired and
// destroyed one grace period after the job resolved.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{Instrument, debug, info, info_span, warn};

use printbridge_core::error::Result;
use printbridge_core::types::{
    Copies, DocumentUrl, JobResult, JobStatus, PrintJob, PrintRequest, UNKNOWN_ERROR,
};
use printbridge_core::AppConfig;
use printbridge_host::{PrintOutcome, SurfaceSignal};

use crate::history::JobHistory;
use crate::latch::ResolutionLatch;
use crate::store::UploadStore;
use crate::surface::{SurfaceLease, SurfacePool};

/// Timing knobs for the job state machine.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    /// Wait between "document loaded" and submitting to the printer. Rendering
    /// completion does not guarantee paint completion for large documents;
    /// this is a heuristic, not a readiness guarantee.
    pub settle_delay: Duration,
}

impl From<&AppConfig> for OrchestratorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            settle_delay: config.settle_delay(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Drives print jobs from an uploaded file to a printing-subsystem verdict.
#[derive(Clone)]
pub struct PrintOrchestrator {
    store: UploadStore,
    pool: SurfacePool,
    history: JobHistory,
    settings: OrchestratorSettings,
}

impl PrintOrchestrator {
    pub fn new(
        store: UploadStore,
        pool: SurfacePool,
        history: JobHistory,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            pool,
            history,
            settings,
        }
    }

    pub fn pool(&self) -> &SurfacePool {
        &self.pool
    }

    pub fn history(&self) -> &JobHistory {
        &self.history
    }

    /// Print a stored file and wait for the single terminal result.
    ///
    /// Fails with `FileNotFound` before anything is allocated when `filename`
    /// is not in the upload store. Every other failure is reported as a
    /// failed `JobResult`, never retried.
    pub async fn submit(
        &self,
        filename: &str,
        printer_name: &str,
        copies: Copies,
    ) -> Result<JobResult> {
        let path = self.store.resolve(filename)?;

        let job = PrintJob::new(filename, printer_name, copies);
        info!(
            job_id = %job.id,
            file = filename,
            printer = printer_name,
            copies = copies.get(),
            "print job accepted"
        );

        let (latch, result) = ResolutionLatch::new();
        let span = info_span!("print_job", job_id = %job.id);
        tokio::spawn(self.clone().run(job, path, latch).instrument(span));

        Ok(result.await.unwrap_or_else(|_| {
            JobResult::PrintFailed("job ended without reporting a result".into())
        }))
    }

    async fn run(self, mut job: PrintJob, path: PathBuf, latch: ResolutionLatch<JobResult>) {
        let lease = match self.pool.acquire() {
            Ok(lease) => lease,
            Err(e) => {
                warn!(error = %e, "no render surface for job");
                self.resolve(&mut job, &latch, JobResult::LoadFailed(e.to_string()));
                return;
            }
        };

        let result = self.drive(&mut job, &lease, path).await;
        self.resolve(&mut job, &latch, result);
        lease.retire();
    }

    /// Load, settle, print. Returns the terminal result; never resolves itself.
    async fn drive(&self, job: &mut PrintJob, lease: &SurfaceLease, path: PathBuf) -> JobResult {
        job.advance(JobStatus::Loading);
        let document = DocumentUrl::from_path(path);
        info!(surface_id = %lease.id(), url = %document, "loading document");

        let first_signal = match lease.load(&document) {
            Ok(signal) => signal,
            Err(e) => return JobResult::LoadFailed(e.to_string()),
        };

        match first_signal.await {
            Ok(SurfaceSignal::LoadFinished) => {}
            Ok(SurfaceSignal::LoadFailed { code, description }) => {
                warn!(surface_id = %lease.id(), code, %description, "document failed to load");
                return JobResult::LoadFailed(description);
            }
            Err(_) => {
                return JobResult::LoadFailed(
                    "render surface closed before load completed".into(),
                );
            }
        }

        job.advance(JobStatus::Submitted);
        debug!(surface_id = %lease.id(), delay = ?self.settings.settle_delay, "document loaded, settling");
        tokio::time::sleep(self.settings.settle_delay).await;

        if lease.is_destroyed() {
            return JobResult::PrintFailed("render surface destroyed before printing".into());
        }

        let request = PrintRequest::silent(&job.printer_name, job.copies, &job.filename);
        match lease.print(&request).await {
            PrintOutcome::Submitted => JobResult::Printed,
            PrintOutcome::Failed(reason) => {
                JobResult::PrintFailed(reason.unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
            }
        }
    }

    fn resolve(&self, job: &mut PrintJob, latch: &ResolutionLatch<JobResult>, result: JobResult) {
        if !job.finish(&result) {
            warn!(status = ?job.status, "job already finished, result dropped");
            return;
        }
        // Recorded before the caller can observe the result.
        self.history.record(job.clone());
        let message = result.message();
        if latch.resolve(result) {
            info!(status = ?job.status, %message, "print job resolved");
        } else {
            warn!(%message, "job result already delivered, ignoring");
        }
    }
}
