// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer. Wires the upload store, surface pool and job
// orchestrator to one render host and exposes what the HTTP routes need.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use printbridge_core::AppConfig;
use printbridge_core::error::Result;
use printbridge_core::types::{Copies, JobResult, PrintJob};
use printbridge_host::RenderHost;
use printbridge_print::{
    JobHistory, OrchestratorSettings, PrintOrchestrator, StoredFile, SurfacePool, SurfaceStats,
    UploadEntry, UploadStore, spawn_sweeper,
};

const CONFIG_FILE: &str = "config.json";

/// Snapshot reported by `/api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub service: String,
    pub host: String,
    pub upload_dir: PathBuf,
    pub port: u16,
    pub surfaces: SurfaceStats,
}

/// Outcome of printing every stored file to one printer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub printed: Vec<String>,
    pub failed: Vec<String>,
}

/// Shared services handed to every request handler.
///
/// All fields are cheaply cloneable so the struct can live in axum state.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<AppConfig>,
    host: Arc<dyn RenderHost>,
    store: UploadStore,
    orchestrator: PrintOrchestrator,
}

impl AppServices {
    /// Initialise all services. Call once at start-up.
    ///
    /// Opens (creating if needed) the upload directory, which defaults to
    /// `<data_dir>/uploads`.
    pub fn init(data_dir: &Path, config: AppConfig, host: Arc<dyn RenderHost>) -> Result<Self> {
        let upload_dir = config
            .upload_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("uploads"));
        let store = UploadStore::open(&upload_dir)?;

        let pool = SurfacePool::new(Arc::clone(&host), config.cleanup_grace());
        let orchestrator = PrintOrchestrator::new(
            store.clone(),
            pool,
            JobHistory::new(config.job_history_capacity),
            OrchestratorSettings::from(&config),
        );

        info!(
            host = host.host_name(),
            upload_dir = %store.root().display(),
            "app services initialised"
        );

        Ok(Self {
            config: Arc::new(config),
            host,
            store,
            orchestrator,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // -- Printers ------------------------------------------------------------

    pub async fn list_printers(&self) -> Result<Vec<String>> {
        let printers = self.host.list_printers().await?;
        info!(count = printers.len(), "printers requested");
        Ok(printers)
    }

    // -- Uploads -------------------------------------------------------------

    pub async fn upload(&self, name: &str, bytes: &[u8]) -> Result<StoredFile> {
        self.store.save(name, bytes).await
    }

    pub async fn files(&self) -> Result<Vec<UploadEntry>> {
        self.store.list().await
    }

    /// Bytes of a stored upload, for previewing it.
    pub async fn preview(&self, name: &str) -> Result<Vec<u8>> {
        self.store.read(name).await
    }

    pub async fn delete_file(&self, name: &str) -> Result<()> {
        self.store.delete(name).await
    }

    /// Start the retention sweeper, if retention is configured.
    pub fn start_sweeper(&self) -> Option<JoinHandle<()>> {
        let retention = self.config.upload_retention()?;
        info!(?retention, every = ?self.config.sweep_interval(), "upload sweeper started");
        Some(spawn_sweeper(
            self.store.clone(),
            retention,
            self.config.sweep_interval(),
        ))
    }

    // -- Printing ------------------------------------------------------------

    pub async fn print_single(
        &self,
        filename: &str,
        printer: &str,
        copies: Copies,
    ) -> Result<JobResult> {
        self.orchestrator.submit(filename, printer, copies).await
    }

    /// Print every stored file to `printer`, one ordinary job per file, in
    /// name order. A failed file does not stop the batch.
    pub async fn print_all(&self, printer: &str, copies: Copies) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for entry in self.store.list().await? {
            match self.orchestrator.submit(&entry.name, printer, copies).await {
                Ok(result) if result.is_success() => outcome.printed.push(entry.name),
                Ok(result) => {
                    warn!(file = %entry.name, message = %result.message(), "batch print failed");
                    outcome.failed.push(entry.name);
                }
                Err(e) => {
                    warn!(file = %entry.name, error = %e, "batch print skipped file");
                    outcome.failed.push(entry.name);
                }
            }
        }
        info!(
            printer,
            printed = outcome.printed.len(),
            failed = outcome.failed.len(),
            "batch print finished"
        );
        Ok(outcome)
    }

    /// Finished jobs, newest first.
    pub fn jobs(&self) -> Vec<PrintJob> {
        self.orchestrator.history().recent()
    }

    // -- Lifecycle -----------------------------------------------------------

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            service: self.config.service_name.clone(),
            host: self.host.host_name().to_string(),
            upload_dir: self.store.root().to_path_buf(),
            port: self.config.port,
            surfaces: self.orchestrator.pool().stats(),
        }
    }

    /// Destroy every render surface still lingering. Returns how many.
    pub fn shutdown(&self) -> usize {
        self.orchestrator.pool().shutdown()
    }
}

/// Load `config.json` from the data directory, writing the defaults out the
/// first time so operators have a file to edit.
pub fn load_or_init_config(data_dir: &Path) -> AppConfig {
    let path = data_dir.join(CONFIG_FILE);
    match std::fs::read_to_string(&path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                AppConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let config = AppConfig::default();
            if let Err(e) = persist_config(data_dir, &config) {
                warn!(error = %e, "could not write default config");
            }
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config file, using defaults");
            AppConfig::default()
        }
    }
}

pub fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
