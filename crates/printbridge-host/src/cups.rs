// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS-backed host for desktop Unix systems.
//
// Printer enumeration shells out to `lpstat -e`; printing shells out to
// `lp`, which never shows a dialog. A "surface" here is the checked document
// reference plus the `lp` invocation made against it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use printbridge_core::error::{PrintBridgeError, Result};
use printbridge_core::types::{DocumentUrl, PrintRequest, SurfaceId};

use crate::traits::*;

/// Chromium-style net error for a missing file.
const ERR_FILE_NOT_FOUND: (i32, &str) = (-6, "ERR_FILE_NOT_FOUND");

/// Generic load failure (directories, empty files, unreadable files).
const ERR_FAILED: (i32, &str) = (-2, "ERR_FAILED");

/// Host that drives the local CUPS client tools.
pub struct CupsHost {
    lpstat: PathBuf,
    lp: PathBuf,
}

impl CupsHost {
    pub fn new() -> Self {
        Self::with_commands("lpstat", "lp")
    }

    /// Use explicit tool paths (e.g. a non-standard CUPS prefix).
    pub fn with_commands(lpstat: impl Into<PathBuf>, lp: impl Into<PathBuf>) -> Self {
        Self {
            lpstat: lpstat.into(),
            lp: lp.into(),
        }
    }
}

impl Default for CupsHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderHost for CupsHost {
    fn host_name(&self) -> &str {
        "CUPS"
    }

    fn open_surface(&self, id: SurfaceId) -> Result<Arc<dyn HostSurface>> {
        debug!(surface_id = %id, "opening CUPS surface");
        Ok(Arc::new(CupsSurface {
            id,
            lp: self.lp.clone(),
            document: Mutex::new(None),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

#[async_trait]
impl PrinterCatalog for CupsHost {
    async fn list_printers(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.lpstat)
            .arg("-e")
            .output()
            .await
            .map_err(|e| {
                PrintBridgeError::CatalogUnavailable(format!("{}: {e}", self.lpstat.display()))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            // lpstat exits non-zero when the scheduler has no queues at all.
            if stderr.contains("No destinations") {
                return Ok(Vec::new());
            }
            return Err(PrintBridgeError::CatalogUnavailable(
                non_empty(&stderr).unwrap_or_else(|| format!("lpstat exited with {}", output.status)),
            ));
        }

        let printers = parse_printer_list(&String::from_utf8_lossy(&output.stdout));
        debug!(count = printers.len(), "CUPS printers enumerated");
        Ok(printers)
    }
}

/// A loaded document waiting to be handed to `lp`.
struct CupsSurface {
    id: SurfaceId,
    lp: PathBuf,
    document: Mutex<Option<PathBuf>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl HostSurface for CupsSurface {
    fn load(&self, document: &DocumentUrl, signals: SignalSender) {
        let path = document.path().to_path_buf();
        *self.document.lock().expect("document lock poisoned") = Some(path.clone());

        let closed = Arc::clone(&self.closed);
        let id = self.id;
        tokio::spawn(async move {
            let signal = match check_document(&path).await {
                Ok(()) => SurfaceSignal::LoadFinished,
                Err((code, description)) => SurfaceSignal::LoadFailed {
                    code,
                    description: description.to_string(),
                },
            };
            if closed.load(Ordering::Acquire) {
                debug!(surface_id = %id, "surface closed before load finished");
                return;
            }
            // Receiver gone means the job already resolved another way.
            let _ = signals.send(signal);
        });
    }

    async fn print(&self, request: &PrintRequest) -> PrintOutcome {
        if self.closed.load(Ordering::Acquire) {
            return PrintOutcome::Failed(Some("render surface closed".into()));
        }
        let Some(path) = self.document.lock().expect("document lock poisoned").clone() else {
            return PrintOutcome::Failed(Some("no document loaded".into()));
        };

        info!(
            surface_id = %self.id,
            printer = %request.target_printer,
            copies = request.copies.get(),
            "submitting to CUPS"
        );

        let output = Command::new(&self.lp)
            .arg("-d")
            .arg(&request.target_printer)
            .arg("-n")
            .arg(request.copies.get().to_string())
            .arg("-t")
            .arg(&request.title)
            .arg("--")
            .arg(&path)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                debug!(
                    surface_id = %self.id,
                    stdout = %String::from_utf8_lossy(&out.stdout).trim(),
                    "lp accepted job"
                );
                PrintOutcome::Submitted
            }
            Ok(out) => {
                let reason = non_empty(&String::from_utf8_lossy(&out.stderr));
                warn!(surface_id = %self.id, status = %out.status, "lp refused job");
                PrintOutcome::Failed(reason)
            }
            Err(e) => PrintOutcome::Failed(Some(format!("{}: {e}", self.lp.display()))),
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(surface_id = %self.id, "CUPS surface closed");
        }
    }
}

/// Parse `lpstat -e` output: one destination per line.
pub fn parse_printer_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A document "renders" when it is a readable, non-empty regular file.
async fn check_document(path: &std::path::Path) -> std::result::Result<(), (i32, &'static str)> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ERR_FILE_NOT_FOUND),
        Err(_) => return Err(ERR_FAILED),
    };
    if !meta.is_file() || meta.len() == 0 {
        return Err(ERR_FAILED);
    }
    tokio::fs::File::open(path).await.map_err(|_| ERR_FAILED)?;
    Ok(())
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn parses_lpstat_destinations() {
        let out = "HP-LaserJet\n  Brother_HL_L2350DW \n\nPDF\n";
        assert_eq!(
            parse_printer_list(out),
            vec!["HP-LaserJet", "Brother_HL_L2350DW", "PDF"]
        );
    }

    #[test]
    fn empty_output_means_no_printers() {
        assert!(parse_printer_list("\n").is_empty());
    }

    #[tokio::test]
    async fn missing_lpstat_is_catalog_unavailable() {
        let host = CupsHost::with_commands("/nonexistent/lpstat", "/nonexistent/lp");
        let err = host.list_printers().await.unwrap_err();
        assert!(matches!(err, PrintBridgeError::CatalogUnavailable(_)));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let host = CupsHost::new();
        let surface = host.open_surface(SurfaceId(1)).unwrap_or_else(|_| panic!("open"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        surface.load(&DocumentUrl::from_path("/nonexistent/invoice.pdf"), tx);
        assert_eq!(
            rx.recv().await,
            Some(SurfaceSignal::LoadFailed {
                code: -6,
                description: "ERR_FILE_NOT_FOUND".into()
            })
        );
    }

    #[tokio::test]
    async fn load_accepts_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let surface = CupsHost::new()
            .open_surface(SurfaceId(2))
            .unwrap_or_else(|_| panic!("open"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        surface.load(&DocumentUrl::from_path(&path), tx);
        assert_eq!(rx.recv().await, Some(SurfaceSignal::LoadFinished));
    }

    #[tokio::test]
    async fn closed_surface_refuses_to_print() {
        let surface = CupsHost::new()
            .open_surface(SurfaceId(3))
            .unwrap_or_else(|_| panic!("open"));
        surface.close();
        surface.close();
        let outcome = surface
            .print(&PrintRequest::silent("HP", Default::default(), "t"))
            .await;
        assert_eq!(
            outcome,
            PrintOutcome::Failed(Some("render surface closed".into()))
        );
    }
}
