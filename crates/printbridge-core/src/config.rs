// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Persistent service settings, stored as `config.json` in the data directory.
///
/// Missing fields fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Interface to listen on (all interfaces by default).
    pub bind_address: IpAddr,
    /// HTTP port the business application talks to.
    pub port: u16,
    /// Where uploads are stored. Defaults to `<data dir>/uploads`.
    pub upload_dir: Option<PathBuf>,
    /// Wait between "document loaded" and submitting to the printer.
    pub settle_delay_ms: u64,
    /// How long a render surface lingers after its job resolved.
    pub cleanup_grace_ms: u64,
    /// Reported by `/heartbeat` and `/api/status`.
    pub service_name: String,
    /// Delete uploads older than this. `None` keeps them forever.
    pub upload_retention_secs: Option<u64>,
    /// How often the upload sweeper runs when retention is set.
    pub sweep_interval_secs: u64,
    /// Finished jobs remembered for `/api/jobs`.
    pub job_history_capacity: usize,
    /// Largest accepted multipart body.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_millis(self.cleanup_grace_ms)
    }

    pub fn upload_retention(&self) -> Option<Duration> {
        self.upload_retention_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            upload_dir: None,
            settle_delay_ms: 500,
            cleanup_grace_ms: 10_000,
            service_name: "PrintBridge".to_string(),
            upload_retention_secs: None,
            sweep_interval_secs: 600,
            job_history_capacity: 50,
            max_upload_bytes: 64 * 1024 * 1024, // 64 MiB
        }
    }
}
