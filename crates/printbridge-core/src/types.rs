// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the PrintBridge print service.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on copies accepted for a single job.
pub const MAX_COPIES: u32 = 999;

/// Message reported when the printing subsystem accepted the job.
pub const PRINTING_STARTED: &str = "Printing started";

/// Reason used when the printing subsystem fails without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a render surface, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Lifecycle states of a print job.
///
/// Declaration order is the only legal direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Request validated, no surface yet.
    Pending,
    /// Document is being loaded into a render surface.
    Loading,
    /// Handed to the printing subsystem, waiting for its verdict.
    Submitted,
    /// The printing subsystem accepted the job.
    Succeeded,
    /// Load or submission failed; see the result message.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Number of copies requested, always in `1..=MAX_COPIES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Copies(u32);

impl Copies {
    /// Clamp an arbitrary integer into the accepted range; non-positive means one.
    pub fn new(n: i64) -> Self {
        if n < 1 {
            Self(1)
        } else {
            Self(n.min(MAX_COPIES as i64) as u32)
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Interpret a loosely typed JSON `copies` field.
    ///
    /// Numbers keep their integer part, strings are read like a leading-integer
    /// parse (`"2 copies"` is 2). Anything else, or anything below one, is 1.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        use serde_json::Value;
        match value {
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => Self::new(i),
                None => n
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| Self::new(f.trunc() as i64))
                    .unwrap_or_default(),
            },
            Some(Value::String(s)) => Self::parse_leading(s),
            _ => Self::default(),
        }
    }

    fn parse_leading(s: &str) -> Self {
        let s = s.trim_start();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 || negative {
            return Self::default();
        }
        // Anything too long to fit is certainly above the cap.
        let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
        Self::new(n)
    }
}

impl Default for Copies {
    fn default() -> Self {
        Self(1)
    }
}

impl std::fmt::Display for Copies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document reference handed to a render surface: the exact file to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUrl {
    path: PathBuf,
}

impl DocumentUrl {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` form with forward slashes, as rendering hosts expect.
    pub fn as_file_url(&self) -> String {
        let raw = self.path.to_string_lossy().replace('\\', "/");
        if raw.starts_with('/') {
            format!("file://{raw}")
        } else {
            format!("file:///{raw}")
        }
    }
}

impl std::fmt::Display for DocumentUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_file_url())
    }
}

/// What the orchestrator asks of the printing subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintRequest {
    /// Never show an OS print dialog.
    pub silent: bool,
    pub target_printer: String,
    pub copies: Copies,
    /// Job title shown in the OS queue.
    pub title: String,
}

impl PrintRequest {
    pub fn silent(target_printer: impl Into<String>, copies: Copies, title: impl Into<String>) -> Self {
        Self {
            silent: true,
            target_printer: target_printer.into(),
            copies,
            title: title.into(),
        }
    }
}

/// Terminal, caller-visible outcome of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// The printing subsystem accepted the job.
    Printed,
    /// The document never rendered; nothing was submitted.
    LoadFailed(String),
    /// The printing subsystem reported a failure.
    PrintFailed(String),
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Printed)
    }

    pub fn status(&self) -> JobStatus {
        if self.is_success() {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        }
    }

    /// Human-readable message returned to the caller.
    pub fn message(&self) -> String {
        match self {
            Self::Printed => PRINTING_STARTED.to_string(),
            Self::LoadFailed(reason) => format!("Failed to load file: {reason}"),
            Self::PrintFailed(reason) => format!("Printing failed: {reason}"),
        }
    }
}

/// A single print job, alive for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: JobId,
    pub filename: String,
    pub printer_name: String,
    pub copies: Copies,
    pub status: JobStatus,
    /// Set exactly once, when the job reaches a terminal status.
    pub result_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PrintJob {
    pub fn new(filename: impl Into<String>, printer_name: impl Into<String>, copies: Copies) -> Self {
        Self {
            id: JobId::new(),
            filename: filename.into(),
            printer_name: printer_name.into(),
            copies,
            status: JobStatus::Pending,
            result_message: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to a non-terminal status. Returns false (and changes nothing) if
    /// the move is not strictly forward or the job is already finished.
    pub fn advance(&mut self, next: JobStatus) -> bool {
        if next.is_terminal() || self.status.is_terminal() || next <= self.status {
            return false;
        }
        self.status = next;
        true
    }

    /// Record the terminal result. Only the first call has any effect.
    pub fn finish(&mut self, result: &JobResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = result.status();
        self.result_message = Some(result.message());
        self.finished_at = Some(Utc::now());
        true
    }
}
