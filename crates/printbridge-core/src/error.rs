// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for PrintBridge.

use thiserror::Error;

/// Top-level error type for all PrintBridge operations.
#[derive(Debug, Error)]
pub enum PrintBridgeError {
    // -- Preconditions (reported before any job exists) --
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("no file uploaded")]
    NoFileUploaded,

    // -- Job failures --
    #[error("failed to load file: {0}")]
    LoadFailed(String),

    #[error("printing failed: {0}")]
    PrintFailed(String),

    // -- Host capability --
    #[error("printer catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("render surface unavailable: {0}")]
    SurfaceUnavailable(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by the HTTP facade to choose a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input; no job was created.
    Precondition,
    /// The document could not be rendered.
    Load,
    /// The printing subsystem rejected or errored.
    Submission,
    /// Printer enumeration is not available yet.
    CatalogUnavailable,
    /// Anything else (disk, serialization, host wiring).
    Internal,
}

impl PrintBridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound(_) | Self::InvalidFilename(_) | Self::NoFileUploaded => {
                ErrorKind::Precondition
            }
            Self::LoadFailed(_) => ErrorKind::Load,
            Self::PrintFailed(_) => ErrorKind::Submission,
            Self::CatalogUnavailable(_) => ErrorKind::CatalogUnavailable,
            Self::SurfaceUnavailable(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Config(_) => ErrorKind::Internal,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintBridgeError>;
