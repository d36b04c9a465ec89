// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload store: uploaded documents kept on local disk under their original
// names.
//
// A second upload with the same name replaces the first in place. Callers are
// expected to generate unique names; when they don't, the overwrite is logged
// with both content hashes so the lost document can at least be identified.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use printbridge_core::error::{PrintBridgeError, Result};

/// Prefix of in-flight temp files; never listed, never resolvable.
const PART_PREFIX: &str = ".upload-";

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
    /// True when an earlier upload with the same name was replaced.
    pub replaced: bool,
}

/// One entry of the upload directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct UploadEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Documents on local disk, addressed by file name. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open (or create) the store rooted at `root`.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = std::fs::canonicalize(root.as_ref())?;
        info!(path = %root.display(), "upload store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject names that could escape the upload directory.
    pub fn validate_name(name: &str) -> Result<()> {
        let bad = name.trim().is_empty()
            || name == "."
            || name == ".."
            || name.starts_with(PART_PREFIX)
            || name.contains(['/', '\\', '\0']);
        if bad {
            return Err(PrintBridgeError::InvalidFilename(name.to_string()));
        }
        Ok(())
    }

    /// Absolute path of a stored document, or `FileNotFound`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name).map_err(|_| PrintBridgeError::FileNotFound(name.to_string()))?;
        let path = self.root.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PrintBridgeError::FileNotFound(name.to_string()))
        }
    }

    /// Store `bytes` under `name`, replacing any previous upload of that name.
    ///
    /// Bytes go to a temp file first and are renamed into place, so a reader
    /// never sees a half-written document.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(&self, name: &str, bytes: &[u8]) -> Result<StoredFile> {
        Self::validate_name(name)?;
        let path = self.root.join(name);
        let sha256 = hash_bytes(bytes);

        let previous = match tokio::fs::read(&path).await {
            Ok(old) => Some(hash_bytes(&old)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let part = self.root.join(format!(
            "{PART_PREFIX}{}-{}.part",
            std::process::id(),
            PART_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = tokio::fs::write(&part, bytes).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&part, &path).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }

        if let Some(old_sha256) = &previous {
            warn!(
                file = name,
                old_sha256 = %old_sha256,
                new_sha256 = %sha256,
                "upload replaced an existing file with the same name"
            );
        }
        info!(file = name, sha256 = %sha256, "file uploaded");

        Ok(StoredFile {
            name: name.to_string(),
            path,
            size: bytes.len() as u64,
            sha256,
            replaced: previous.is_some(),
        })
    }

    /// All stored documents, sorted by name.
    pub async fn list(&self) -> Result<Vec<UploadEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(PART_PREFIX) {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            entries.push(UploadEntry {
                name,
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Contents of a stored document.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Remove a stored document.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path).await?;
        info!(file = name, "file deleted");
        Ok(())
    }

    /// Delete documents last modified more than `age` ago. Returns how many.
    pub async fn sweep_older_than(&self, age: Duration) -> Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut removed = 0;
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let stale = meta.modified().map(|m| m <= cutoff).unwrap_or(false);
            if !stale {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    removed += 1;
                    debug!(file = %entry.path().display(), "expired upload removed");
                }
                // Another sweep or a delete got there first.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(file = %entry.path().display(), error = %e, "could not remove expired upload"),
            }
        }
        Ok(removed)
    }
}

/// Periodically delete uploads older than `retention`.
pub fn spawn_sweeper(store: UploadStore, retention: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.sweep_older_than(retention).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "expired uploads swept"),
                Err(e) => warn!(error = %e, "upload sweep failed"),
            }
        }
    })
}
