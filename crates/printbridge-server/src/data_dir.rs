// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::PathBuf;

const APP_DIR: &str = "printbridge";

/// Return the service data directory, creating it if needed.
///
/// `PRINTBRIDGE_DATA_DIR` wins outright; otherwise the XDG data home is used.
pub fn data_dir() -> PathBuf {
    let dir = resolve(|key| std::env::var(key).ok());
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Resolve the data directory from an environment lookup.
fn resolve(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(explicit) = env("PRINTBRIDGE_DATA_DIR").filter(|v| !v.is_empty()) {
        return PathBuf::from(explicit);
    }
    dirs_fallback(&env).join(APP_DIR)
}

fn dirs_fallback(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = env("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Some(home) = env("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    PathBuf::from("/tmp")
}
