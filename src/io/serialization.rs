// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tracking store and document serialization.
//!
//! Stores are persisted as pretty JSON in `tracking.json` inside their
//! folder. Configuration documents are read as YAML or JSON depending on
//! their extension.

use crate::models::store::TrackingStore;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the persisted store inside each folder.
pub const STORE_FILE: &str = "tracking.json";

pub fn store_path(folder: &Path) -> PathBuf {
    folder.join(STORE_FILE)
}

/// Import a document, YAML for `.yaml`/`.yml`, JSON otherwise.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    let extension = path.extension().and_then(|s| s.to_str());
    let data = match extension {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
        _ => serde_json::from_str(&text)?,
    };
    Ok(data)
}

/// Load the store of `folder`.
///
/// A missing or unreadable file yields `Ok(None)`; a file that exists but
/// does not parse is an error.
pub fn load_store(folder: &Path) -> Result<Option<TrackingStore>> {
    let path = store_path(folder);
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            log::warn!("Cannot read {}: {}", path.display(), e);
            return Ok(None);
        }
    };
    if json.trim().is_empty() {
        return Ok(None);
    }
    let store = serde_json::from_str(&json)
        .with_context(|| format!("Malformed tracking store {}", path.display()))?;
    Ok(Some(store))
}

/// Write the store of `folder` and flush it to disk.
///
/// The document is written next to the target and renamed over it, so an
/// interrupted write never leaves a truncated store behind.
pub fn persist_store(store: &TrackingStore, folder: &Path) -> Result<()> {
    if !folder.is_dir() {
        bail!("Folder {} does not exist", folder.display());
    }
    let path = store_path(folder);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(store)?;

    let mut file = File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Move a store that failed to parse out of the way. Returns the new path.
pub fn quarantine_store(folder: &Path) -> Result<PathBuf> {
    let path = store_path(folder);
    let target = path.with_extension("json.corrupt");
    std::fs::rename(&path, &target)
        .with_context(|| format!("Failed to move {} aside", path.display()))?;
    Ok(target)
}
