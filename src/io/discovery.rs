// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Folder and frame discovery.
//!
//! Every directory below the root that has no subdirectories is one folder
//! of sequential frames. Both folders and frames are sorted by name so that
//! positions stay stable between runs and filesystems.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find all leaf directories under `root`, in lexicographic order.
///
/// The root itself counts when it has no subdirectories.
pub fn discover_folders(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Root folder {} does not exist or is not a directory", root.display());
    }
    std::fs::read_dir(root).with_context(|| format!("Cannot read root folder {}", root.display()))?;

    let mut folders = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        match has_subdirectories(entry.path()) {
            Ok(false) => folders.push(entry.into_path()),
            Ok(true) => {}
            Err(e) => log::warn!("Skipping folder {}: {}", entry.path().display(), e),
        }
    }
    Ok(folders)
}

fn has_subdirectories(dir: &Path) -> Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        if entry?.file_type()?.is_dir() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// List the frame files directly inside `folder` whose name ends with
/// `extension`, sorted by name.
pub fn list_frames(folder: &Path, extension: &str) -> Result<Vec<String>> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(folder).with_context(|| format!("Cannot list {}", folder.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(extension) {
            frames.push(name);
        }
    }
    frames.sort();
    Ok(frames)
}
