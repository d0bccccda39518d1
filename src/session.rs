// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session.
//!
//! The session owns the navigation cursor, the active folder's frame list
//! and its tracking store. All reads and writes of the store go through
//! it: folder switches flush the outgoing store and load the incoming one,
//! committed rectangles are optionally propagated through the following
//! frames by a tracker, and every mutation is persisted immediately.

use crate::analysis::{compute_displacement_series, DisplacementSeries};
use crate::config::Config;
use crate::io::export::{export_all, ExportReport};
use crate::io::{discovery, media, serialization};
use crate::models::annotation::{Point, Rectangle, Target};
use crate::models::store::{TrackingStore, NTRIALS};
use crate::navigation::Navigation;
use crate::tracking::{BackendKind, BackendRegistry};
use crate::util::geometry::normalize_rect;
use anyhow::{bail, Context, Result};
use image::GrayImage;
use std::path::{Path, PathBuf};

/// What a propagation run did, frame by frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    pub backend: String,
    /// Frames that received a tracked rectangle, in order
    pub tracked: Vec<usize>,
    /// Frames where tracking failed and the target was cleared, in order
    pub failed: Vec<usize>,
}

pub struct Session {
    config: Config,
    folders: Vec<PathBuf>,
    nav: Navigation,
    frames: Vec<String>,
    store: TrackingStore,
    registry: BackendRegistry,
    displacement: Vec<DisplacementSeries>,
    /// Bumped whenever the displayed frame or its overlays change
    view_epoch: u64,
}

impl Session {
    /// Open the first folder.
    ///
    /// Fails when there are no folders or when the first folder's store
    /// exists but cannot be parsed.
    pub fn open(config: Config, folders: Vec<PathBuf>, registry: BackendRegistry) -> Result<Self> {
        if folders.is_empty() {
            bail!("No folders found under {}", config.folder.display());
        }
        let backend = config.default_tracker.parse().unwrap_or_else(|e| {
            log::warn!("{}, starting with {}", e, BackendKind::Mil);
            BackendKind::Mil
        });

        let mut session = Self {
            config,
            folders,
            nav: Navigation::new(backend),
            frames: Vec::new(),
            store: TrackingStore::default(),
            registry,
            displacement: Vec::new(),
            view_epoch: 0,
        };
        session.load_folder(true)?;
        log::info!("Opened session with {} folders", session.folders.len());
        Ok(session)
    }

    /// Load (or initialize) the store of the current folder.
    ///
    /// With `strict`, a malformed store is returned as an error; otherwise it
    /// is moved aside and the folder starts empty.
    fn load_folder(&mut self, strict: bool) -> Result<()> {
        let folder = self.folders[self.nav.folder].clone();
        self.frames = match discovery::list_frames(&folder, &self.config.image_format) {
            Ok(frames) => frames,
            Err(e) => {
                log::error!("{:#}", e);
                Vec::new()
            }
        };
        if self.frames.is_empty() {
            log::error!(
                "No images to display with format {} in {}",
                self.config.image_format,
                folder.display()
            );
        }

        let loaded = match serialization::load_store(&folder) {
            Ok(loaded) => loaded,
            Err(e) if strict => return Err(e),
            Err(e) => {
                log::error!("{:#}", e);
                match serialization::quarantine_store(&folder) {
                    Ok(moved) => log::warn!("Moved unreadable store to {}", moved.display()),
                    Err(e) => log::error!("{:#}", e),
                }
                None
            }
        };

        let (store, dirty) = match loaded {
            Some(mut store) if !(store.is_empty() && !self.frames.is_empty()) => {
                let changed = store.align(NTRIALS, &self.frames);
                if changed {
                    log::warn!("Re-aligned tracking store of {} to its frames", folder.display());
                }
                (store, changed)
            }
            _ => {
                log::info!("Initialized tracking store for {}", folder.display());
                (TrackingStore::new(NTRIALS, &self.frames), true)
            }
        };
        self.store = store;
        self.refresh();
        if dirty {
            serialization::persist_store(&self.store, &folder)?;
        }
        Ok(())
    }

    /// Recompute derived data and request a redraw.
    fn refresh(&mut self) {
        self.displacement = compute_displacement_series(&self.store);
        self.view_epoch += 1;
    }

    /// Persist the active store.
    pub fn flush(&self) -> Result<()> {
        serialization::persist_store(&self.store, self.folder())
    }

    fn persist_logged(&self) {
        if let Err(e) = self.flush() {
            log::error!("Failed to save tracking data: {:#}", e);
        }
    }

    // Navigation

    pub fn next_frame(&mut self) {
        self.nav.next_frame(self.frames.len());
        self.view_epoch += 1;
    }

    pub fn prev_frame(&mut self) {
        self.nav.prev_frame(self.frames.len());
        self.view_epoch += 1;
    }

    /// Move to the next folder. Fails, leaving the session in place, when
    /// the outgoing store cannot be saved.
    pub fn next_folder(&mut self) -> Result<()> {
        self.switch_folder(|nav, count| nav.next_folder(count))
    }

    pub fn prev_folder(&mut self) -> Result<()> {
        self.switch_folder(|nav, count| nav.prev_folder(count))
    }

    /// Flush the outgoing store, move, then load the incoming one.
    fn switch_folder(&mut self, step: impl FnOnce(&mut Navigation, usize)) -> Result<()> {
        if let Err(e) = self.flush() {
            log::error!("Staying in {}: failed to save tracking data: {:#}", self.folder().display(), e);
            return Err(e).with_context(|| format!("Staying in {}", self.folder_label()));
        }
        step(&mut self.nav, self.folders.len());
        if let Err(e) = self.load_folder(false) {
            log::error!("Failed to save tracking data: {:#}", e);
        }
        Ok(())
    }

    pub fn next_trial(&mut self) {
        self.nav.next_trial(NTRIALS);
        self.view_epoch += 1;
    }

    pub fn toggle_target(&mut self) {
        self.nav.toggle_target();
    }

    pub fn select_target(&mut self, target: Target) {
        if self.nav.target != target {
            self.nav.toggle_target();
        }
    }

    pub fn toggle_manual(&mut self) {
        self.nav.toggle_manual();
    }

    pub fn select_backend(&mut self, backend: BackendKind) {
        self.nav.select_backend(backend);
        log::info!("Selected tracker {}", backend);
    }

    // Store mutation

    /// Empty the current trial of the current folder.
    pub fn reset_trial(&mut self) {
        self.store.reset_trial(self.nav.trial, &self.frames);
        self.persist_logged();
        self.refresh();
        log::info!("Reset trial {} of {}", self.nav.trial + 1, self.folder().display());
    }

    /// Empty every trial of the current folder.
    pub fn reset_all(&mut self) {
        self.store.reset_all(NTRIALS, &self.frames);
        self.persist_logged();
        self.refresh();
        log::info!("Reset all trials of {}", self.folder().display());
    }

    /// Commit a drawn rectangle for the active target on the current frame.
    ///
    /// Unless in manual mode, the rectangle is then propagated through the
    /// remaining frames. The store is persisted either way.
    pub fn commit_rectangle(&mut self, rect: Rectangle) -> Option<PropagationReport> {
        let target = self.nav.target;
        if !self.store.set_annotation(self.nav.trial, self.nav.frame, target, rect) {
            log::warn!("No frame to annotate in {}", self.folder().display());
            return None;
        }
        let report = (!self.nav.manual).then(|| self.propagate(target, rect));
        self.persist_logged();
        self.refresh();
        report
    }

    /// Track `seed` from the current frame through the end of the folder.
    ///
    /// Each frame is handled on its own: a failed frame has the target
    /// cleared and the loop carries on with the next one. Frames before the
    /// current one are never touched.
    pub fn propagate(&mut self, target: Target, seed: Rectangle) -> PropagationReport {
        let bbox = normalize_rect(&seed);
        let mut backend = self.registry.create(self.nav.backend);
        let mut report = PropagationReport {
            backend: backend.name().to_string(),
            ..Default::default()
        };

        let start = self.nav.frame;
        if start + 1 >= self.frames.len() {
            return report;
        }
        let first = match self.load_frame(start) {
            Ok(image) => image,
            Err(e) => {
                log::error!("Cannot start tracking: {:#}", e);
                return report;
            }
        };
        if let Err(e) = backend.init(&first, bbox) {
            log::error!("Tracker {} failed to initialize: {:#}", report.backend, e);
            return report;
        }

        let trial = self.nav.trial;
        for k in start + 1..self.frames.len() {
            self.nav.frame = k;
            self.view_epoch += 1;

            let result = self.load_frame(k).and_then(|image| backend.update(&image));
            match result {
                Ok(Some(found)) => {
                    self.store.set_annotation(trial, k, target, found.to_rectangle());
                    report.tracked.push(k);
                    log::info!("Successful tracking on image {} with tracker {}", self.frames[k], report.backend);
                }
                Ok(None) => {
                    self.store.clear_annotation(trial, k, target);
                    report.failed.push(k);
                    log::warn!("Tracking error on image {} with tracker {}", self.frames[k], report.backend);
                }
                Err(e) => {
                    self.store.clear_annotation(trial, k, target);
                    report.failed.push(k);
                    log::warn!("Tracking error on image {} with tracker {}: {:#}", self.frames[k], report.backend, e);
                }
            }
        }

        self.persist_logged();
        report
    }

    fn load_frame(&self, index: usize) -> Result<GrayImage> {
        media::load_gray(&self.folder().join(&self.frames[index]))
    }

    // Export

    /// Write the results table of all folders to the configured root.
    pub fn export_results(&self) -> Result<ExportReport> {
        self.export_to(&self.config.results_path())
    }

    /// Write the results table of all folders to `destination`. The active
    /// store is flushed first; navigation is left untouched.
    pub fn export_to(&self, destination: &Path) -> Result<ExportReport> {
        self.flush()?;
        export_all(
            &self.folders,
            &self.config.image_format,
            &self.config.variables,
            self.config.scaling_factor,
            destination,
        )
    }

    // Accessors

    pub fn nav(&self) -> &Navigation {
        &self.nav
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn folder(&self) -> &Path {
        &self.folders[self.nav.folder]
    }

    /// Current folder relative to the configured root.
    pub fn folder_label(&self) -> String {
        let folder = self.folder();
        folder
            .strip_prefix(&self.config.folder)
            .unwrap_or(folder)
            .display()
            .to_string()
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn frame_path(&self) -> Option<PathBuf> {
        self.frames.get(self.nav.frame).map(|f| self.folder().join(f))
    }

    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    pub fn rectangle(&self, target: Target) -> Option<Rectangle> {
        self.store.rectangle(self.nav.trial, self.nav.frame, target)
    }

    pub fn point(&self, target: Target) -> Option<Point> {
        self.store.point(self.nav.trial, self.nav.frame, target)
    }

    /// Per-frame point flags of the current trial.
    pub fn trial_status(&self, target: Target) -> Vec<bool> {
        self.store
            .trials
            .get(self.nav.trial)
            .map(|t| t.status(target))
            .unwrap_or_default()
    }

    pub fn displacement(&self) -> &[DisplacementSeries] {
        &self.displacement
    }

    pub fn view_epoch(&self) -> u64 {
        self.view_epoch
    }

    /// Whether the selected tracker runs as itself rather than the default.
    pub fn backend_available(&self) -> bool {
        self.registry.is_registered(self.nav.backend)
    }
}
