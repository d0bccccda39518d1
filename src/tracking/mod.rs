// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Visual tracking backends.
//!
//! A backend is initialized on one frame with a box around the target and
//! then asked for the target's box on each following frame. Backends are
//! looked up by name in a [`BackendRegistry`]; a name without a registered
//! factory falls back to the registry's default backend.

#[cfg(feature = "tracking-opencv")]
pub mod cv;
pub mod template;

use crate::config::TrackerParams;
use crate::util::geometry::BoundingBox;
use anyhow::Result;
use image::GrayImage;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The tracking algorithms selectable with keys 1 to 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Boosting,
    Mil,
    Kcf,
    Tld,
    MedianFlow,
    Goturn,
    Mosse,
    Csrt,
}

impl BackendKind {
    pub const ALL: [BackendKind; 8] = [
        BackendKind::Boosting,
        BackendKind::Mil,
        BackendKind::Kcf,
        BackendKind::Tld,
        BackendKind::MedianFlow,
        BackendKind::Goturn,
        BackendKind::Mosse,
        BackendKind::Csrt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Boosting => "BOOSTING",
            BackendKind::Mil => "MIL",
            BackendKind::Kcf => "KCF",
            BackendKind::Tld => "TLD",
            BackendKind::MedianFlow => "MEDIANFLOW",
            BackendKind::Goturn => "GOTURN",
            BackendKind::Mosse => "MOSSE",
            BackendKind::Csrt => "CSRT",
        }
    }

    /// Backend bound to number key `n` (1-based).
    pub fn from_key(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|k| k.name() == upper)
            .ok_or_else(|| anyhow::anyhow!("Unknown tracker: {}", s))
    }
}

/// A stateful tracker following one box through a frame sequence.
pub trait TrackerBackend {
    /// Human readable backend name for logs.
    fn name(&self) -> &str;

    /// Start tracking `bbox` on `frame`.
    fn init(&mut self, frame: &GrayImage, bbox: BoundingBox) -> Result<()>;

    /// Locate the target on the next frame. `None` means the target was lost.
    fn update(&mut self, frame: &GrayImage) -> Result<Option<BoundingBox>>;
}

pub type BackendFactory = Box<dyn Fn() -> Box<dyn TrackerBackend>>;

/// Name to factory map with one default entry.
pub struct BackendRegistry {
    factories: HashMap<BackendKind, BackendFactory>,
    default: BackendFactory,
}

impl BackendRegistry {
    /// A registry with only a default backend.
    pub fn new(default: BackendFactory) -> Self {
        Self {
            factories: HashMap::new(),
            default,
        }
    }

    /// The registry used by the application: the native template tracker
    /// as default, plus the OpenCV trackers when that feature is enabled.
    pub fn with_defaults(params: &TrackerParams) -> Self {
        let params = params.clone();
        #[allow(unused_mut)]
        let mut registry = Self::new(Box::new(move || -> Box<dyn TrackerBackend> {
            Box::new(template::TemplateTracker::new(params.search_radius, params.min_score))
        }));
        #[cfg(feature = "tracking-opencv")]
        cv::register(&mut registry);
        registry
    }

    pub fn register(&mut self, kind: BackendKind, factory: BackendFactory) {
        self.factories.insert(kind, factory);
    }

    pub fn is_registered(&self, kind: BackendKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Instantiate the backend for `kind`, or the default one.
    pub fn create(&self, kind: BackendKind) -> Box<dyn TrackerBackend> {
        match self.factories.get(&kind) {
            Some(factory) => factory(),
            None => {
                let backend = (self.default)();
                log::warn!("Tracker {} is not available, using {}", kind, backend.name());
                backend
            }
        }
    }
}
