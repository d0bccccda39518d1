// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! OpenCV tracking backends.
//!
//! Registers the trackers of OpenCV's `video` and `tracking` modules that
//! are available through the current API. Names without a registration here
//! (the legacy BOOSTING, TLD, MEDIANFLOW and MOSSE trackers) use the
//! registry's default.

use super::{BackendKind, BackendRegistry, TrackerBackend};
use crate::util::geometry::BoundingBox;
use anyhow::{Context, Result};
use image::GrayImage;
use opencv::core::{Mat, Ptr, Rect};
use opencv::prelude::*;
use opencv::{imgproc, tracking, video};

/// Adapter from an OpenCV tracker to [`TrackerBackend`].
struct CvTracker<T> {
    name: &'static str,
    create: fn() -> opencv::Result<Ptr<T>>,
    tracker: Option<Ptr<T>>,
}

impl<T> CvTracker<T> {
    fn new(name: &'static str, create: fn() -> opencv::Result<Ptr<T>>) -> Self {
        Self {
            name,
            create,
            tracker: None,
        }
    }
}

/// Convert a grayscale frame to the BGR matrix OpenCV trackers expect.
fn to_bgr(frame: &GrayImage) -> Result<Mat> {
    let gray = Mat::new_rows_cols_with_data(frame.height() as i32, frame.width() as i32, frame.as_raw())?;
    let mut bgr = Mat::default();
    imgproc::cvt_color(&*gray, &mut bgr, imgproc::COLOR_GRAY2BGR, 0)?;
    Ok(bgr)
}

impl<T> TrackerBackend for CvTracker<T>
where
    Ptr<T>: video::TrackerTrait,
{
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, frame: &GrayImage, bbox: BoundingBox) -> Result<()> {
        let mut tracker = (self.create)().with_context(|| format!("Failed to create {} tracker", self.name))?;
        let image = to_bgr(frame)?;
        tracker.init(&image, Rect::new(bbox.x, bbox.y, bbox.width, bbox.height))?;
        self.tracker = Some(tracker);
        Ok(())
    }

    fn update(&mut self, frame: &GrayImage) -> Result<Option<BoundingBox>> {
        let tracker = self
            .tracker
            .as_mut()
            .with_context(|| format!("{} tracker used before init", self.name))?;
        let image = to_bgr(frame)?;
        let mut rect = Rect::default();
        if tracker.update(&image, &mut rect)? {
            Ok(Some(BoundingBox::new(rect.x, rect.y, rect.width, rect.height)))
        } else {
            Ok(None)
        }
    }
}

/// Add the OpenCV trackers to `registry`.
pub fn register(registry: &mut BackendRegistry) {
    registry.register(
        BackendKind::Mil,
        Box::new(|| -> Box<dyn TrackerBackend> {
            Box::new(CvTracker::new("MIL", video::TrackerMIL::create_def))
        }),
    );
    registry.register(
        BackendKind::Goturn,
        Box::new(|| -> Box<dyn TrackerBackend> {
            Box::new(CvTracker::new("GOTURN", video::TrackerGOTURN::create_def))
        }),
    );
    registry.register(
        BackendKind::Kcf,
        Box::new(|| -> Box<dyn TrackerBackend> {
            Box::new(CvTracker::new("KCF", tracking::TrackerKCF::create_def))
        }),
    );
    registry.register(
        BackendKind::Csrt,
        Box::new(|| -> Box<dyn TrackerBackend> {
            Box::new(CvTracker::new("CSRT", tracking::TrackerCSRT::create_def))
        }),
    );
}
