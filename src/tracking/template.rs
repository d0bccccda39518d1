// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Native template tracker.
//!
//! Keeps the patch under the initial box as a template and searches a
//! window around the previous position for the offset with the highest
//! normalized cross-correlation. A best score below the configured minimum
//! counts as a lost target.

use super::TrackerBackend;
use crate::util::geometry::BoundingBox;
use anyhow::{bail, Result};
use image::GrayImage;

pub struct TemplateTracker {
    search_radius: i32,
    min_score: f32,
    template: Vec<f32>,
    /// Mean-free template norm
    template_norm: f32,
    bbox: Option<BoundingBox>,
}

impl TemplateTracker {
    pub fn new(search_radius: u32, min_score: f32) -> Self {
        Self {
            search_radius: search_radius.min(i32::MAX as u32) as i32,
            min_score,
            template: Vec::new(),
            template_norm: 0.0,
            bbox: None,
        }
    }

    /// Clip a box to the frame.
    fn clip(frame: &GrayImage, bbox: BoundingBox) -> BoundingBox {
        let (w, h) = (frame.width() as i32, frame.height() as i32);
        let x1 = bbox.x.clamp(0, w);
        let y1 = bbox.y.clamp(0, h);
        let x2 = (bbox.x + bbox.width).clamp(0, w);
        let y2 = (bbox.y + bbox.height).clamp(0, h);
        BoundingBox::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Mean-free pixels of the patch at (x, y) with the box's extent.
    fn patch(frame: &GrayImage, x: i32, y: i32, width: i32, height: i32) -> Vec<f32> {
        let mut values = Vec::with_capacity((width * height) as usize);
        for row in y..y + height {
            for col in x..x + width {
                values.push(frame.get_pixel(col as u32, row as u32).0[0] as f32);
            }
        }
        let mean = values.iter().sum::<f32>() / values.len().max(1) as f32;
        for v in &mut values {
            *v -= mean;
        }
        values
    }

    fn norm(values: &[f32]) -> f32 {
        values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Normalized cross-correlation of the template with the patch at (x, y).
    fn score(&self, frame: &GrayImage, x: i32, y: i32, width: i32, height: i32) -> f32 {
        let candidate = Self::patch(frame, x, y, width, height);
        let cand_norm = Self::norm(&candidate);
        if self.template_norm == 0.0 || cand_norm == 0.0 {
            // Flat patches only match other flat patches
            return if self.template_norm == cand_norm { 1.0 } else { 0.0 };
        }
        let dot: f32 = self.template.iter().zip(&candidate).map(|(a, b)| a * b).sum();
        dot / (self.template_norm * cand_norm)
    }
}

impl TrackerBackend for TemplateTracker {
    fn name(&self) -> &str {
        "TEMPLATE"
    }

    fn init(&mut self, frame: &GrayImage, bbox: BoundingBox) -> Result<()> {
        let clipped = Self::clip(frame, bbox);
        if clipped.is_empty() {
            bail!("Box {:?} does not overlap the {}x{} frame", bbox, frame.width(), frame.height());
        }
        self.template = Self::patch(frame, clipped.x, clipped.y, clipped.width, clipped.height);
        self.template_norm = Self::norm(&self.template);
        self.bbox = Some(clipped);
        Ok(())
    }

    fn update(&mut self, frame: &GrayImage) -> Result<Option<BoundingBox>> {
        let Some(prev) = self.bbox else {
            bail!("Tracker used before init");
        };
        let (w, h) = (frame.width() as i32, frame.height() as i32);
        if prev.width > w || prev.height > h {
            return Ok(None);
        }

        let mut best: Option<(f32, i32, i32)> = None;
        let r = self.search_radius;
        for y in (prev.y - r).max(0)..=(prev.y + r).min(h - prev.height) {
            for x in (prev.x - r).max(0)..=(prev.x + r).min(w - prev.width) {
                let s = self.score(frame, x, y, prev.width, prev.height);
                let closer = |bx: i32, by: i32| {
                    (x - prev.x).abs() + (y - prev.y).abs() < (bx - prev.x).abs() + (by - prev.y).abs()
                };
                match best {
                    Some((bs, bx, by)) if s < bs || (s == bs && !closer(bx, by)) => {}
                    _ => best = Some((s, x, y)),
                }
            }
        }

        match best {
            Some((score, x, y)) if score >= self.min_score => {
                let found = BoundingBox::new(x, y, prev.width, prev.height);
                self.bbox = Some(found);
                Ok(Some(found))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// A dark frame with a bright textured square at (x, y).
    fn frame_with_blob(x: u32, y: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(64, 64, Luma([10]));
        for dy in 0..8 {
            for dx in 0..8 {
                let v = 120 + ((dx * 13 + dy * 7) % 100) as u8;
                img.put_pixel(x + dx, y + dy, Luma([v]));
            }
        }
        img
    }

    #[test]
    fn test_follows_moving_blob() {
        let mut tracker = TemplateTracker::new(8, 0.5);
        tracker.init(&frame_with_blob(20, 20), BoundingBox::new(18, 18, 12, 12)).unwrap();

        let found = tracker.update(&frame_with_blob(23, 21)).unwrap().unwrap();
        assert_eq!(found, BoundingBox::new(21, 19, 12, 12));

        let found = tracker.update(&frame_with_blob(27, 19)).unwrap().unwrap();
        assert_eq!(found, BoundingBox::new(25, 17, 12, 12));
    }

    #[test]
    fn test_lost_target_is_none() {
        let mut tracker = TemplateTracker::new(4, 0.5);
        tracker.init(&frame_with_blob(20, 20), BoundingBox::new(18, 18, 12, 12)).unwrap();
        let flat = GrayImage::from_pixel(64, 64, Luma([10]));
        assert!(tracker.update(&flat).unwrap().is_none());
    }

    #[test]
    fn test_init_outside_frame_fails() {
        let mut tracker = TemplateTracker::new(4, 0.5);
        let frame = frame_with_blob(0, 0);
        assert!(tracker.init(&frame, BoundingBox::new(100, 100, 10, 10)).is_err());
        assert!(tracker.update(&frame).is_err());
    }

    #[test]
    fn test_init_clips_to_frame() {
        let mut tracker = TemplateTracker::new(4, 0.5);
        let frame = frame_with_blob(0, 0);
        tracker.init(&frame, BoundingBox::new(-4, -4, 12, 12)).unwrap();
        assert_eq!(tracker.bbox, Some(BoundingBox::new(0, 0, 8, 8)));
    }
}
