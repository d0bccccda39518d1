// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the conversion between drawn rectangles and the
//! origin + extent boxes trackers work with, and between screen positions
//! on the canvas and image pixel coordinates.

use crate::models::annotation::{Point, Rectangle};

/// An axis-aligned box with non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Corner form of the box, origin first.
    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Normalize a drawn rectangle: reversed axes become an origin shift.
pub fn normalize_rect(rect: &Rectangle) -> BoundingBox {
    let mut bbox = BoundingBox::new(rect.x1, rect.y1, rect.x2 - rect.x1, rect.y2 - rect.y1);
    if bbox.width < 0 {
        bbox.x += bbox.width;
        bbox.width = -bbox.width;
    }
    if bbox.height < 0 {
        bbox.y += bbox.height;
        bbox.height = -bbox.height;
    }
    bbox
}

/// Convert a relative canvas position (0.0 to 1.0) to image pixel coordinates,
/// clamped to the image.
pub fn relative_to_pixel(rel_x: f32, rel_y: f32, width: u32, height: u32) -> Point {
    let x = (rel_x.clamp(0.0, 1.0) * width as f32) as i32;
    let y = (rel_y.clamp(0.0, 1.0) * height as f32) as i32;
    Point::new(
        x.min(width.saturating_sub(1) as i32),
        y.min(height.saturating_sub(1) as i32),
    )
}

/// Convert image pixel coordinates to a relative canvas position.
pub fn pixel_to_relative(x: i32, y: i32, width: u32, height: u32) -> (f32, f32) {
    (x as f32 / width as f32, y as f32 / height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reversed_rect() {
        let reversed = normalize_rect(&Rectangle::new(50, 80, 10, 20));
        let forward = normalize_rect(&Rectangle::new(10, 20, 50, 80));
        assert_eq!(reversed, forward);
        assert_eq!(forward, BoundingBox::new(10, 20, 40, 60));
    }

    #[test]
    fn test_normalize_single_axis() {
        assert_eq!(
            normalize_rect(&Rectangle::new(10, 80, 50, 20)),
            BoundingBox::new(10, 20, 40, 60)
        );
        assert_eq!(
            normalize_rect(&Rectangle::new(50, 20, 10, 80)),
            BoundingBox::new(10, 20, 40, 60)
        );
    }

    #[test]
    fn test_box_to_rectangle() {
        let bbox = BoundingBox::new(10, 20, 40, 60);
        assert_eq!(bbox.to_rectangle(), Rectangle::new(10, 20, 50, 80));
        assert!(!bbox.is_empty());
        assert!(BoundingBox::new(0, 0, 0, 5).is_empty());
    }

    #[test]
    fn test_relative_pixel_roundtrip() {
        let (rx, ry) = pixel_to_relative(320, 240, 640, 480);
        assert!((rx - 0.5).abs() < 0.0001);
        assert!((ry - 0.5).abs() < 0.0001);
        assert_eq!(relative_to_pixel(rx, ry, 640, 480), Point::new(320, 240));
    }

    #[test]
    fn test_relative_to_pixel_clamps() {
        assert_eq!(relative_to_pixel(-0.2, 0.0, 640, 480), Point::new(0, 0));
        assert_eq!(relative_to_pixel(1.0, 1.5, 640, 480), Point::new(639, 479));
    }
}
