// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame image loading.
//!
//! Frames are decoded once as RGBA for display in egui and once as 8-bit
//! grayscale for the trackers.

use anyhow::{Context, Result};
use image::GrayImage;
use std::path::Path;

/// A decoded frame ready to be uploaded as a texture.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Load a frame as RGBA pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rgba = img.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Load a frame as grayscale for tracking.
pub fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(img.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use tempfile::tempdir;

    #[test]
    fn test_load_gray_and_rgba() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");
        GrayImage::from_pixel(4, 3, Luma([200])).save(&path).unwrap();

        let gray = load_gray(&path).unwrap();
        assert_eq!(gray.dimensions(), (4, 3));
        assert_eq!(gray.get_pixel(1, 1).0, [200]);

        let rgba = load_image(&path).unwrap();
        assert_eq!((rgba.width, rgba.height), (4, 3));
        assert_eq!(rgba.pixels.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_unreadable_frame_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(load_gray(&path).is_err());
    }
}
