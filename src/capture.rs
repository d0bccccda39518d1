// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Rectangle capture from pointer gestures.
//!
//! A press sets the anchor, every drag sample replaces the draft rectangle
//! spanned from the anchor to the pointer, and the release hands the final
//! rectangle to the caller for committing. The draft lives here only; the
//! tracking store is not touched until release.

use crate::models::annotation::{Point, Rectangle};

#[derive(Debug, Default)]
pub struct Capture {
    anchor: Option<Point>,
    draft: Option<Rectangle>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture at `pos`.
    pub fn press(&mut self, pos: Point) {
        self.anchor = Some(pos);
        self.draft = None;
    }

    /// Update the draft while pressed. Returns the current draft.
    pub fn drag(&mut self, pos: Point) -> Option<Rectangle> {
        let anchor = self.anchor?;
        self.draft = Some(Rectangle::from_corners(anchor, pos));
        self.draft
    }

    /// Finish the gesture.
    ///
    /// Returns the rectangle to commit, or `None` when the pointer was never
    /// dragged (a plain click), the rectangle has no area, or no press was
    /// seen.
    pub fn release(&mut self, pos: Point) -> Option<Rectangle> {
        let anchor = self.anchor.take()?;
        self.draft.take()?;
        Some(Rectangle::from_corners(anchor, pos)).filter(|rect| !rect.is_degenerate())
    }

    /// Drop an unfinished gesture, e.g. when the view changes under it.
    pub fn cancel(&mut self) {
        self.anchor = None;
        self.draft = None;
    }

    pub fn draft(&self) -> Option<Rectangle> {
        self.draft
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_drag_release() {
        let mut capture = Capture::new();
        capture.press(Point::new(50, 80));
        assert!(capture.is_active());
        assert!(capture.draft().is_none());

        assert_eq!(capture.drag(Point::new(30, 40)), Some(Rectangle::new(50, 80, 30, 40)));
        assert_eq!(capture.drag(Point::new(10, 20)), Some(Rectangle::new(50, 80, 10, 20)));
        assert_eq!(capture.draft(), Some(Rectangle::new(50, 80, 10, 20)));

        // Reversed corners are kept as drawn
        assert_eq!(capture.release(Point::new(12, 22)), Some(Rectangle::new(50, 80, 12, 22)));
        assert!(!capture.is_active());
        assert!(capture.draft().is_none());
    }

    #[test]
    fn test_click_without_drag_commits_nothing() {
        let mut capture = Capture::new();
        capture.press(Point::new(5, 5));
        assert_eq!(capture.release(Point::new(5, 5)), None);
    }

    #[test]
    fn test_zero_area_drag_commits_nothing() {
        let mut capture = Capture::new();
        capture.press(Point::new(5, 5));
        capture.drag(Point::new(9, 5));
        assert_eq!(capture.release(Point::new(9, 5)), None);
        assert!(!capture.is_active());
    }

    #[test]
    fn test_events_without_press_are_ignored() {
        let mut capture = Capture::new();
        assert_eq!(capture.drag(Point::new(1, 1)), None);
        assert_eq!(capture.release(Point::new(1, 1)), None);
    }

    #[test]
    fn test_cancel_drops_draft() {
        let mut capture = Capture::new();
        capture.press(Point::new(0, 0));
        capture.drag(Point::new(9, 9));
        capture.cancel();
        assert!(capture.draft().is_none());
        assert_eq!(capture.release(Point::new(9, 9)), None);
    }
}
