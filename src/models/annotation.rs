// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the per-target annotation of a single frame: the
//! rectangle as drawn, the point derived from it and the time it was set.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle stored exactly as drawn.
///
/// The corners may be reversed (`x2 < x1` and/or `y2 < y1`); the canonical
/// form is only computed when the rectangle is handed to a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rectangle {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle spanned by two corner points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Integer midpoint of the two corners, truncated toward zero.
    pub fn midpoint(&self) -> Point {
        // Widened so corners read from disk cannot overflow
        let mid = |a: i32, b: i32| ((a as i64 + b as i64) / 2) as i32;
        Point {
            x: mid(self.x1, self.x2),
            y: mid(self.y1, self.y2),
        }
    }

    /// True when the rectangle covers no area.
    pub fn is_degenerate(&self) -> bool {
        self.x1 == self.x2 || self.y1 == self.y2
    }
}

/// The two annotated entities of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// The tracked anatomical object.
    Nerve,
    /// The fixed reference point.
    Fix,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Nerve, Target::Fix];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Nerve => "nerve",
            Target::Fix => "fix",
        }
    }

    /// The other target.
    pub fn toggled(self) -> Self {
        match self {
            Target::Nerve => Target::Fix,
            Target::Fix => Target::Nerve,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotation of one target on one frame.
///
/// `point` is present exactly when `rect` is, and always equals the
/// rectangle's midpoint. Both are only written through [`TargetAnnotation::set`]
/// and [`TargetAnnotation::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAnnotation {
    #[serde(with = "empty_object", default)]
    rect: Option<Rectangle>,
    #[serde(with = "empty_object", default)]
    point: Option<Point>,
    #[serde(default)]
    time: String,
}

impl TargetAnnotation {
    /// Store a rectangle together with its derived point and a timestamp.
    pub fn set(&mut self, rect: Rectangle, time: String) {
        self.rect = Some(rect);
        self.point = Some(rect.midpoint());
        self.time = time;
    }

    pub fn clear(&mut self) {
        self.rect = None;
        self.point = None;
        self.time.clear();
    }

    pub fn rect(&self) -> Option<Rectangle> {
        self.rect
    }

    pub fn point(&self) -> Option<Point> {
        self.point
    }

    /// Time the annotation was last set, if any.
    pub fn time(&self) -> Option<&str> {
        if self.time.is_empty() {
            None
        } else {
            Some(&self.time)
        }
    }

    /// Restore the point/rectangle invariant on data read from disk.
    pub(crate) fn repair(&mut self) -> bool {
        let expected = self.rect.map(|r| r.midpoint());
        if self.point != expected {
            self.point = expected;
            true
        } else {
            false
        }
    }
}

/// Encodes `None` as `{}` so absent values keep the same JSON shape.
mod empty_object {
    use super::*;
    use serde::ser::SerializeMap;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Empty {}

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrEmpty<T> {
        Value(T),
        Empty(Empty),
        Null(()),
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        Ok(match OrEmpty::<T>::deserialize(deserializer)? {
            OrEmpty::Value(v) => Some(v),
            OrEmpty::Empty(_) | OrEmpty::Null(()) => None,
        })
    }
}
