// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tracking store for one folder.
//!
//! The store is a fixed number of trials, each holding one record per frame
//! of the folder, positionally aligned with the folder's frame list. It is
//! serialized verbatim to `tracking.json`.

use super::annotation::{Point, Rectangle, Target, TargetAnnotation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of parallel annotation passes per folder.
pub const NTRIALS: usize = 5;

/// Annotations of both targets on a single frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// File name of the frame this record belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub nerve: TargetAnnotation,
    pub fix: TargetAnnotation,
}

impl FrameRecord {
    fn for_file(file: Option<&str>) -> Self {
        Self {
            file: file.map(str::to_owned),
            ..Self::default()
        }
    }

    pub fn target(&self, target: Target) -> &TargetAnnotation {
        match target {
            Target::Nerve => &self.nerve,
            Target::Fix => &self.fix,
        }
    }

    pub fn target_mut(&mut self, target: Target) -> &mut TargetAnnotation {
        match target {
            Target::Nerve => &mut self.nerve,
            Target::Fix => &mut self.fix,
        }
    }
}

/// One annotation pass over the folder's frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trial {
    pub frames: Vec<FrameRecord>,
}

impl Trial {
    /// A trial with one empty record per frame file.
    pub fn empty(files: &[String]) -> Self {
        Self {
            frames: files.iter().map(|f| FrameRecord::for_file(Some(f))).collect(),
        }
    }

    /// Per-frame flags telling whether `target` has a point.
    pub fn status(&self, target: Target) -> Vec<bool> {
        self.frames
            .iter()
            .map(|f| f.target(target).point().is_some())
            .collect()
    }

    /// True when every frame has points for both targets.
    pub fn is_complete(&self) -> bool {
        !self.frames.is_empty()
            && self
                .frames
                .iter()
                .all(|f| f.nerve.point().is_some() && f.fix.point().is_some())
    }
}

/// All trials of one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingStore {
    pub trials: Vec<Trial>,
}

impl TrackingStore {
    /// A store with `trial_count` empty trials over `files`.
    pub fn new(trial_count: usize, files: &[String]) -> Self {
        Self {
            trials: (0..trial_count).map(|_| Trial::empty(files)).collect(),
        }
    }

    /// True when the store holds no frame records at all.
    pub fn is_empty(&self) -> bool {
        self.trials.iter().all(|t| t.frames.is_empty())
    }

    /// Replace one trial with empty records, leaving the others untouched.
    pub fn reset_trial(&mut self, trial: usize, files: &[String]) {
        if let Some(slot) = self.trials.get_mut(trial) {
            *slot = Trial::empty(files);
        }
    }

    /// Rebuild every trial empty.
    pub fn reset_all(&mut self, trial_count: usize, files: &[String]) {
        *self = Self::new(trial_count, files);
    }

    pub fn frame(&self, trial: usize, frame: usize) -> Option<&FrameRecord> {
        self.trials.get(trial)?.frames.get(frame)
    }

    pub fn annotation(&self, trial: usize, frame: usize, target: Target) -> Option<&TargetAnnotation> {
        self.frame(trial, frame).map(|f| f.target(target))
    }

    fn annotation_mut(&mut self, trial: usize, frame: usize, target: Target) -> Option<&mut TargetAnnotation> {
        self.trials
            .get_mut(trial)?
            .frames
            .get_mut(frame)
            .map(|f| f.target_mut(target))
    }

    pub fn rectangle(&self, trial: usize, frame: usize, target: Target) -> Option<Rectangle> {
        self.annotation(trial, frame, target)?.rect()
    }

    pub fn point(&self, trial: usize, frame: usize, target: Target) -> Option<Point> {
        self.annotation(trial, frame, target)?.point()
    }

    /// Set a rectangle with its derived point and a fresh timestamp.
    ///
    /// Returns false when the trial or frame does not exist.
    pub fn set_annotation(&mut self, trial: usize, frame: usize, target: Target, rect: Rectangle) -> bool {
        match self.annotation_mut(trial, frame, target) {
            Some(ann) => {
                ann.set(rect, timestamp());
                true
            }
            None => false,
        }
    }

    /// Remove rectangle and point. Returns false when the slot does not exist.
    pub fn clear_annotation(&mut self, trial: usize, frame: usize, target: Target) -> bool {
        match self.annotation_mut(trial, frame, target) {
            Some(ann) => {
                ann.clear();
                true
            }
            None => false,
        }
    }

    /// Bring the store in line with the folder's current frame list.
    ///
    /// Records that know their file name are matched by name; records
    /// without one are matched by position. Missing trials are added empty
    /// and surplus trials dropped. Returns true when anything changed.
    pub fn align(&mut self, trial_count: usize, files: &[String]) -> bool {
        let mut changed = false;

        if self.trials.len() != trial_count {
            self.trials.resize_with(trial_count, || Trial::empty(files));
            changed = true;
        }

        for trial in &mut self.trials {
            for record in &mut trial.frames {
                if record.nerve.repair() | record.fix.repair() {
                    changed = true;
                }
            }

            let named = trial.frames.iter().any(|r| r.file.is_some());
            let aligned = trial.frames.len() == files.len()
                && trial
                    .frames
                    .iter()
                    .zip(files)
                    .all(|(r, f)| r.file.as_deref() == Some(f.as_str()));
            if aligned {
                continue;
            }
            changed = true;

            let mut old = std::mem::take(&mut trial.frames);
            trial.frames = if named {
                let mut by_name: HashMap<String, FrameRecord> = old
                    .drain(..)
                    .filter_map(|r| r.file.clone().map(|f| (f, r)))
                    .collect();
                files
                    .iter()
                    .map(|f| by_name.remove(f).unwrap_or_else(|| FrameRecord::for_file(Some(f))))
                    .collect()
            } else {
                old.resize_with(files.len(), FrameRecord::default);
                old.into_iter()
                    .zip(files)
                    .map(|(mut r, f)| {
                        r.file = Some(f.clone());
                        r
                    })
                    .collect()
            };
        }

        changed
    }
}

/// Local wall-clock time in the store's timestamp format.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(n: usize) -> Vec<String> {
        (0..n).map(|k| format!("img{:03}.png", k)).collect()
    }

    #[test]
    fn test_new_store_shape() {
        let store = TrackingStore::new(NTRIALS, &files(7));
        assert_eq!(store.trials.len(), NTRIALS);
        for trial in &store.trials {
            assert_eq!(trial.frames.len(), 7);
        }
        assert!(!store.is_empty());
        assert!(TrackingStore::new(NTRIALS, &[]).is_empty());
    }

    #[test]
    fn test_reads_never_panic() {
        let store = TrackingStore::new(NTRIALS, &files(2));
        assert!(store.rectangle(99, 0, Target::Nerve).is_none());
        assert!(store.point(0, 99, Target::Fix).is_none());
        assert!(TrackingStore::default().point(0, 0, Target::Nerve).is_none());
    }

    #[test]
    fn test_set_and_clear_annotation() {
        let mut store = TrackingStore::new(NTRIALS, &files(3));
        assert!(store.set_annotation(1, 2, Target::Fix, Rectangle::new(50, 80, 10, 20)));
        assert_eq!(store.rectangle(1, 2, Target::Fix), Some(Rectangle::new(50, 80, 10, 20)));
        assert_eq!(store.point(1, 2, Target::Fix), Some(Point::new(30, 50)));
        assert!(store.annotation(1, 2, Target::Fix).unwrap().time().is_some());
        assert!(store.point(1, 2, Target::Nerve).is_none());

        assert!(store.clear_annotation(1, 2, Target::Fix));
        assert!(store.rectangle(1, 2, Target::Fix).is_none());
        assert!(store.point(1, 2, Target::Fix).is_none());

        assert!(!store.set_annotation(5, 0, Target::Nerve, Rectangle::new(0, 0, 1, 1)));
        assert!(!store.clear_annotation(0, 3, Target::Nerve));
    }

    #[test]
    fn test_reset_trial_is_idempotent() {
        let names = files(4);
        let mut store = TrackingStore::new(NTRIALS, &names);
        for k in 0..4 {
            store.set_annotation(2, k, Target::Nerve, Rectangle::new(0, 0, 10, 10));
            store.set_annotation(3, k, Target::Fix, Rectangle::new(0, 0, 4, 4));
        }

        store.reset_trial(2, &names);
        let first = serde_json::to_string(&store).unwrap();
        store.reset_trial(2, &names);
        let second = serde_json::to_string(&store).unwrap();
        assert_eq!(first, second);

        assert!(store.point(2, 0, Target::Nerve).is_none());
        assert!(store.point(3, 0, Target::Fix).is_some());
    }

    #[test]
    fn test_reset_all() {
        let names = files(2);
        let mut store = TrackingStore::new(NTRIALS, &names);
        store.set_annotation(0, 0, Target::Nerve, Rectangle::new(0, 0, 2, 2));
        store.reset_all(NTRIALS, &names);
        assert_eq!(store, TrackingStore::new(NTRIALS, &names));
    }

    #[test]
    fn test_trial_status_and_completeness() {
        let names = files(2);
        let mut store = TrackingStore::new(NTRIALS, &names);
        store.set_annotation(0, 0, Target::Nerve, Rectangle::new(0, 0, 2, 2));
        assert_eq!(store.trials[0].status(Target::Nerve), vec![true, false]);
        assert!(!store.trials[0].is_complete());

        for k in 0..2 {
            for target in Target::ALL {
                store.set_annotation(0, k, target, Rectangle::new(0, 0, 2, 2));
            }
        }
        assert!(store.trials[0].is_complete());
        assert!(!TrackingStore::new(1, &[]).trials[0].is_complete());
    }

    #[test]
    fn test_align_by_file_name() {
        let old = vec!["b.png".to_string(), "c.png".to_string()];
        let mut store = TrackingStore::new(NTRIALS, &old);
        store.set_annotation(0, 1, Target::Nerve, Rectangle::new(2, 2, 4, 4));

        let new = vec!["a.png".to_string(), "b.png".to_string(), "c.png".to_string()];
        assert!(store.align(NTRIALS, &new));
        assert_eq!(store.trials[0].frames.len(), 3);
        assert_eq!(store.point(0, 2, Target::Nerve), Some(Point::new(3, 3)));
        assert!(store.point(0, 1, Target::Nerve).is_none());
        assert_eq!(store.trials[0].frames[0].file.as_deref(), Some("a.png"));

        assert!(!store.align(NTRIALS, &new));
    }

    #[test]
    fn test_align_positional_without_names() {
        let json = r#"[[{"nerve": {"rect": {"x1": 0, "y1": 0, "x2": 2, "y2": 2}, "point": {"x": 1, "y": 1}, "time": "t"},
                         "fix": {"rect": {}, "point": {}, "time": ""}}]]"#;
        let mut store: TrackingStore = serde_json::from_str(json).unwrap();
        assert!(store.align(NTRIALS, &files(2)));
        assert_eq!(store.trials.len(), NTRIALS);
        assert_eq!(store.trials[0].frames.len(), 2);
        assert_eq!(store.point(0, 0, Target::Nerve), Some(Point::new(1, 1)));
        assert_eq!(store.trials[0].frames[0].file.as_deref(), Some("img000.png"));
    }
}
