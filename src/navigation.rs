// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Navigation cursor.
//!
//! Holds the folder, frame and trial indices together with the target mode,
//! the manual flag and the selected tracker. Every move wraps around; no
//! transition is ever rejected.

use crate::models::annotation::Target;
use crate::tracking::BackendKind;

/// Next index modulo `len`; stays at 0 when there is nothing to visit.
pub fn wrap_next(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (index + 1) % len
    }
}

/// Previous index modulo `len`; stays at 0 when there is nothing to visit.
pub fn wrap_prev(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (index + len - 1) % len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub folder: usize,
    pub frame: usize,
    pub trial: usize,
    pub target: Target,
    /// Draw rectangles without tracking
    pub manual: bool,
    pub backend: BackendKind,
}

impl Navigation {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            folder: 0,
            frame: 0,
            trial: 0,
            target: Target::Nerve,
            manual: false,
            backend,
        }
    }

    pub fn next_frame(&mut self, frame_count: usize) {
        self.frame = wrap_next(self.frame, frame_count);
    }

    pub fn prev_frame(&mut self, frame_count: usize) {
        self.frame = wrap_prev(self.frame, frame_count);
    }

    /// Move to the next folder, restarting at its first frame on the nerve.
    pub fn next_folder(&mut self, folder_count: usize) {
        self.folder = wrap_next(self.folder, folder_count);
        self.enter_folder();
    }

    pub fn prev_folder(&mut self, folder_count: usize) {
        self.folder = wrap_prev(self.folder, folder_count);
        self.enter_folder();
    }

    fn enter_folder(&mut self) {
        self.frame = 0;
        self.target = Target::Nerve;
    }

    /// Trial switches always restart target selection at the nerve.
    pub fn next_trial(&mut self, trial_count: usize) {
        self.trial = wrap_next(self.trial, trial_count);
        self.target = Target::Nerve;
    }

    pub fn toggle_target(&mut self) {
        self.target = self.target.toggled();
    }

    pub fn toggle_manual(&mut self) {
        self.manual = !self.manual;
    }

    pub fn select_backend(&mut self, backend: BackendKind) {
        self.backend = backend;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_arithmetic() {
        assert_eq!(wrap_next(4, 5), 0);
        assert_eq!(wrap_prev(0, 5), 4);
        assert_eq!(wrap_next(1, 5), 2);
        assert_eq!(wrap_prev(3, 5), 2);
        assert_eq!(wrap_next(0, 0), 0);
        assert_eq!(wrap_prev(0, 0), 0);
        assert_eq!(wrap_next(0, 1), 0);
    }

    #[test]
    fn test_frame_wraps_both_ways() {
        let mut nav = Navigation::new(BackendKind::Mil);
        nav.frame = 6;
        nav.next_frame(7);
        assert_eq!(nav.frame, 0);
        nav.prev_frame(7);
        assert_eq!(nav.frame, 6);
    }

    #[test]
    fn test_folder_change_resets_frame_and_target() {
        let mut nav = Navigation::new(BackendKind::Mil);
        nav.frame = 3;
        nav.target = Target::Fix;
        nav.prev_folder(3);
        assert_eq!((nav.folder, nav.frame, nav.target), (2, 0, Target::Nerve));
        nav.next_folder(3);
        assert_eq!(nav.folder, 0);
    }

    #[test]
    fn test_trial_wraps_and_resets_target() {
        let mut nav = Navigation::new(BackendKind::Mil);
        nav.trial = 4;
        nav.toggle_target();
        nav.next_trial(5);
        assert_eq!((nav.trial, nav.target), (0, Target::Nerve));
    }

    #[test]
    fn test_pure_toggles() {
        let mut nav = Navigation::new(BackendKind::Mil);
        nav.toggle_manual();
        nav.toggle_target();
        nav.select_backend(BackendKind::Csrt);
        assert!(nav.manual);
        assert_eq!(nav.target, Target::Fix);
        assert_eq!(nav.backend, BackendKind::Csrt);
        assert_eq!((nav.folder, nav.frame, nav.trial), (0, 0, 0));
    }
}
