// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the tracking application.

pub mod canvas;
pub mod help;
pub mod plot;
pub mod status;
pub mod toolbar;
