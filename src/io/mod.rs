// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: folder discovery, frames, stores and the results table.

pub mod discovery;
pub mod export;
pub mod media;
pub mod serialization;
