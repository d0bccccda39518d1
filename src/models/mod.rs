// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: annotations and the per-folder tracking store.

pub mod annotation;
pub mod store;
