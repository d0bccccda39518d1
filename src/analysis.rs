// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Aggregation of a tracking store.
//!
//! Flattens the trial/frame/target hierarchy into point records for export
//! and derives the displacement of the tracked object relative to the fixed
//! point for each fully annotated trial.

use crate::models::annotation::Target;
use crate::models::store::TrackingStore;
use std::path::Path;

/// One annotated point with everything needed for a row of the export.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    /// (variable name, path segment) pairs
    pub variables: Vec<(String, String)>,
    pub folder: String,
    /// 1-based trial number
    pub trial: usize,
    pub time: String,
    pub file: String,
    /// 1-based frame number
    pub image_no: usize,
    pub object: Target,
    pub x: f64,
    pub y: f64,
}

/// Pair the last `variables.len()` segments of `folder` with the variable
/// names, in order.
pub fn bind_variables(folder: &Path, variables: &[String]) -> Vec<(String, String)> {
    let segments: Vec<String> = folder
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.len() < variables.len() {
        log::warn!(
            "Folder {} has {} path segments for {} variables",
            folder.display(),
            segments.len(),
            variables.len()
        );
    }
    let tail = &segments[segments.len().saturating_sub(variables.len())..];
    variables.iter().cloned().zip(tail.iter().cloned()).collect()
}

/// Every present point of the store, ordered by trial, then target, then frame.
pub fn gather_points<'a>(
    store: &'a TrackingStore,
    folder: &'a Path,
    frames: &'a [String],
    variables: &[String],
) -> impl Iterator<Item = PointRecord> + 'a {
    let bindings = bind_variables(folder, variables);
    let folder_name = folder.display().to_string();

    store.trials.iter().enumerate().flat_map(move |(t, trial)| {
        let bindings = bindings.clone();
        let folder_name = folder_name.clone();
        Target::ALL.into_iter().flat_map(move |target| {
            let bindings = bindings.clone();
            let folder_name = folder_name.clone();
            trial.frames.iter().enumerate().filter_map(move |(k, record)| {
                let ann = record.target(target);
                let point = ann.point()?;
                let file = frames
                    .get(k)
                    .cloned()
                    .or_else(|| record.file.clone())
                    .unwrap_or_default();
                Some(PointRecord {
                    variables: bindings.clone(),
                    folder: folder_name.clone(),
                    trial: t + 1,
                    time: ann.time().unwrap_or_default().to_string(),
                    file,
                    image_no: k + 1,
                    object: target,
                    x: point.x as f64,
                    y: point.y as f64,
                })
            })
        })
    })
}

/// Displacement of the nerve relative to the fixed point over one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementSeries {
    /// 1-based trial number
    pub trial: usize,
    /// One (x, y) sample per frame after the first
    pub points: Vec<[f64; 2]>,
}

/// Cumulative sum of successive differences.
fn cumulative_diff(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .scan(0.0, |acc, w| {
            *acc += w[1] - w[0];
            Some(*acc)
        })
        .collect()
}

/// Series for every trial where all frames carry both points.
///
/// Trials with any missing point are skipped entirely.
pub fn compute_displacement_series(store: &TrackingStore) -> Vec<DisplacementSeries> {
    let mut series = Vec::new();
    for (t, trial) in store.trials.iter().enumerate() {
        if !trial.is_complete() {
            continue;
        }
        let coords = |target: Target| -> (Vec<f64>, Vec<f64>) {
            trial
                .frames
                .iter()
                .filter_map(|f| f.target(target).point())
                .map(|p| (p.x as f64, p.y as f64))
                .unzip()
        };
        let (nx, ny) = coords(Target::Nerve);
        let (fx, fy) = coords(Target::Fix);

        let dx: Vec<f64> = cumulative_diff(&nx)
            .into_iter()
            .zip(cumulative_diff(&fx))
            .map(|(n, f)| n - f)
            .collect();
        let dy: Vec<f64> = cumulative_diff(&ny)
            .into_iter()
            .zip(cumulative_diff(&fy))
            .map(|(n, f)| n - f)
            .collect();

        series.push(DisplacementSeries {
            trial: t + 1,
            points: dx.into_iter().zip(dy).map(|(x, y)| [x, y]).collect(),
        });
    }
    series
}
