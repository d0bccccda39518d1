// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Results table export.
//!
//! Reads the stores of all folders independently of the live session,
//! scales the point coordinates and writes one semicolon separated table
//! with decimal commas.

use crate::analysis::{gather_points, PointRecord};
use crate::io::{discovery, serialization};
use crate::models::store::NTRIALS;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Outcome of an export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub rows: usize,
    /// False when the destination could not be opened for lack of permission
    pub written: bool,
}

/// Gather every folder's points and write them to `destination`.
///
/// Folders without a readable store contribute no rows; no store is
/// created or rewritten. A permission error on the destination is logged
/// and reported through [`ExportReport::written`]; every other I/O error
/// is returned.
pub fn export_all(
    folders: &[PathBuf],
    image_format: &str,
    variables: &[String],
    scaling_factor: f64,
    destination: &Path,
) -> Result<ExportReport> {
    let mut records = Vec::new();
    for folder in folders {
        let frames = discovery::list_frames(folder, image_format)?;
        let mut store = match serialization::load_store(folder) {
            Ok(Some(store)) => store,
            Ok(None) => {
                log::info!("No tracking data in {}", folder.display());
                continue;
            }
            Err(e) => {
                log::error!("Skipping {} in export: {:#}", folder.display(), e);
                continue;
            }
        };
        // Frames may have changed since the store was written
        if store.align(NTRIALS, &frames) {
            log::warn!("Tracking data of {} re-aligned to its frames for export", folder.display());
        }
        records.extend(gather_points(&store, folder, &frames, variables));
    }

    for record in &mut records {
        record.x *= scaling_factor;
        record.y *= scaling_factor;
    }

    let rows = records.len();
    let file = match File::create(destination) {
        Ok(file) => file,
        Err(e) => {
            create_failure(destination, e)?;
            return Ok(ExportReport {
                path: destination.to_path_buf(),
                rows,
                written: false,
            });
        }
    };

    let mut writer = BufWriter::new(file);
    write_table(&mut writer, &records, variables)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    log::info!("Output successfully written to {} ({} rows)", destination.display(), rows);
    Ok(ExportReport {
        path: destination.to_path_buf(),
        rows,
        written: true,
    })
}

/// Handle a failed create of the destination. A permission problem (the
/// table is usually open in a spreadsheet) is logged and tolerated; any
/// other error is returned.
fn create_failure(destination: &Path, e: std::io::Error) -> Result<()> {
    if e.kind() == ErrorKind::PermissionDenied {
        log::error!("Cannot access output file {}: {}", destination.display(), e);
        return Ok(());
    }
    Err(e).with_context(|| format!("Failed to create {}", destination.display()))
}

/// Write header and rows: `x;y;<variables>;folder;trial;time;file;image_no;object`.
pub fn write_table<W: Write>(out: W, records: &[PointRecord], variables: &[String]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(out);

    let mut header: Vec<&str> = vec!["x", "y"];
    header.extend(variables.iter().map(String::as_str));
    header.extend(["folder", "trial", "time", "file", "image_no", "object"]);
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![format_decimal(record.x), format_decimal(record.y)];
        for name in variables {
            let value = record
                .variables
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            row.push(value);
        }
        row.push(record.folder.clone());
        row.push(record.trial.to_string());
        row.push(record.time.clone());
        row.push(record.file.clone());
        row.push(record.image_no.to_string());
        row.push(record.object.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Format a float with a decimal comma, keeping one decimal for whole numbers.
fn format_decimal(value: f64) -> String {
    let text = if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    };
    text.replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Rectangle, Target};
    use crate::models::store::{TrackingStore, NTRIALS};
    use tempfile::tempdir;

    fn parse_decimal(text: &str) -> f64 {
        text.replace(',', ".").parse().unwrap()
    }

    fn make_folder(root: &Path, rel: &str, frames: usize) -> (PathBuf, Vec<String>) {
        let folder = root.join(rel);
        std::fs::create_dir_all(&folder).unwrap();
        let names: Vec<String> = (0..frames).map(|k| format!("{:02}.png", k)).collect();
        for name in &names {
            std::fs::write(folder.join(name), b"").unwrap();
        }
        (folder, names)
    }

    #[test]
    fn test_export_scales_coordinates() {
        let dir = tempdir().unwrap();
        let (folder, names) = make_folder(dir.path(), "s01", 3);
        let mut store = TrackingStore::new(NTRIALS, &names);
        for t in 0..NTRIALS {
            for k in 0..names.len() {
                store.set_annotation(t, k, Target::Nerve, Rectangle::new(8, 18, 12, 22));
            }
        }
        serialization::persist_store(&store, &folder).unwrap();

        let dest = dir.path().join("results.csv");
        let vars = vec!["subject".to_string()];
        let report = export_all(&[folder], "png", &vars, 2.0, &dest).unwrap();
        assert!(report.written);
        assert_eq!(report.rows, NTRIALS * 3);

        let text = std::fs::read_to_string(&dest).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "x;y;subject;folder;trial;time;file;image_no;object"
        );
        let rows: Vec<Vec<&str>> = lines.map(|l| l.split(';').collect()).collect();
        assert_eq!(rows.len(), NTRIALS * 3);
        for row in &rows {
            assert_eq!(parse_decimal(row[0]), 20.0);
            assert_eq!(parse_decimal(row[1]), 40.0);
            assert_eq!(row[2], "s01");
            assert_eq!(row[8], "nerve");
        }
        assert_eq!(rows[0][0], "20,0");
        assert_eq!(rows[0][4], "1");
        assert_eq!(rows[0][6], "00.png");
        assert_eq!(rows[0][7], "1");
    }

    #[test]
    fn test_export_skips_folders_without_store() {
        let dir = tempdir().unwrap();
        let (a, names) = make_folder(dir.path(), "a", 2);
        let (b, _) = make_folder(dir.path(), "b", 2);
        let mut store = TrackingStore::new(NTRIALS, &names);
        store.set_annotation(0, 0, Target::Fix, Rectangle::new(0, 0, 3, 3));
        serialization::persist_store(&store, &a).unwrap();

        let dest = dir.path().join("out.csv");
        let report = export_all(&[a, b.clone()], "png", &[], 0.5, &dest).unwrap();
        assert_eq!(report.rows, 1);
        assert!(!serialization::store_path(&b).exists());

        let text = std::fs::read_to_string(&dest).unwrap();
        let row: Vec<&str> = text.lines().nth(1).unwrap().split(';').collect();
        assert_eq!(row[0], "0,5");
        assert_eq!(row[7], "fix");
    }

    #[test]
    fn test_export_missing_destination_dir_is_error() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("missing").join("results.csv");
        assert!(export_all(&[], "png", &[], 1.0, &dest).is_err());
    }

    #[test]
    fn test_export_uses_current_frame_identity() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("s01");
        std::fs::create_dir_all(&folder).unwrap();
        let old_frames = vec!["b.png".to_string(), "c.png".to_string()];
        for name in &old_frames {
            std::fs::write(folder.join(name), b"").unwrap();
        }
        let mut store = TrackingStore::new(NTRIALS, &old_frames);
        store.set_annotation(0, 1, Target::Nerve, Rectangle::new(4, 4, 8, 8));
        serialization::persist_store(&store, &folder).unwrap();
        let saved = std::fs::read_to_string(serialization::store_path(&folder)).unwrap();

        // A frame sorted ahead of the others shows up before the next export
        std::fs::write(folder.join("a.png"), b"").unwrap();

        let dest = dir.path().join("results.csv");
        let report = export_all(&[folder.clone()], "png", &[], 1.0, &dest).unwrap();
        assert_eq!(report.rows, 1);

        let text = std::fs::read_to_string(&dest).unwrap();
        let row: Vec<&str> = text.lines().nth(1).unwrap().split(';').collect();
        assert_eq!(row[5], "c.png");
        assert_eq!(row[6], "3");

        // Export does not rewrite the store
        assert_eq!(std::fs::read_to_string(serialization::store_path(&folder)).unwrap(), saved);
    }

    #[test]
    fn test_export_skips_malformed_store() {
        let dir = tempdir().unwrap();
        let (a, names) = make_folder(dir.path(), "a", 2);
        let (b, _) = make_folder(dir.path(), "b", 2);
        let mut store = TrackingStore::new(NTRIALS, &names);
        store.set_annotation(0, 1, Target::Nerve, Rectangle::new(0, 0, 4, 4));
        serialization::persist_store(&store, &a).unwrap();
        std::fs::write(serialization::store_path(&b), "{ not json").unwrap();

        let dest = dir.path().join("results.csv");
        let report = export_all(&[a, b.clone()], "png", &[], 1.0, &dest).unwrap();
        assert!(report.written);
        assert_eq!(report.rows, 1);
        assert_eq!(std::fs::read_to_string(serialization::store_path(&b)).unwrap(), "{ not json");
    }

    #[test]
    fn test_permission_denied_is_not_fatal() {
        let dest = Path::new("results.csv");
        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(create_failure(dest, denied).is_ok());
        let missing = std::io::Error::from(ErrorKind::NotFound);
        assert!(create_failure(dest, missing).is_err());
    }

    #[test]
    fn test_fields_are_quoted_when_needed() {
        let record = PointRecord {
            variables: vec![("side".to_string(), "left;right".to_string())],
            folder: "root/s01".to_string(),
            trial: 2,
            time: "2025-01-02 03:04:05".to_string(),
            file: "say \"hi\".png".to_string(),
            image_no: 1,
            object: Target::Fix,
            x: 2.5,
            y: -3.0,
        };
        let mut out = Vec::new();
        write_table(&mut out, &[record], &["side".to_string()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "x;y;side;folder;trial;time;file;image_no;object");
        assert_eq!(
            lines.next().unwrap(),
            "2,5;-3,0;\"left;right\";root/s01;2;2025-01-02 03:04:05;\"say \"\"hi\"\".png\";1;fix"
        );
    }
}
