// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page and per-run outcomes, and the JSON manifest written next to the
// exported questions.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quizcut_core::error::{QuizcutError, Result};
use quizcut_core::types::{BackendKind, Segment};
use serde::{Deserialize, Serialize};
use tracing::info;

/// File name of the run manifest inside the output directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Outcome of a successfully processed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Segments proposed from whitespace alone.
    pub candidates: usize,
    /// Final question segments, top to bottom.
    pub segments: Vec<Segment>,
    /// Boxes returned by the recognizer.
    pub boxes: usize,
    /// Recognition failed or timed out and the page was refined without text.
    pub degraded: bool,
    /// Exported question images, in segment order.
    pub outputs: Vec<PathBuf>,
}

/// A page that produced no output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub error: String,
}

/// Everything a batch run did, ordered by page number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub backend: BackendKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages: Vec<PageReport>,
    pub failures: Vec<PageFailure>,
    /// Pages never submitted because the run was stopped.
    pub skipped: usize,
}

impl BatchReport {
    /// Total number of questions exported.
    pub fn question_count(&self) -> usize {
        self.pages.iter().map(|p| p.outputs.len()).sum()
    }

    pub fn degraded_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.degraded).count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Write the report as `manifest.json` into `dir` and return its path.
    pub fn write_manifest(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE_NAME);
        self.write_json(&path)?;
        info!(path = %path.display(), "Manifest written");
        Ok(path)
    }

    fn write_json(&self, path: &Path) -> Result<()> {
        let export_err = |err: std::io::Error| QuizcutError::Export {
            path: path.to_path_buf(),
            reason: err.to_string(),
        };
        let mut writer = BufWriter::new(File::create(path).map_err(export_err)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(export_err)
    }

    /// Load a manifest previously written by [`write_manifest`](Self::write_manifest).
    pub fn read_manifest(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BatchReport {
        let now = Utc::now();
        BatchReport {
            backend: BackendKind::Disabled,
            started_at: now,
            finished_at: now,
            pages: vec![PageReport {
                page: 1,
                source: Some(PathBuf::from("scan/p1.png")),
                width: 100,
                height: 300,
                candidates: 3,
                segments: vec![Segment::new(0, 300)],
                boxes: 0,
                degraded: true,
                outputs: vec![PathBuf::from("out/page_001_q_001.jpg")],
            }],
            failures: vec![PageFailure {
                page: 2,
                source: None,
                error: "invalid input: zero-area".into(),
            }],
            skipped: 0,
        }
    }

    #[test]
    fn counts() {
        let report = sample();
        assert_eq!(report.question_count(), 1);
        assert_eq!(report.degraded_pages(), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample();
        let path = report.write_manifest(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), MANIFEST_FILE_NAME);

        let back = BatchReport::read_manifest(&path).unwrap();
        assert_eq!(back.pages, report.pages);
        assert_eq!(back.failures, report.failures);
        assert_eq!(back.backend, BackendKind::Disabled);
    }

    #[test]
    fn manifest_omits_missing_sources() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json["failures"][0].get("source").is_none());
        assert_eq!(json["pages"][0]["segments"][0]["bottom"], 300);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn manifest_write_error_is_reported() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        assert!(matches!(
            sample().write_json(full),
            Err(QuizcutError::Export { .. })
        ));
    }
}
