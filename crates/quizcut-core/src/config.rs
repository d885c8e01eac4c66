// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration: segmentation tunables, recognition backend
// selection, export naming, batch limits, and book layout.
//
// Every struct carries `#[serde(default)]` so a partial JSON file only needs
// the keys it wants to override.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuizcutError, Result};
use crate::types::{BackendKind, ImageFormatKind, PaperSize};

/// Adaptive-threshold and closing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeConfig {
    /// Side of the square neighbourhood used for the local mean (odd).
    pub window_size: u32,
    /// Constant subtracted from the local mean before comparison.
    pub offset: i32,
    /// Side of the square structuring element used for closing (odd).
    pub close_kernel: u32,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            window_size: 31,
            offset: 15,
            close_kernel: 3,
        }
    }
}

/// Whitespace-gap detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Minimum run of empty rows that counts as a cut.
    pub min_gap_height: u32,
    /// Segments shorter than this are folded into their predecessor.
    pub min_segment_height: u32,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            min_gap_height: 30,
            min_segment_height: 60,
        }
    }
}

/// Merge refinement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Fraction of a segment's height inspected for a leading number.
    pub head_band_fraction: f32,
    /// Lower bound on the head band height in pixels.
    pub min_head_band_px: u32,
    /// Boxes below this confidence (0–100) are ignored.
    pub min_confidence: f32,
    /// Number of characters of head-band text fed to the matcher.
    pub head_sample_chars: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            head_band_fraction: 0.25,
            min_head_band_px: 10,
            min_confidence: 40.0,
            head_sample_chars: 50,
        }
    }
}

/// All tunables of the page segmentation engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub binarize: BinarizeConfig,
    pub gaps: GapConfig,
    pub refine: RefineConfig,
}

impl SegmenterConfig {
    /// Reject tunables the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let b = &self.binarize;
        if b.window_size < 3 || b.window_size % 2 == 0 {
            return Err(QuizcutError::Configuration(format!(
                "binarize.window_size must be an odd number >= 3, got {}",
                b.window_size
            )));
        }
        if b.close_kernel == 0 || b.close_kernel % 2 == 0 || b.close_kernel > 511 {
            return Err(QuizcutError::Configuration(format!(
                "binarize.close_kernel must be an odd number between 1 and 511, got {}",
                b.close_kernel
            )));
        }
        if self.gaps.min_gap_height == 0 {
            return Err(QuizcutError::Configuration(
                "gaps.min_gap_height must be at least 1".into(),
            ));
        }
        let r = &self.refine;
        if !(r.head_band_fraction > 0.0 && r.head_band_fraction <= 1.0) {
            return Err(QuizcutError::Configuration(format!(
                "refine.head_band_fraction must be in (0, 1], got {}",
                r.head_band_fraction
            )));
        }
        if !(0.0..=100.0).contains(&r.min_confidence) {
            return Err(QuizcutError::Configuration(format!(
                "refine.min_confidence must be in [0, 100], got {}",
                r.min_confidence
            )));
        }
        if r.head_sample_chars == 0 {
            return Err(QuizcutError::Configuration(
                "refine.head_sample_chars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Recognition backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Explicit backend. `None` picks the best available local backend and
    /// degrades to no recognition if there is none.
    pub backend: Option<BackendKind>,
    /// Language/script hint (Tesseract language code).
    pub language: String,
    /// Directory holding the `ocrs` model files. Defaults to the ocrs cache.
    pub model_dir: Option<PathBuf>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            backend: None,
            language: "chi_sim".to_string(),
            model_dir: None,
        }
    }
}

/// Naming and encoding of exported question images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name prefix, e.g. `page` → `page_001_q_001.jpg`.
    pub prefix: String,
    pub format: ImageFormatKind,
    /// JPEG quality (1-100). Ignored for PNG.
    pub jpeg_quality: u8,
    /// Write `manifest.json` next to the crops.
    pub write_manifest: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            prefix: "page".to_string(),
            format: ImageFormatKind::Jpeg,
            jpeg_quality: 90,
            write_manifest: true,
        }
    }
}

/// Limits for multi-page runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pages processed at once. `0` means the machine's available parallelism.
    pub max_concurrent_pages: usize,
    /// Per-page recognition timeout in seconds. `None` waits indefinitely.
    pub recognition_timeout_secs: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 0,
            recognition_timeout_secs: Some(120),
        }
    }
}

/// Practice-book page layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub paper_size: PaperSize,
    pub dpi: u32,
    /// Questions stacked on each page.
    pub questions_per_page: usize,
    /// Horizontal offset of the stack from the left page edge, in pixels.
    pub offset_x: u32,
    /// Vertical offset of the stack from the top page edge, in pixels.
    pub offset_y: u32,
    pub title: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            dpi: 300,
            questions_per_page: 2,
            offset_x: 0,
            offset_y: 100,
            title: "Practice Book".to_string(),
        }
    }
}

impl BookConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(QuizcutError::Configuration("book.dpi must be positive".into()));
        }
        if self.questions_per_page == 0 {
            return Err(QuizcutError::Configuration(
                "book.questions_per_page must be at least 1".into(),
            ));
        }
        let (w, h) = self.paper_size.dimensions_px(self.dpi);
        if self.offset_x >= w || self.offset_y >= h {
            return Err(QuizcutError::Configuration(format!(
                "book offsets ({}, {}) fall outside the {}x{} px page",
                self.offset_x, self.offset_y, w, h
            )));
        }
        Ok(())
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub segmenter: SegmenterConfig,
    pub recognition: RecognitionConfig,
    pub export: ExportConfig,
    pub batch: BatchConfig,
    pub book: BookConfig,
}

impl AppConfig {
    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.segmenter.validate()?;
        self.book.validate()?;
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(QuizcutError::Configuration(format!(
                "export.jpeg_quality must be in 1..=100, got {}",
                self.export.jpeg_quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_tunables() {
        let config = SegmenterConfig::default();
        assert_eq!(config.binarize.window_size, 31);
        assert_eq!(config.binarize.offset, 15);
        assert_eq!(config.binarize.close_kernel, 3);
        assert_eq!(config.gaps.min_gap_height, 30);
        assert_eq!(config.gaps.min_segment_height, 60);
        assert_eq!(config.refine.head_band_fraction, 0.25);
        assert_eq!(config.refine.min_head_band_px, 10);
        assert_eq!(config.refine.min_confidence, 40.0);
        assert_eq!(config.refine.head_sample_chars, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "segmenter": { "gaps": { "min_gap_height": 12 } } }"#)
                .unwrap();
        assert_eq!(config.segmenter.gaps.min_gap_height, 12);
        assert_eq!(config.segmenter.gaps.min_segment_height, 60);
        assert_eq!(config.export.prefix, "page");
        assert_eq!(config.recognition.language, "chi_sim");
    }

    #[test]
    fn even_window_is_rejected() {
        let mut config = SegmenterConfig::default();
        config.binarize.window_size = 30;
        assert!(matches!(
            config.validate(),
            Err(QuizcutError::Configuration(_))
        ));
    }

    #[test]
    fn head_fraction_out_of_range_is_rejected() {
        let mut config = SegmenterConfig::default();
        config.refine.head_band_fraction = 0.0;
        assert!(config.validate().is_err());
        config.refine.head_band_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn book_offsets_must_land_on_page() {
        let mut book = BookConfig::default();
        assert!(book.validate().is_ok());
        book.offset_y = 10_000;
        assert!(book.validate().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizcut.json");

        let mut config = AppConfig::default();
        config.export.prefix = "exam".into();
        config.recognition.backend = Some(BackendKind::Tesseract);
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
