// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Segment exporter: crop each final segment out of the original page image and
// write one image file per question.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use quizcut_core::config::ExportConfig;
use quizcut_core::error::{QuizcutError, Result};
use quizcut_core::types::{ImageFormatKind, Segment};
use tracing::{debug, info, instrument, warn};

use crate::page::Page;

/// Writes question crops named `{prefix}_{page:03}_q_{index:03}.{ext}`.
#[derive(Debug, Clone, Default)]
pub struct SegmentExporter {
    config: ExportConfig,
}

impl SegmentExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// File name for the `index`-th (1-based) question of page `page`.
    pub fn file_name(&self, page: u32, index: usize) -> String {
        format!(
            "{}_{:03}_q_{:03}.{}",
            self.config.prefix,
            page,
            index,
            self.config.format.extension()
        )
    }

    /// Crop the full-width rows of `segment` from the page image.
    pub fn crop(page: &Page, segment: Segment) -> Result<DynamicImage> {
        if segment.bottom() > page.height() {
            return Err(QuizcutError::InvalidInput(format!(
                "segment {} extends past page {} height {}",
                segment,
                page.number(),
                page.height()
            )));
        }
        Ok(page
            .image()
            .crop_imm(0, segment.top(), page.width(), segment.height()))
    }

    /// Write every segment of `page` into `out_dir`, creating it if missing.
    ///
    /// Returns the written paths in segment order. The first failure aborts the
    /// page and removes the files already written for it.
    #[instrument(skip_all, fields(page = page.number(), segments = segments.len(), dir = %out_dir.display()))]
    pub fn export(&self, page: &Page, segments: &[Segment], out_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir).map_err(|err| QuizcutError::Export {
            path: out_dir.to_path_buf(),
            reason: format!("cannot create output directory: {}", err),
        })?;

        let mut written = Vec::with_capacity(segments.len());
        for (i, &segment) in segments.iter().enumerate() {
            let path = out_dir.join(self.file_name(page.number(), i + 1));
            let result = Self::crop(page, segment).and_then(|crop| self.write(&crop, &path));
            if let Err(err) = result {
                // A partial file may exist at `path` too.
                written.push(path);
                remove_all(&written);
                return Err(err);
            }
            debug!(path = %path.display(), %segment, "Question written");
            written.push(path);
        }

        info!(written = written.len(), "Page exported");
        Ok(written)
    }

    fn write(&self, image: &DynamicImage, path: &Path) -> Result<()> {
        let export_err = |reason: String| QuizcutError::Export {
            path: path.to_path_buf(),
            reason,
        };

        match self.config.format {
            ImageFormatKind::Jpeg => {
                let file = File::create(path).map_err(|err| export_err(err.to_string()))?;
                let mut writer = BufWriter::new(file);
                // JPEG has no alpha channel.
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(&mut writer, self.config.jpeg_quality)
                    .encode_image(&rgb)
                    .map_err(|err| export_err(err.to_string()))?;
                writer.flush().map_err(|err| export_err(err.to_string()))
            }
            ImageFormatKind::Png => image
                .save_with_format(path, ImageFormat::Png)
                .map_err(|err| export_err(err.to_string())),
        }
    }
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed partial export"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "Could not remove partial export"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn gradient_page(number: u32, height: u32) -> Page {
        let img = GrayImage::from_fn(40, height, |_, y| Luma([(y % 256) as u8]));
        Page::new(number, DynamicImage::ImageLuma8(img)).unwrap()
    }

    #[test]
    fn names_are_zero_padded() {
        let exporter = SegmentExporter::default();
        assert_eq!(exporter.file_name(3, 12), "page_003_q_012.jpg");

        let png = SegmentExporter::new(ExportConfig {
            prefix: "mock".into(),
            format: ImageFormatKind::Png,
            ..ExportConfig::default()
        });
        assert_eq!(png.file_name(120, 1), "mock_120_q_001.png");
    }

    #[test]
    fn crop_spans_full_width() {
        let page = gradient_page(1, 200);
        let crop = SegmentExporter::crop(&page, Segment::new(50, 120)).unwrap();
        assert_eq!((crop.width(), crop.height()), (40, 70));
        assert_eq!(crop.to_luma8().get_pixel(0, 0)[0], 50);
    }

    #[test]
    fn crop_past_bottom_is_rejected() {
        let page = gradient_page(1, 100);
        assert!(matches!(
            SegmentExporter::crop(&page, Segment::new(50, 120)),
            Err(QuizcutError::InvalidInput(_))
        ));
    }

    #[test]
    fn export_writes_one_file_per_segment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let page = gradient_page(2, 300);
        let segments = [Segment::new(0, 10), Segment::new(10, 200), Segment::new(200, 300)];

        let paths = SegmentExporter::default()
            .export(&page, &segments, &out)
            .unwrap();

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], out.join("page_002_q_001.jpg"));
        assert_eq!(paths[2], out.join("page_002_q_003.jpg"));
        let third = image::open(&paths[2]).unwrap();
        assert_eq!((third.width(), third.height()), (40, 100));
    }

    #[test]
    fn png_export_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SegmentExporter::new(ExportConfig {
            format: ImageFormatKind::Png,
            ..ExportConfig::default()
        });
        let page = gradient_page(1, 100);
        let paths = exporter
            .export(&page, &[Segment::new(0, 100)], dir.path())
            .unwrap();
        let back = image::open(&paths[0]).unwrap().to_luma8();
        assert_eq!(back.get_pixel(5, 77)[0], 77);
    }

    #[test]
    fn unwritable_directory_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = SegmentExporter::default()
            .export(&gradient_page(1, 100), &[Segment::new(0, 100)], &blocker.join("out"))
            .unwrap_err();
        assert!(matches!(err, QuizcutError::Export { .. }));
    }

    #[test]
    fn failed_page_leaves_no_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let page = gradient_page(4, 100);
        // The third segment runs past the page bottom.
        let segments = [Segment::new(0, 30), Segment::new(30, 60), Segment::new(60, 140)];

        let err = SegmentExporter::default()
            .export(&page, &segments, dir.path())
            .unwrap_err();
        assert!(matches!(err, QuizcutError::InvalidInput(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn jpeg_write_error_is_not_swallowed() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        // Small enough to sit in the write buffer until it is flushed.
        let crop = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([0u8])));
        let err = SegmentExporter::default().write(&crop, full).unwrap_err();
        assert!(matches!(err, QuizcutError::Export { .. }));
    }
}
