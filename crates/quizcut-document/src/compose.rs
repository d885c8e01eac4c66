// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book composition: stack exported questions a few at a time and lay each
// stack onto a blank paper-sized page, ready for the PDF writer.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use quizcut_core::config::BookConfig;
use quizcut_core::error::{QuizcutError, Result};
use tracing::{debug, info, instrument};

use crate::page::list_images;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Lays question images out as practice-book pages.
#[derive(Debug, Clone)]
pub struct BookComposer {
    config: BookConfig,
}

impl BookComposer {
    pub fn new(config: BookConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Page size in pixels at the configured density.
    pub fn page_size_px(&self) -> (u32, u32) {
        self.config.paper_size.dimensions_px(self.config.dpi)
    }

    /// Append images top to bottom, left-aligned on a white canvas as wide as
    /// the widest of them.
    pub fn stack(images: &[DynamicImage]) -> Result<RgbImage> {
        let width = images.iter().map(DynamicImage::width).max().unwrap_or(0);
        let height: u32 = images.iter().map(DynamicImage::height).sum();
        if width == 0 || height == 0 {
            return Err(QuizcutError::InvalidInput(
                "nothing to stack: no non-empty images".into(),
            ));
        }

        let mut canvas = RgbImage::from_pixel(width, height, WHITE);
        let mut y = 0i64;
        for image in images {
            imageops::replace(&mut canvas, &image.to_rgb8(), 0, y);
            y += image.height() as i64;
        }
        Ok(canvas)
    }

    /// Place a stack on a blank page: centred horizontally then shifted by
    /// `offset_x`, `offset_y` pixels from the top. A stack that does not fit
    /// below the offsets is scaled down uniformly.
    pub fn place(&self, stack: &RgbImage) -> RgbImage {
        let (page_w, page_h) = self.page_size_px();
        let (offset_x, offset_y) = (self.config.offset_x, self.config.offset_y);
        let (avail_w, avail_h) = (page_w - offset_x, page_h - offset_y);

        let scale = (avail_w as f64 / stack.width() as f64)
            .min(avail_h as f64 / stack.height() as f64)
            .min(1.0);
        let scaled = if scale < 1.0 {
            let w = ((stack.width() as f64 * scale).floor() as u32).clamp(1, avail_w);
            let h = ((stack.height() as f64 * scale).floor() as u32).clamp(1, avail_h);
            debug!(scale, w, h, "Stack scaled to fit page");
            imageops::resize(stack, w, h, FilterType::Triangle)
        } else {
            stack.clone()
        };

        let x = ((page_w - scaled.width()) / 2 + offset_x).min(page_w - scaled.width());
        let mut page = RgbImage::from_pixel(page_w, page_h, WHITE);
        imageops::replace(&mut page, &scaled, x as i64, offset_y as i64);
        page
    }

    /// Compose pages from question images, `questions_per_page` at a time.
    #[instrument(skip_all, fields(images = images.len(), per_page = self.config.questions_per_page))]
    pub fn compose(&self, images: &[DynamicImage]) -> Result<Vec<RgbImage>> {
        if images.is_empty() {
            return Err(QuizcutError::InvalidInput("no question images to compose".into()));
        }
        let pages = images
            .chunks(self.config.questions_per_page)
            .map(|group| Self::stack(group).map(|stack| self.place(&stack)))
            .collect::<Result<Vec<_>>>()?;
        info!(pages = pages.len(), "Book pages composed");
        Ok(pages)
    }

    /// Load every image in `dir` (sorted by name) and compose it.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn compose_dir(&self, dir: &Path) -> Result<Vec<RgbImage>> {
        let paths = list_images(dir)?;
        if paths.is_empty() {
            return Err(QuizcutError::InvalidInput(format!(
                "no images found in {}",
                dir.display()
            )));
        }
        let images = paths
            .iter()
            .map(|path| {
                image::open(path).map_err(|err| {
                    QuizcutError::ImageError(format!("failed to open {}: {}", path.display(), err))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.compose(&images)
    }
}
