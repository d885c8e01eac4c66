// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout binarization: adaptive mean thresholding followed by a morphological
// closing, producing an ink mask for projection-profile analysis.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use quizcut_core::config::BinarizeConfig;
use quizcut_core::error::{QuizcutError, Result};
use tracing::{debug, instrument};

/// Pixel value stored for foreground (ink) in a [`Mask`].
const FOREGROUND: u8 = 255;
/// Pixel value stored for background in a [`Mask`].
const BACKGROUND: u8 = 0;

/// Binary foreground/background image with the same dimensions as its page.
///
/// Foreground marks ink-like pixels. A mask is never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pixels: GrayImage,
}

impl Mask {
    /// Build a mask from a luma buffer; any non-zero pixel is foreground.
    pub fn from_luma(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    /// Build a mask by evaluating `is_ink` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut is_ink: impl FnMut(u32, u32) -> bool) -> Self {
        let pixels = GrayImage::from_fn(width, height, |x, y| {
            Luma([if is_ink(x, y) { FOREGROUND } else { BACKGROUND }])
        });
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y).0[0] != BACKGROUND
    }

    /// Horizontal projection profile: foreground pixel count for every row.
    pub fn row_profile(&self) -> Vec<u32> {
        self.pixels
            .rows()
            .map(|row| row.filter(|p| p.0[0] != BACKGROUND).count() as u32)
            .collect()
    }
}

/// Converts page images into ink masks.
///
/// Fixed global thresholds break down under uneven scan illumination, so the
/// threshold is the mean of a square neighbourhood minus a constant offset.
/// The closing pass then fuses the glyphs of one text line into a solid run
/// so a single line never projects as several thin bands.
#[derive(Debug, Clone, Default)]
pub struct Binarizer {
    config: BinarizeConfig,
}

impl Binarizer {
    pub fn new(config: BinarizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BinarizeConfig {
        &self.config
    }

    /// Produce the ink mask for a page image (grayscale or colour).
    ///
    /// # Errors
    ///
    /// Returns [`QuizcutError::InvalidInput`] if the image has zero width or
    /// height.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn binarize(&self, image: &DynamicImage) -> Result<Mask> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(QuizcutError::InvalidInput(format!(
                "cannot binarize a {}x{} image",
                width, height
            )));
        }

        let gray = image.to_luma8();
        let radius = self.config.window_size / 2;
        let thresholded = adaptive_threshold_inv(&gray, radius, self.config.offset);

        let close_radius = self.config.close_kernel / 2;
        let closed = if close_radius == 0 {
            thresholded
        } else {
            // An L∞ ball of radius r is the (2r+1)×(2r+1) square element.
            morphology::close(&thresholded, Norm::LInf, close_radius.min(255) as u8)
        };

        debug!(
            radius,
            offset = self.config.offset,
            close_radius,
            "Binarization complete"
        );
        Ok(Mask::from_luma(closed))
    }
}

// -- Thresholding -------------------------------------------------------------

/// Inverted adaptive mean threshold.
///
/// A pixel becomes foreground when its intensity is at or below the mean of
/// the `(2 * radius + 1)` square window around it minus `offset`. Windows are
/// clipped at the image border.
fn adaptive_threshold_inv(gray: &GrayImage, radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, radius);
        let threshold = local_mean - offset as f64;
        let value = gray.get_pixel(x, y).0[0] as f64;
        Luma([if value <= threshold { FOREGROUND } else { BACKGROUND }])
    })
}

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` holds the sum of all pixels in `[0, x) × [0, y)`.
/// The table is `(width+1) x (height+1)` with a zero border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value of the square window of `radius` centred on (cx, cy),
/// clipped to the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    // S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1]
    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}
