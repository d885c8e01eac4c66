// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Quizcut: recognized text boxes, vertical page segments,
// backend identifiers, and paper sizes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuizcutError;

/// Upper bound of the normalized confidence scale.
pub const MAX_CONFIDENCE: f32 = 100.0;

/// A piece of text found by a recognition backend, in page pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedBox {
    /// Left edge. May be negative for boxes that bleed off the page.
    pub x: i32,
    /// Top edge. May be negative for boxes that bleed off the page.
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Recognized text, possibly empty.
    pub text: String,
    /// Backend confidence normalized to `0.0..=100.0`.
    pub confidence: f32,
}

impl RecognizedBox {
    /// Create a box with a confidence already on the 0–100 scale.
    ///
    /// Out-of-range and NaN confidences are clamped into the scale.
    pub fn new(
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        text: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, MAX_CONFIDENCE)
        };
        Self {
            x,
            y,
            width,
            height,
            text: text.into(),
            confidence,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }
}

/// A half-open vertical interval `[top, bottom)` spanning the full page width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    top: u32,
    bottom: u32,
}

impl Segment {
    /// Create a segment. `top` must be strictly less than `bottom`.
    pub fn new(top: u32, bottom: u32) -> Self {
        debug_assert!(top < bottom, "segment [{top}, {bottom}) is empty");
        Self { top, bottom }
    }

    pub fn top(&self) -> u32 {
        self.top
    }

    pub fn bottom(&self) -> u32 {
        self.bottom
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// A new segment with the same top and the given bottom.
    pub fn extended_to(&self, bottom: u32) -> Self {
        Self::new(self.top, bottom.max(self.bottom))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.top, self.bottom)
    }
}

/// Text-recognition backends Quizcut knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Pure-Rust neural OCR (`ocrs`).
    Ocrs,
    /// Tesseract through `leptess`.
    Tesseract,
    /// No recognition; every page yields an empty box set.
    Disabled,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ocrs => "ocrs",
            Self::Tesseract => "tesseract",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = QuizcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ocrs" => Ok(Self::Ocrs),
            "tesseract" | "tess" => Ok(Self::Tesseract),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(QuizcutError::Configuration(format!(
                "unknown recognition backend `{other}` (expected ocrs, tesseract, or disabled)"
            ))),
        }
    }
}

/// Encoding used for exported question images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatKind {
    Jpeg,
    Png,
}

impl ImageFormatKind {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl FromStr for ImageFormatKind {
    type Err = QuizcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(QuizcutError::Configuration(format!(
                "unknown image format `{other}` (expected jpeg or png)"
            ))),
        }
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in pixels at the given density, rounded to the nearest pixel.
    pub fn dimensions_px(&self, dpi: u32) -> (u32, u32) {
        let (w_mm, h_mm) = self.dimensions_mm();
        (mm_to_px(w_mm as f32, dpi), mm_to_px(h_mm as f32, dpi))
    }
}

impl FromStr for PaperSize {
    type Err = QuizcutError;

    /// Parses `a4`, `letter`, … or a custom `WIDTHxHEIGHT` in millimetres.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "a4" => return Ok(Self::A4),
            "a3" => return Ok(Self::A3),
            "a5" => return Ok(Self::A5),
            "letter" => return Ok(Self::Letter),
            "legal" => return Ok(Self::Legal),
            "tabloid" => return Ok(Self::Tabloid),
            _ => {}
        }

        let parsed = lowered.split_once('x').and_then(|(w, h)| {
            Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?))
        });
        match parsed {
            Some((width_mm, height_mm)) if width_mm > 0 && height_mm > 0 => Ok(Self::Custom {
                width_mm,
                height_mm,
            }),
            _ => Err(QuizcutError::Configuration(format!(
                "unknown paper size `{s}` (expected a4, a3, a5, letter, legal, tabloid, or WxH in mm)"
            ))),
        }
    }
}

/// Convert millimetres to pixels at `dpi`, rounding to the nearest pixel.
pub fn mm_to_px(value_mm: f32, dpi: u32) -> u32 {
    (value_mm * dpi as f32 / 25.4).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(RecognizedBox::new(0, 0, 1, 1, "a", 140.0).confidence, 100.0);
        assert_eq!(RecognizedBox::new(0, 0, 1, 1, "a", -3.0).confidence, 0.0);
        assert_eq!(RecognizedBox::new(0, 0, 1, 1, "a", f32::NAN).confidence, 0.0);
    }

    #[test]
    fn box_edges() {
        let b = RecognizedBox::new(-5, 10, 20, 30, "1.", 90.0);
        assert_eq!(b.right(), 15);
        assert_eq!(b.bottom(), 40);
    }

    #[test]
    fn segment_extension_never_shrinks() {
        let seg = Segment::new(10, 50);
        assert_eq!(seg.extended_to(80), Segment::new(10, 80));
        assert_eq!(seg.extended_to(20), seg);
        assert_eq!(seg.height(), 40);
        assert_eq!(seg.to_string(), "[10, 50)");
    }

    #[test]
    fn backend_kind_parsing() {
        assert_eq!("OCRS".parse::<BackendKind>().unwrap(), BackendKind::Ocrs);
        assert_eq!("tesseract".parse::<BackendKind>().unwrap(), BackendKind::Tesseract);
        assert_eq!("none".parse::<BackendKind>().unwrap(), BackendKind::Disabled);
        assert!("paddle".parse::<BackendKind>().is_err());
    }

    #[test]
    fn paper_size_parsing_and_pixels() {
        assert_eq!("A4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!(
            "100x150".parse::<PaperSize>().unwrap(),
            PaperSize::Custom {
                width_mm: 100,
                height_mm: 150
            }
        );
        assert!("0x150".parse::<PaperSize>().is_err());
        assert!("b5".parse::<PaperSize>().is_err());
        assert_eq!(PaperSize::A4.dimensions_px(300), (2480, 3508));
    }

    #[test]
    fn image_format_extension() {
        assert_eq!("jpg".parse::<ImageFormatKind>().unwrap().extension(), "jpg");
        assert_eq!(ImageFormatKind::Png.extension(), "png");
    }
}
