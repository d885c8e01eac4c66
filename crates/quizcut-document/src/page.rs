// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A rasterized page: the decoded image plus its 1-based page number.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use quizcut_core::error::{QuizcutError, Result};
use tracing::{debug, instrument};

/// One rendered page of an exam document. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Page {
    number: u32,
    image: DynamicImage,
}

impl Page {
    /// Wrap an already-decoded image.
    ///
    /// Fails with [`QuizcutError::InvalidInput`] for page number 0 or an image
    /// with zero width or height.
    pub fn new(number: u32, image: DynamicImage) -> Result<Self> {
        if number == 0 {
            return Err(QuizcutError::InvalidInput(
                "page numbers are 1-based; got 0".into(),
            ));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(QuizcutError::InvalidInput(format!(
                "page {} has zero-area image ({}x{})",
                number,
                image.width(),
                image.height()
            )));
        }
        Ok(Self { number, image })
    }

    /// Decode a page image from a file (PNG, JPEG, TIFF, …).
    #[instrument(skip_all, fields(path = %path.as_ref().display(), number))]
    pub fn open(path: impl AsRef<Path>, number: u32) -> Result<Self> {
        let image = image::open(path.as_ref()).map_err(|err| {
            QuizcutError::ImageError(format!(
                "failed to open page image {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = image.width(), height = image.height(), "Page image decoded");
        Self::new(number, image)
    }

    /// Decode a page image from encoded bytes.
    pub fn from_bytes(data: &[u8], number: u32) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            QuizcutError::ImageError(format!("failed to decode page {}: {}", number, err))
        })?;
        Self::new(number, image)
    }

    /// 1-based page number.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Extensions recognised as page or question images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Whether `path` has an image file extension (case-insensitive).
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Image files directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn rejects_page_zero() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([255u8])));
        assert!(matches!(
            Page::new(0, img),
            Err(QuizcutError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_zero_area() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(10, 0));
        assert!(matches!(
            Page::new(1, img),
            Err(QuizcutError::InvalidInput(_))
        ));
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        assert!(matches!(
            Page::from_bytes(b"not an image", 3),
            Err(QuizcutError::ImageError(_))
        ));
    }

    #[test]
    fn lists_only_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.tiff"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("d.png")).unwrap();

        let names: Vec<String> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.tiff"]);
    }
}
