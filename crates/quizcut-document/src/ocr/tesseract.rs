// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract recognition backend via `leptess`.
//
// Only available when the `tesseract` feature is enabled. Requires the
// Tesseract and Leptonica system libraries plus the traineddata for the
// requested language (e.g. `chi_sim`, `eng`).

use image::{DynamicImage, ImageFormat};
use leptess::LepTess;
use quizcut_core::error::{QuizcutError, Result};
use quizcut_core::types::{BackendKind, RecognizedBox};
use tracing::{debug, info, instrument, trace};

use super::TextRecognizer;

/// Word-level recognizer driving Tesseract.
///
/// Construction proves the language data loads; each page then gets its own
/// Tesseract handle, because a handle carries the page image as mutable state
/// and cannot be shared across threads.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    language: String,
}

impl TesseractRecognizer {
    /// Check that Tesseract initialises with `language` and build the recognizer.
    #[instrument]
    pub fn new(language: &str) -> Result<Self> {
        let _probe = LepTess::new(None, language).map_err(|err| {
            QuizcutError::BackendUnavailable {
                backend: BackendKind::Tesseract.to_string(),
                reason: format!(
                    "failed to initialise Tesseract with language '{}': {}; \
                     make sure the traineddata is installed",
                    language, err
                ),
            }
        })?;
        info!(language, "Tesseract initialised");
        Ok(Self {
            language: language.to_string(),
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn backend(&self) -> BackendKind {
        BackendKind::Tesseract
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedBox>> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(QuizcutError::InvalidInput(format!(
                "cannot recognise a {}x{} image",
                width, height
            )));
        }

        let mut lt = LepTess::new(None, &self.language).map_err(|err| {
            QuizcutError::OcrError(format!("failed to initialise Tesseract: {}", err))
        })?;

        // leptess decodes from an encoded buffer.
        let mut png = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|err| QuizcutError::OcrError(format!("failed to encode page: {}", err)))?;
        lt.set_image_from_mem(png.get_ref())
            .map_err(|err| QuizcutError::OcrError(format!("failed to load page: {}", err)))?;

        // `None` means nothing was detected, which is not an error.
        let Some(words) =
            lt.get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_WORD, true)
        else {
            debug!("Tesseract found no words");
            return Ok(Vec::new());
        };

        let mut boxes = Vec::new();
        for word in &words {
            let geom = word.get_geometry();
            lt.set_rectangle(geom.x, geom.y, geom.w, geom.h);

            let text = lt.get_utf8_text().unwrap_or_default().trim().to_string();
            if text.is_empty() {
                continue;
            }
            // Tesseract reports 0-100 already.
            let confidence = lt.mean_text_conf() as f32;
            trace!(text = %text, confidence, x = geom.x, y = geom.y, "Word recognised");

            boxes.push(RecognizedBox::new(
                geom.x,
                geom.y,
                geom.w.max(0) as u32,
                geom.h.max(0) as u32,
                text,
                confidence,
            ));
        }

        debug!(boxes = boxes.len(), "Tesseract recognition complete");
        Ok(boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_is_unavailable() {
        let result = TesseractRecognizer::new("zzz_not_a_language");
        assert!(matches!(
            result,
            Err(QuizcutError::BackendUnavailable { .. })
        ));
    }
}
