// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-recognition adapters.
//
// The segmentation core only needs one capability from a recognition backend:
// "give me every text box on this page". Each backend lives behind the
// `TextRecognizer` trait and is constructed once per run; the core never
// branches on which backend it is talking to.
//
// # Feature Gates
//
// - `ocr`: pure-Rust neural OCR through `ocrs` (see `engine`).
// - `tesseract`: Tesseract through `leptess` (see `tesseract`).
//
// Without either feature only the `disabled` backend exists and every page is
// segmented from whitespace alone.

#[cfg(feature = "ocr")]
pub mod engine;

#[cfg(feature = "tesseract")]
pub mod tesseract;

use std::sync::Arc;

use image::DynamicImage;
use quizcut_core::config::RecognitionConfig;
use quizcut_core::error::{QuizcutError, Result};
use quizcut_core::types::{BackendKind, RecognizedBox};
use tracing::{info, instrument, warn};

#[cfg(feature = "ocr")]
pub use engine::{OcrConfig, OcrsRecognizer};

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

/// A text-recognition backend.
///
/// Implementations are called once per page with the full page image and must
/// be safe to share between the threads of a batch run.
pub trait TextRecognizer: Send + Sync {
    /// Which backend this is (for logs and reports).
    fn backend(&self) -> BackendKind;

    /// Every text box found on the page, in page pixel coordinates, with
    /// confidence normalized to 0–100.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RecognizedBox>>;
}

/// Backend used when recognition is switched off or nothing is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecognizer;

impl TextRecognizer for NullRecognizer {
    fn backend(&self) -> BackendKind {
        BackendKind::Disabled
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RecognizedBox>> {
        Ok(Vec::new())
    }
}

/// Backends compiled into this build, in default-preference order.
pub fn compiled_backends() -> Vec<BackendKind> {
    let mut backends = Vec::new();
    if cfg!(feature = "ocr") {
        backends.push(BackendKind::Ocrs);
    }
    if cfg!(feature = "tesseract") {
        backends.push(BackendKind::Tesseract);
    }
    backends.push(BackendKind::Disabled);
    backends
}

/// Construct the recognizer described by `config`.
///
/// An explicitly requested backend that cannot be brought up is a
/// [`QuizcutError::BackendUnavailable`] error, reported before any page is
/// processed. With no explicit backend, the first local backend that comes up
/// is used; if none does, recognition is disabled with a warning and pages are
/// segmented from whitespace alone.
#[instrument(skip_all, fields(backend = ?config.backend, language = %config.language))]
pub fn build_recognizer(config: &RecognitionConfig) -> Result<Arc<dyn TextRecognizer>> {
    if let Some(kind) = config.backend {
        let recognizer = open_backend(kind, config)?;
        info!(backend = %kind, "Recognition backend ready");
        return Ok(recognizer);
    }

    for kind in compiled_backends() {
        match open_backend(kind, config) {
            Ok(recognizer) => {
                if kind == BackendKind::Disabled {
                    warn!(
                        "No text-recognition backend available; questions will be split on \
                         whitespace only and may be over-merged"
                    );
                } else {
                    info!(backend = %kind, "Recognition backend ready");
                }
                return Ok(recognizer);
            }
            Err(err) => warn!(backend = %kind, error = %err, "Backend unavailable, trying next"),
        }
    }

    Ok(Arc::new(NullRecognizer))
}

fn open_backend(kind: BackendKind, config: &RecognitionConfig) -> Result<Arc<dyn TextRecognizer>> {
    match kind {
        BackendKind::Ocrs => open_ocrs(config),
        BackendKind::Tesseract => open_tesseract(config),
        BackendKind::Disabled => Ok(Arc::new(NullRecognizer)),
    }
}

#[cfg(feature = "ocr")]
fn open_ocrs(config: &RecognitionConfig) -> Result<Arc<dyn TextRecognizer>> {
    let models = match &config.model_dir {
        Some(dir) => OcrConfig::from_dir(dir),
        None => OcrConfig::default(),
    };
    let recognizer = OcrsRecognizer::new(models).map_err(|err| unavailable(BackendKind::Ocrs, err))?;
    if config.language != RecognitionConfig::default().language {
        tracing::debug!(language = %config.language, "ocrs ignores the language hint");
    }
    Ok(Arc::new(recognizer))
}

#[cfg(not(feature = "ocr"))]
fn open_ocrs(_config: &RecognitionConfig) -> Result<Arc<dyn TextRecognizer>> {
    Err(QuizcutError::BackendUnavailable {
        backend: BackendKind::Ocrs.to_string(),
        reason: "this build does not include the `ocr` feature".into(),
    })
}

#[cfg(feature = "tesseract")]
fn open_tesseract(config: &RecognitionConfig) -> Result<Arc<dyn TextRecognizer>> {
    let recognizer = TesseractRecognizer::new(&config.language)
        .map_err(|err| unavailable(BackendKind::Tesseract, err))?;
    Ok(Arc::new(recognizer))
}

#[cfg(not(feature = "tesseract"))]
fn open_tesseract(_config: &RecognitionConfig) -> Result<Arc<dyn TextRecognizer>> {
    Err(QuizcutError::BackendUnavailable {
        backend: BackendKind::Tesseract.to_string(),
        reason: "this build does not include the `tesseract` feature".into(),
    })
}

#[cfg(any(feature = "ocr", feature = "tesseract"))]
fn unavailable(kind: BackendKind, err: QuizcutError) -> QuizcutError {
    match err {
        QuizcutError::BackendUnavailable { .. } => err,
        other => QuizcutError::BackendUnavailable {
            backend: kind.to_string(),
            reason: other.to_string(),
        },
    }
}
