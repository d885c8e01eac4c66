// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quizcut.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Quizcut operations.
#[derive(Debug, Error)]
pub enum QuizcutError {
    // -- Input errors --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Recognition errors --
    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("recognition backend `{backend}` is unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Configuration(String),

    // -- Output errors --
    #[error("export to {path} failed: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Batch execution --
    #[error("page worker failed: {0}")]
    Worker(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuizcutError>;
