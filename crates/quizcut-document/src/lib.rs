// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quizcut-document: page segmentation for scanned exam papers.
//
// Splits each page into one image per question (binarization, whitespace-gap
// cuts, and merge refinement driven by recognized question numbers), runs
// pages concurrently, and lays exported questions out as a practice-book PDF.

pub mod batch;
pub mod compose;
pub mod export;
pub mod layout;
pub mod ocr;
pub mod page;
pub mod pdf;
pub mod pipeline;
pub mod report;
pub mod scan;

// Re-export the primary structs so callers can use `quizcut_document::PageSegmenter` etc.
pub use batch::{BatchRunner, PageSource, StopHandle};
pub use compose::BookComposer;
pub use export::SegmentExporter;
pub use layout::{GapSegmenter, MergeDecision, MergeRefiner};
pub use ocr::{NullRecognizer, TextRecognizer, build_recognizer};
pub use page::Page;
pub use pdf::PdfWriter;
pub use pipeline::{PageSegmentation, PageSegmenter};
pub use report::{BatchReport, PageFailure, PageReport};
pub use scan::{Binarizer, Mask};

#[cfg(feature = "ocr")]
pub use ocr::OcrsRecognizer;

#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;
