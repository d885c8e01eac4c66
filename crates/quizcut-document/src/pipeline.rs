// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-page pipeline: binarize, cut on whitespace, recognize, refine.
//
// The steps run strictly in order for one page. The batch runner drives the
// same stages individually so it can put the recognition call under a timeout.

use quizcut_core::config::SegmenterConfig;
use quizcut_core::error::Result;
use quizcut_core::types::{RecognizedBox, Segment};
use tracing::{info, instrument, warn};

use crate::layout::{GapSegmenter, MergeRefiner};
use crate::ocr::TextRecognizer;
use crate::page::Page;
use crate::scan::Binarizer;

/// Result of segmenting one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSegmentation {
    /// Candidate segments from whitespace alone.
    pub candidates: Vec<Segment>,
    /// Final question segments.
    pub segments: Vec<Segment>,
    /// Number of boxes the recognizer returned.
    pub boxes: usize,
    /// Recognition failed and refinement ran without text.
    pub degraded: bool,
}

/// The page segmentation engine, configured once and reused for every page.
#[derive(Debug, Clone)]
pub struct PageSegmenter {
    binarizer: Binarizer,
    gaps: GapSegmenter,
    refiner: MergeRefiner,
}

impl PageSegmenter {
    /// Build the engine, rejecting invalid tunables up front.
    pub fn new(config: &SegmenterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            binarizer: Binarizer::new(config.binarize.clone()),
            gaps: GapSegmenter::new(config.gaps.clone()),
            refiner: MergeRefiner::new(config.refine.clone()),
        })
    }

    /// Binarize the page and propose candidate segments from its gaps.
    #[instrument(skip_all, fields(page = page.number()))]
    pub fn candidates(&self, page: &Page) -> Result<Vec<Segment>> {
        let mask = self.binarizer.binarize(page.image())?;
        Ok(self.gaps.segment(&mask))
    }

    /// Merge candidates that do not open with a question number.
    pub fn refine(&self, page: &Page, candidates: &[Segment], boxes: &[RecognizedBox]) -> Vec<Segment> {
        self.refiner.refine(candidates, boxes, page.width())
    }

    /// Run every stage for one page.
    ///
    /// The recognizer is called once. If it fails the page is still segmented,
    /// from whitespace alone, and the result is marked degraded.
    #[instrument(skip_all, fields(page = page.number(), backend = %recognizer.backend()))]
    pub fn segment(&self, page: &Page, recognizer: &dyn TextRecognizer) -> Result<PageSegmentation> {
        let candidates = self.candidates(page)?;

        let (boxes, degraded) = match recognizer.recognize(page.image()) {
            Ok(boxes) => (boxes, false),
            Err(err) => {
                warn!(error = %err, "Recognition failed; refining without text");
                (Vec::new(), true)
            }
        };

        let segments = self.refine(page, &candidates, &boxes);
        info!(
            candidates = candidates.len(),
            questions = segments.len(),
            boxes = boxes.len(),
            "Page segmented"
        );
        Ok(PageSegmentation {
            candidates,
            segments,
            boxes: boxes.len(),
            degraded,
        })
    }
}
