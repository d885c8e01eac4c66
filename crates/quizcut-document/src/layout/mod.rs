// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout analysis: whitespace-gap cuts, question-number detection, and
// merge refinement of candidate segments.

pub mod gaps;
pub mod numbering;
pub mod refine;

pub use gaps::GapSegmenter;
pub use numbering::starts_with_question_number;
pub use refine::{MergeDecision, MergeRefiner};
