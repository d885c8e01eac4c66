// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge refinement: collapse whitespace cuts that fall inside a single
// question, using recognized text near the top of each candidate segment.
//
// Whitespace alone cannot tell the blank space between two questions from the
// blank space between two paragraphs of one question. A candidate only starts
// a new question if its head band begins with a question number; otherwise it
// is absorbed by the question above it.

use quizcut_core::config::RefineConfig;
use quizcut_core::types::{RecognizedBox, Segment};
use tracing::{debug, instrument, trace};

use super::numbering::starts_with_question_number;

/// How a candidate segment relates to the segment above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// The candidate opens a new question.
    NewQuestion,
    /// The candidate belongs to the question above.
    Continuation,
}

/// Running state of the refinement fold.
#[derive(Debug, Default)]
struct RefineState {
    closed: Vec<Segment>,
    open: Option<Segment>,
}

impl RefineState {
    fn finish(mut self) -> Vec<Segment> {
        if let Some(open) = self.open {
            self.closed.push(open);
        }
        self.closed
    }
}

/// Turns candidate segments into final question segments.
#[derive(Debug, Clone, Default)]
pub struct MergeRefiner {
    config: RefineConfig,
}

impl MergeRefiner {
    pub fn new(config: RefineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    /// Half-open row range `[top, bottom)` inspected for a leading number.
    pub fn head_band(&self, segment: Segment) -> (u32, u32) {
        let fractional = (segment.height() as f64 * self.config.head_band_fraction as f64) as u32;
        let band = fractional
            .max(self.config.min_head_band_px)
            .min(segment.height());
        (segment.top(), segment.top() + band)
    }

    /// Text of the confident boxes lying wholly inside the head band, in reading
    /// order, cut to the configured sample length.
    pub fn head_text(&self, segment: Segment, boxes: &[RecognizedBox], page_width: u32) -> String {
        let (band_top, band_bottom) = self.head_band(segment);

        let selected: Vec<&RecognizedBox> = boxes
            .iter()
            .filter(|b| {
                b.y as i64 >= band_top as i64
                    && b.bottom() <= band_bottom as i64
                    && b.x >= 0
                    && b.right() <= page_width as i64
                    && b.confidence >= self.config.min_confidence
            })
            .collect();

        let joined = reading_order(selected)
            .into_iter()
            .map(|b| b.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        joined.chars().take(self.config.head_sample_chars).collect()
    }

    /// Classify a candidate against the page's recognized boxes.
    pub fn classify(
        &self,
        segment: Segment,
        boxes: &[RecognizedBox],
        page_width: u32,
    ) -> MergeDecision {
        let head = self.head_text(segment, boxes, page_width);
        let decision = if starts_with_question_number(&head) {
            MergeDecision::NewQuestion
        } else {
            MergeDecision::Continuation
        };
        trace!(%segment, head = %head, ?decision, "Candidate classified");
        decision
    }

    /// Fold candidates top to bottom into final segments.
    ///
    /// The first candidate always opens a question. Each later candidate either
    /// closes the open question and starts its own, or extends the open question
    /// down to its bottom edge. The result covers exactly the same rows as the
    /// input and never has more segments.
    #[instrument(skip_all, fields(candidates = candidates.len(), boxes = boxes.len()))]
    pub fn refine(
        &self,
        candidates: &[Segment],
        boxes: &[RecognizedBox],
        page_width: u32,
    ) -> Vec<Segment> {
        let state = candidates
            .iter()
            .fold(RefineState::default(), |mut state, &candidate| {
                state.open = Some(match state.open {
                    None => candidate,
                    Some(open) => match self.classify(candidate, boxes, page_width) {
                        MergeDecision::NewQuestion => {
                            state.closed.push(open);
                            candidate
                        }
                        MergeDecision::Continuation => open.extended_to(candidate.bottom()),
                    },
                });
                state
            });

        let finals = state.finish();
        debug!(finals = finals.len(), "Merge refinement complete");
        finals
    }
}

/// Group boxes into lines by overlapping row ranges, then read the lines top
/// to bottom and each line left to right.
fn reading_order(mut boxes: Vec<&RecognizedBox>) -> Vec<&RecognizedBox> {
    boxes.sort_by_key(|b| (b.y, b.x));

    let mut lines: Vec<(i64, Vec<&RecognizedBox>)> = Vec::new();
    for b in boxes {
        let overlaps = lines.last().is_some_and(|(bottom, _)| (b.y as i64) < *bottom);
        match lines.last_mut() {
            Some((bottom, line)) if overlaps => {
                *bottom = (*bottom).max(b.bottom());
                line.push(b);
            }
            _ => lines.push((b.bottom(), vec![b])),
        }
    }

    lines
        .into_iter()
        .flat_map(|(_, mut line)| {
            line.sort_by_key(|b| b.x);
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_WIDTH: u32 = 600;

    /// Candidates from three 100 px ink blocks separated by 40 px gaps.
    fn three_blocks() -> Vec<Segment> {
        vec![
            Segment::new(0, 120),
            Segment::new(120, 260),
            Segment::new(260, 380),
        ]
    }

    fn word(x: i32, y: i32, text: &str, confidence: f32) -> RecognizedBox {
        RecognizedBox::new(x, y, 24, 12, text, confidence)
    }

    #[test]
    fn head_band_uses_fraction_with_floor() {
        let refiner = MergeRefiner::default();
        assert_eq!(refiner.head_band(Segment::new(120, 260)), (120, 155));
        assert_eq!(refiner.head_band(Segment::new(0, 20)), (0, 10));
        assert_eq!(refiner.head_band(Segment::new(50, 56)), (50, 56));
    }

    #[test]
    fn numbered_heads_split_every_block() {
        let boxes = vec![
            word(20, 5, "1.", 90.0),
            word(20, 140, "2.", 80.0),
            word(20, 270, "3、", 80.0),
        ];
        let finals = MergeRefiner::default().refine(&three_blocks(), &boxes, PAGE_WIDTH);
        assert_eq!(finals, three_blocks());
    }

    #[test]
    fn low_confidence_number_is_ignored() {
        let boxes = vec![word(20, 140, "2.", 20.0), word(20, 270, "3、", 80.0)];
        let finals = MergeRefiner::default().refine(&three_blocks(), &boxes, PAGE_WIDTH);
        assert_eq!(
            finals,
            vec![Segment::new(0, 260), Segment::new(260, 380)]
        );
    }

    #[test]
    fn number_outside_head_band_is_ignored() {
        // Vertically centred in the second candidate (band is rows 120..155).
        let boxes = vec![word(20, 185, "2.", 99.0)];
        let refiner = MergeRefiner::default();
        assert_eq!(
            refiner.classify(Segment::new(120, 260), &boxes, PAGE_WIDTH),
            MergeDecision::Continuation
        );
    }

    #[test]
    fn box_straddling_band_edge_is_ignored() {
        let boxes = vec![RecognizedBox::new(20, 150, 24, 12, "2.", 99.0)];
        assert_eq!(
            MergeRefiner::default().classify(Segment::new(120, 260), &boxes, PAGE_WIDTH),
            MergeDecision::Continuation
        );
    }

    #[test]
    fn box_past_page_width_is_ignored() {
        let boxes = vec![word(590, 130, "2.", 99.0)];
        assert_eq!(
            MergeRefiner::default().classify(Segment::new(120, 260), &boxes, PAGE_WIDTH),
            MergeDecision::Continuation
        );
    }

    #[test]
    fn head_text_reads_left_to_right() {
        let boxes = vec![
            word(200, 130, "Solve", 90.0),
            word(20, 131, "4.", 90.0),
            word(400, 129, "for x", 90.0),
        ];
        let refiner = MergeRefiner::default();
        assert_eq!(
            refiner.head_text(Segment::new(120, 260), &boxes, PAGE_WIDTH),
            "4. Solve for x"
        );
    }

    #[test]
    fn head_text_reads_lines_top_to_bottom() {
        // 400 px candidate, so the band spans rows 100..200 and holds two lines.
        let boxes = vec![
            word(40, 150, "A.", 90.0),
            word(50, 110, "12.", 90.0),
            word(120, 111, "Which", 90.0),
            word(90, 151, "pi", 90.0),
        ];
        let refiner = MergeRefiner::default();
        let candidate = Segment::new(100, 500);
        assert_eq!(refiner.head_text(candidate, &boxes, PAGE_WIDTH), "12. Which A. pi");
        assert_eq!(
            refiner.classify(candidate, &boxes, PAGE_WIDTH),
            MergeDecision::NewQuestion
        );
    }

    #[test]
    fn head_text_is_truncated_by_characters() {
        let long = "题".repeat(80);
        let boxes = vec![word(20, 130, &long, 90.0)];
        let text = MergeRefiner::default().head_text(Segment::new(120, 260), &boxes, PAGE_WIDTH);
        assert_eq!(text.chars().count(), 50);
    }

    #[test]
    fn no_recognition_merges_everything() {
        let finals = MergeRefiner::default().refine(&three_blocks(), &[], PAGE_WIDTH);
        assert_eq!(finals, vec![Segment::new(0, 380)]);
    }

    #[test]
    fn first_candidate_is_never_merged_backward() {
        let boxes = vec![word(20, 5, "Continued from previous page", 90.0)];
        let finals = MergeRefiner::default().refine(&three_blocks(), &boxes, PAGE_WIDTH);
        assert_eq!(finals.first().map(Segment::top), Some(0));
    }

    #[test]
    fn refinement_preserves_coverage_and_never_grows() {
        let candidates = vec![
            Segment::new(0, 70),
            Segment::new(70, 200),
            Segment::new(200, 330),
            Segment::new(330, 470),
            Segment::new(470, 600),
        ];
        let boxes = vec![word(10, 205, "(1)", 70.0), word(10, 475, "二、", 70.0)];
        let finals = MergeRefiner::default().refine(&candidates, &boxes, PAGE_WIDTH);

        assert!(finals.len() <= candidates.len());
        assert_eq!(finals.first().map(Segment::top), Some(0));
        assert_eq!(finals.last().map(Segment::bottom), Some(600));
        for pair in finals.windows(2) {
            assert_eq!(pair[0].bottom(), pair[1].top());
        }
        assert_eq!(
            finals,
            vec![
                Segment::new(0, 200),
                Segment::new(200, 470),
                Segment::new(470, 600)
            ]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(MergeRefiner::default().refine(&[], &[], PAGE_WIDTH).is_empty());
    }
}
