// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Whitespace-gap segmentation: find horizontal blank bands in an ink mask and
// turn them into candidate question segments covering the whole page.

use quizcut_core::config::GapConfig;
use quizcut_core::types::Segment;
use tracing::{debug, instrument};

use crate::scan::binarize::Mask;

/// Proposes candidate segments from the horizontal projection profile of a mask.
#[derive(Debug, Clone, Default)]
pub struct GapSegmenter {
    config: GapConfig,
}

impl GapSegmenter {
    pub fn new(config: GapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    /// Cut coordinates `[0, c1, …, H]`, strictly increasing.
    ///
    /// Every run of empty rows at least `min_gap_height` long contributes one cut
    /// at the centre of the run, so the cut sits as far as possible from the
    /// ascenders and descenders on either side.
    #[instrument(skip_all, fields(height = mask.height()))]
    pub fn find_cuts(&self, mask: &Mask) -> Vec<u32> {
        let cuts = cuts_from_profile(&mask.row_profile(), self.config.min_gap_height);
        debug!(internal_cuts = cuts.len().saturating_sub(2), "Gap cuts found");
        cuts
    }

    /// Candidate segments for a mask: [`find_cuts`](Self::find_cuts) followed
    /// by [`segments_from_cuts`].
    pub fn segment(&self, mask: &Mask) -> Vec<Segment> {
        let cuts = self.find_cuts(mask);
        segments_from_cuts(&cuts, self.config.min_segment_height)
    }
}

/// Scan a projection profile for gaps and return the boundary list.
///
/// A row is empty only when its foreground count is exactly zero. The list
/// always starts with 0 and ends with the profile length; an empty profile
/// yields `[0]`.
pub fn cuts_from_profile(profile: &[u32], min_gap_height: u32) -> Vec<u32> {
    let height = profile.len() as u32;
    let min_gap = min_gap_height.max(1);
    let mut cuts: Vec<u32> = vec![0];
    let mut gap_start: Option<u32> = None;

    for (y, &count) in profile.iter().enumerate() {
        let y = y as u32;
        match (count == 0, gap_start) {
            (true, None) => gap_start = Some(y),
            (false, Some(start)) => {
                if y - start >= min_gap {
                    cuts.push((start + y) / 2);
                }
                gap_start = None;
            }
            _ => {}
        }
    }

    // A gap still open at the bottom edge. A page that is blank from the first
    // row is a single segment, not two empty halves.
    if let Some(start) = gap_start {
        if start > 0 && height - start >= min_gap {
            cuts.push((start + height) / 2);
        }
    }

    cuts.push(height);

    // Midpoints ascend by construction; drop anything that would repeat or go
    // backwards (e.g. a one-row page where the trailing cut equals the height).
    let mut strictly: Vec<u32> = Vec::with_capacity(cuts.len());
    for cut in cuts {
        if strictly.last().is_none_or(|&last| cut > last) {
            strictly.push(cut);
        }
    }
    strictly
}

/// Turn a boundary list into segments that cover `[first, last)` without gaps.
///
/// An interval shorter than `min_height` is absorbed by the segment before it.
/// The first interval has no predecessor and is kept even when short, so no
/// leading content is lost.
pub fn segments_from_cuts(cuts: &[u32], min_height: u32) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::with_capacity(cuts.len().saturating_sub(1));

    for pair in cuts.windows(2) {
        let (top, bottom) = (pair[0], pair[1]);
        if top >= bottom {
            continue;
        }
        match segments.last_mut() {
            Some(previous) if bottom - top < min_height => {
                *previous = previous.extended_to(bottom);
            }
            _ => segments.push(Segment::new(top, bottom)),
        }
    }

    segments
}
