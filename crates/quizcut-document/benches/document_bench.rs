// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the page segmentation path in quizcut-document.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use quizcut_core::config::SegmenterConfig;
use quizcut_document::{Binarizer, GapSegmenter, NullRecognizer, Page, PageSegmenter};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 1240x1754 page (A4 at 150 dpi) with eight text-like question blocks.
fn synthetic_exam_page() -> Page {
    let (width, height) = (1240u32, 1754u32);
    let img = GrayImage::from_fn(width, height, |x, y| {
        let block = y / 210;
        let row = y % 210;
        let inked = block < 8 && (20..160).contains(&row) && row % 9 < 3 && (80..1160).contains(&x);
        Luma([if inked { 20 } else { 235 }])
    });
    Page::new(1, DynamicImage::ImageLuma8(img)).unwrap()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Adaptive threshold plus closing on a full page.
fn bench_binarize(c: &mut Criterion) {
    let page = synthetic_exam_page();
    let binarizer = Binarizer::default();

    c.bench_function("binarize (1240x1754)", |b| {
        b.iter(|| black_box(binarizer.binarize(black_box(page.image())).unwrap()));
    });
}

/// Projection profile and gap cuts on a precomputed mask.
fn bench_gap_cuts(c: &mut Criterion) {
    let page = synthetic_exam_page();
    let mask = Binarizer::default().binarize(page.image()).unwrap();
    let segmenter = GapSegmenter::default();

    c.bench_function("gap_cuts (1240x1754)", |b| {
        b.iter(|| black_box(segmenter.segment(black_box(&mask))));
    });
}

/// Whole page without recognition.
fn bench_segment_page(c: &mut Criterion) {
    let page = synthetic_exam_page();
    let segmenter = PageSegmenter::new(&SegmenterConfig::default()).unwrap();

    c.bench_function("segment_page (1240x1754, no OCR)", |b| {
        b.iter(|| black_box(segmenter.segment(black_box(&page), &NullRecognizer).unwrap()));
    });
}

criterion_group!(benches, bench_binarize, bench_gap_cuts, bench_segment_page);
criterion_main!(benches);
