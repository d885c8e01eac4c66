// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan preprocessing: adaptive binarization of page images into ink masks.

pub mod binarize;

pub use binarize::{Binarizer, Mask};
