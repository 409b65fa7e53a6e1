// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding and resizing rendered pages, and the label font used
// to burn text into them.

pub mod font;
pub mod processor;

pub use font::LabelFont;
pub use processor::ImageProcessor;
