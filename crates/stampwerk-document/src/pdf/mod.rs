// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading source documents, compositing overlays, accumulating
// output pages, and generating overlay/image pages.

pub mod accumulator;
mod copy;
pub mod overlay;
pub mod reader;
pub mod writer;

pub use accumulator::OutputAccumulator;
pub use reader::PdfReader;
pub use writer::PdfWriter;
