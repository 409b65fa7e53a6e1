// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stampwerk-document — Document processing for the Stampwerk batch stamper.
//
// Provides PDF operations (open, classify, composite overlays, accumulate and
// write pages), label rendering onto rasterized pages, page rasterization, and
// the batch pipeline that ties them together.

pub mod batch;
pub mod classify;
pub mod image;
pub mod pdf;
pub mod raster;
pub mod stamp;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export the primary structs so callers can use `stampwerk_document::PdfReader` etc.
pub use batch::finalize::finalize;
pub use batch::orchestrator::BatchStamper;
pub use classify::Classifier;
pub use crate::image::font::LabelFont;
pub use crate::image::processor::ImageProcessor;
pub use pdf::accumulator::OutputAccumulator;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
pub use raster::{EmbeddedImageRasterizer, PageRasterizer, PdfiumRasterizer, PopplerRasterizer};
pub use stamp::raster::RasterStamper;
pub use stamp::vector::VectorStamper;
