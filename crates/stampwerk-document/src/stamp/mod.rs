// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stamping — vector labels for pages with a text layer, burned-in labels for
// rasterized scans.

pub mod raster;
pub mod vector;

pub use raster::RasterStamper;
pub use vector::VectorStamper;
