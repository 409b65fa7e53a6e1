// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch pipeline — stamp every PDF in a directory and merge the results.

pub mod finalize;
pub mod orchestrator;

pub use finalize::finalize;
pub use orchestrator::BatchStamper;
