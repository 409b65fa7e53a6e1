// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Stampwerk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Stampwerk operations.
#[derive(Debug, Error)]
pub enum StampwerkError {
    // -- Input errors --
    #[error("input directory not found: {}", .0.display())]
    InputDirectoryNotFound(PathBuf),

    #[error("input PDF file not found: {}", .0.display())]
    InputFileNotFound(PathBuf),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("page rasterization failed: {0}")]
    Rasterize(String),

    #[error("font loading failed: {0}")]
    Font(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("sequence number overflows: offset {offset} + file {index}")]
    SequenceOverflow { offset: u64, index: usize },

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StampwerkError>;
