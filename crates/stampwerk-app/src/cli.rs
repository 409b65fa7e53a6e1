// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and how they layer over a config file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use stampwerk_core::error::StampwerkError;
use stampwerk_core::{ClassificationScope, RasterBackend, StampConfig};

/// Stamp a sequence label onto the first page of every PDF in a directory and
/// merge them into one file.
#[derive(Parser, Debug)]
#[command(name = "stampwerk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Starting offset for sequence numbering (first file gets offset + 1)
    #[arg(long)]
    pub offset: Option<u64>,

    /// Directory containing the .pdf files [default: pdfs]
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Merged output file [default: yhdistetyt_laskut_<today>.pdf]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Text placed before the sequence number [default: Lasku]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Also write each stamped file here as processed-NNNN_<name>
    #[arg(long)]
    pub processed_dir: Option<PathBuf>,

    /// Rasterizer for image-only PDFs [default: auto]
    #[arg(long, value_enum)]
    pub raster_backend: Option<BackendArg>,

    /// TrueType font used for labels on rasterized pages
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Treat a document as text-bearing if any page has text, not just page 1
    #[arg(long)]
    pub all_pages_classification: bool,

    /// JSON configuration file; flags given here override it
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Auto,
    Poppler,
    Pdfium,
    Embedded,
}

impl From<BackendArg> for RasterBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => RasterBackend::Auto,
            BackendArg::Poppler => RasterBackend::Poppler,
            BackendArg::Pdfium => RasterBackend::Pdfium,
            BackendArg::Embedded => RasterBackend::Embedded,
        }
    }
}

impl Cli {
    /// Load the config file (or defaults) and apply the flags on top.
    pub fn resolve_config(&self) -> Result<StampConfig, StampwerkError> {
        let mut config = match &self.config {
            Some(path) => StampConfig::load(path)?,
            None => StampConfig::default(),
        };

        if let Some(offset) = self.offset {
            config.offset = offset;
        }
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = Some(output.clone());
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(dir) = &self.processed_dir {
            config.processed_dir = Some(dir.clone());
        }
        if let Some(backend) = self.raster_backend {
            config.raster_backend = backend.into();
        }
        if let Some(font) = &self.font {
            config.raster_style.font_path = Some(font.clone());
        }
        if self.all_pages_classification {
            config.classification = ClassificationScope::AllPages;
        }

        config.validate()?;
        Ok(config)
    }
}
