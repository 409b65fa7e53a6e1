// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestrator — label, classify, stamp and merge each input file in
// turn. A file that fails is logged and skipped; the batch carries on.

use std::path::{Path, PathBuf};

use stampwerk_core::error::StampwerkError;
use stampwerk_core::{
    BatchReport, DocumentKind, FileFailure, ProcessedFile, StampConfig, StampLabel,
};
use tracing::{error, info, instrument, warn};

use super::finalize::finalize;
use crate::classify::Classifier;
use crate::pdf::accumulator::OutputAccumulator;
use crate::pdf::reader::PdfReader;
use crate::raster::{self, PageRasterizer};
use crate::stamp::raster::RasterStamper;
use crate::stamp::vector::VectorStamper;

/// Runs one stamping batch over a directory of PDFs.
pub struct BatchStamper {
    config: StampConfig,
    classifier: Classifier,
    vector: VectorStamper,
    raster: RasterStamper,
    rasterizer: Box<dyn PageRasterizer>,
}

impl BatchStamper {
    /// Set up the stampers for `config`. The raster label font is resolved
    /// here, once per batch.
    pub fn new(config: StampConfig) -> Result<Self, StampwerkError> {
        let classifier = Classifier::new(config.classification);
        let vector = VectorStamper::new(config.vector_style.clone());
        let raster = RasterStamper::new(config.raster_style.clone())?;
        let rasterizer = raster::for_backend(config.raster_backend);
        Ok(Self {
            config,
            classifier,
            vector,
            raster,
            rasterizer,
        })
    }

    /// Replace the rasterizer chosen from the configuration.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    /// Process every `.pdf` file in the input directory, in file-name order.
    ///
    /// Only a missing or unreadable input directory is an error; per-file
    /// failures are recorded in the report.
    #[instrument(skip(self), fields(input_dir = %self.config.input_dir.display()))]
    pub fn run(&self) -> Result<(BatchReport, OutputAccumulator), StampwerkError> {
        let files = list_pdfs(&self.config.input_dir)?;
        if files.is_empty() {
            warn!(
                "No PDF files found in directory: {}",
                self.config.input_dir.display()
            );
        }
        info!(files = files.len(), backend = self.rasterizer.name(), "Batch started");

        let mut output = OutputAccumulator::new();
        let mut report = BatchReport {
            total_files: files.len(),
            ..BatchReport::default()
        };

        for (index, path) in files.iter().enumerate() {
            let stamped = StampLabel::for_index(&self.config.prefix, self.config.offset, index)
                .and_then(|label| self.stamp_file(path, &label, &mut output));
            match stamped {
                Ok(processed) => report.processed.push(processed),
                Err(err) => {
                    error!(path = %path.display(), %err, "Error processing file");
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Successfully processed {} out of {} files",
            report.succeeded(),
            report.total_files
        );
        Ok((report, output))
    }

    /// Stamp one file and merge its pages into `output`. Nothing is added to
    /// `output` unless the whole file succeeds.
    #[instrument(skip(self, output), fields(path = %path.display(), label = %label))]
    fn stamp_file(
        &self,
        path: &Path,
        label: &StampLabel,
        output: &mut OutputAccumulator,
    ) -> Result<ProcessedFile, StampwerkError> {
        let (mut pages, kind) = self.process_file(path, label)?;

        if let Some(dir) = &self.config.processed_dir {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let target = dir.join(format!("processed-{:04}_{}", label.sequence(), name));
            finalize(&mut pages, &target)?;
        }

        let page_count = output.append_document(pages.document())?;
        info!(pages = page_count, kind = ?kind, "File stamped");
        Ok(ProcessedFile {
            path: path.to_path_buf(),
            label: label.to_string(),
            kind,
            pages: page_count,
        })
    }

    /// Produce the stamped pages of `path` in a standalone accumulator.
    pub fn process_file(
        &self,
        path: &Path,
        label: &StampLabel,
    ) -> Result<(OutputAccumulator, DocumentKind), StampwerkError> {
        let mut reader = PdfReader::open(path)?;
        let kind = self.classifier.classify(&reader);
        let first_page = reader.page_id(1)?;
        let mut pages = OutputAccumulator::new();

        match kind {
            DocumentKind::TextBearing => {
                self.vector.stamp(reader.document_mut(), first_page, label)?;
                pages.append_document(reader.document())?;
            }
            DocumentKind::ImageOnly => {
                let page_box = reader.page_box(first_page)?;
                let image = self.rasterizer.rasterize_first_page(
                    path,
                    page_box,
                    self.config.raster_style.dpi,
                )?;
                // The rendered image is upright, so the new page carries the
                // displayed box and no /Rotate.
                let display_box = page_box.rotated(reader.page_rotation(first_page));
                let stamped =
                    PdfReader::from_bytes(&self.raster.stamp_page(image, label, display_box)?)?;
                pages.append_page(stamped.document(), stamped.page_id(1)?)?;

                let rest = reader.page_ids().split_off(1);
                if !rest.is_empty() {
                    pages.append_pages(reader.document(), &rest)?;
                }
            }
        }
        Ok((pages, kind))
    }
}

/// Regular files in `dir` whose names end in `.pdf`, sorted by file name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, StampwerkError> {
    if !dir.is_dir() {
        return Err(StampwerkError::InputDirectoryNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                warn!(%err, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().ends_with(".pdf"))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
