// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Finalizer — persist an accumulated document durably.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use stampwerk_core::error::StampwerkError;
use tracing::{info, instrument};

use crate::pdf::accumulator::OutputAccumulator;

/// Write `accumulator` to `path`, creating parent directories as needed.
///
/// Returns only after the data has been flushed and synced to disk. An empty
/// accumulator still produces a valid (zero-page) PDF.
#[instrument(skip(accumulator), fields(path = %path.as_ref().display(), pages = accumulator.page_count()))]
pub fn finalize(
    accumulator: &mut OutputAccumulator,
    path: impl AsRef<Path>,
) -> Result<PathBuf, StampwerkError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    accumulator.write_to(&mut writer)?;
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|err| StampwerkError::Io(err.into_error()))?;
    file.sync_all()?;

    info!("Output written");
    Ok(path.to_path_buf())
}
