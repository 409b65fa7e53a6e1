// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stampwerk — batch PDF stamper.
//
// Labels page 1 of every PDF in the input directory with `<prefix> <NNNN>`
// and merges all pages into a single output document.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use stampwerk_core::error::StampwerkError;
use stampwerk_document::{BatchStamper, finalize};

use crate::cli::Cli;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "batch aborted");
            eprintln!("An error occurred: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StampwerkError> {
    let config = cli.resolve_config()?;
    let output_path = config.resolve_output_path(chrono::Local::now().date_naive());
    tracing::info!(
        input_dir = %config.input_dir.display(),
        output = %output_path.display(),
        offset = config.offset,
        "Stampwerk starting"
    );

    let stamper = BatchStamper::new(config)?;
    let (mut report, mut output) = stamper.run()?;
    report.output_path = Some(finalize(&mut output, &output_path)?);

    println!("Combined PDF file saved: {}", output_path.display());
    println!(
        "Successfully processed {} out of {} files",
        report.succeeded(),
        report.total_files
    );
    if report.succeeded() == 0 {
        println!("Warning: No files were processed successfully!");
    }
    Ok(())
}
