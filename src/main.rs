mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Commands};
use tokio_util::sync::CancellationToken;

use pixport::batch::{BatchOptions, BatchRunner, BatchSummary, ConversionJob, JobStatus};
use pixport::convert::RasterConverter;
use pixport::export;
use pixport::export::naming::{sanitize_file_name, NameAllocator};
use pixport_common::ImageFormat;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "pixport=debug,pixport_archive=debug,pixport_common=debug".to_string()
        } else {
            "pixport=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Convert {
            inputs,
            to,
            out,
            timeout_secs,
            delay_ms,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_convert(inputs, to, out, timeout_secs, delay_ms))
        }
        Commands::Formats => {
            for format in ImageFormat::ALL {
                println!("{format}");
            }
            Ok(())
        }
        Commands::Version => {
            println!("pixport {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_convert(
    inputs: Vec<PathBuf>,
    target: ImageFormat,
    out: Option<PathBuf>,
    timeout_secs: u64,
    delay_ms: Option<u64>,
) -> Result<()> {
    let jobs = admit_jobs(&inputs, target);
    if jobs.is_empty() {
        anyhow::bail!("No readable image inputs to convert");
    }

    let options = BatchOptions {
        job_timeout: Duration::from_secs(timeout_secs),
        inter_job_delay: delay_ms.map(Duration::from_millis),
    };
    let cancel = CancellationToken::new();

    // Ctrl-C requests cooperative cancellation: remaining jobs are skipped
    // and the in-flight result is discarded, not interrupted.
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Cancellation requested");
            ctrl_c_cancel.cancel();
        }
    });

    let runner = BatchRunner::new(Arc::new(RasterConverter));
    let summary = runner.run(jobs, &options, &cancel).await;
    print_summary(&summary);

    let outputs: Vec<_> = summary.completed_outputs().cloned().collect();
    if outputs.is_empty() {
        println!("Nothing to export.");
        return Ok(());
    }

    let path = out.unwrap_or_else(|| PathBuf::from(export::archive_file_name(Utc::now())));
    match export::build_archive(&outputs) {
        Ok(archive) => {
            std::fs::write(&path, &archive)
                .with_context(|| format!("Failed to write archive to {}", path.display()))?;
            println!(
                "Wrote {} ({} entries, {} bytes)",
                path.display(),
                outputs.len(),
                archive.len()
            );
        }
        Err(e) => {
            // Hard export failure: save what succeeded as individual files.
            tracing::error!(error = %e, "Export failed; falling back to per-file output");
            write_individual_outputs(&outputs)?;
        }
    }

    Ok(())
}

/// Read each input and build its conversion job. Unreadable files and
/// unrecognized extensions are logged and skipped.
fn admit_jobs(inputs: &[PathBuf], target: ImageFormat) -> Vec<ConversionJob> {
    let mut jobs = Vec::new();

    for path in inputs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let source_format = match source_format_of(path) {
            Some(format) => format,
            None => {
                tracing::warn!(path = %path.display(), "Skipping: unrecognized image extension");
                continue;
            }
        };

        match std::fs::read(path) {
            Ok(bytes) => {
                jobs.push(ConversionJob::new(
                    name,
                    Bytes::from(bytes),
                    source_format,
                    target,
                ));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping: read failed");
            }
        }
    }

    jobs
}

fn source_format_of(path: &Path) -> Option<ImageFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
}

fn print_summary(summary: &BatchSummary) {
    for job in &summary.jobs {
        let marker = match job.status {
            JobStatus::Completed => "✓",
            JobStatus::Cancelled => "-",
            _ => "✗",
        };
        print!("{} {}", marker, job.source_name);
        if let Some(ref error) = job.error {
            print!(" ({error})");
        }
        println!();
    }

    println!(
        "\n{} completed, {} failed, {} cancelled in {:.1}s",
        summary.completed,
        summary.failed,
        summary.cancelled,
        summary.elapsed.as_secs_f64()
    );
}

/// Per-file fallback when the archive cannot be produced.
fn write_individual_outputs(outputs: &[pixport::batch::ConvertedImage]) -> Result<()> {
    let dir = PathBuf::from(format!(
        "converted_images_{}",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut names = NameAllocator::new();
    for output in outputs {
        let candidate = sanitize_file_name(&output.source_name, output.format.extension());
        let name = names
            .resolve(&candidate)
            .context("Failed to allocate a fallback file name")?;
        let path = dir.join(&name);
        std::fs::write(&path, &output.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
