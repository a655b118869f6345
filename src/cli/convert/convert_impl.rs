use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, mpsc};
use std::time::Instant;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar};
use log::Level;
use wavpcm::process::convert::StreamOpener;
use wavpcm::process::encode::EncoderFactory;
use wavpcm::process::queue::WorkBatch;

use super::progress::{create_progress_bar, finalize_progress_bar, update_progress_bar};
use super::report::{BatchReport, BatchSummary, FileOutcome, FileStatus, REPORT_VERSION};
use super::worker::{WorkerConfig, WorkerOptions, spawn_worker};
use crate::cli::command::{Cli, ConvertArgs};
use crate::discover::discover_inputs;
use crate::encoder::LameFactory;
use crate::input::FsStreams;
use crate::timestamp::time_str;

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Worker limit. Fewer threads are started when there are fewer files.
    pub threads: usize,
    pub worker: WorkerOptions,
}

pub fn cmd_convert(
    args: &ConvertArgs,
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<BatchSummary> {
    log::info!(
        "Converting WAVE files in {} (strict mode: {}, dry run: {})",
        args.dir.display(),
        cli.strict,
        args.dry_run
    );
    let start = Instant::now();

    let names = discover_inputs(&args.dir)?;
    if names.is_empty() {
        log::warn!("No .wav or .wave files found in {}", args.dir.display());
    }

    let threads = args.thread_limit().min(names.len()).max(1);
    log::info!("Found {} input files, using {threads} worker threads", names.len());

    // Configure fail level based on strict mode
    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };

    let options = BatchOptions {
        threads,
        worker: WorkerOptions {
            skip_existing: args.skip_existing,
            dry_run: args.dry_run,
            fail_level,
        },
    };

    let pb = match multi {
        Some(multi) if !names.is_empty() => {
            Some(create_progress_bar(multi, names.len() as u64)?)
        }
        _ => None,
    };

    let outcomes = run_batch(
        &args.dir,
        names,
        options,
        Arc::new(FsStreams),
        Arc::new(LameFactory),
        pb.as_ref(),
    )?;

    let summary = BatchSummary::from_outcomes(&outcomes);
    if let Some(ref pb) = pb {
        finalize_progress_bar(pb, &summary);
    }

    let elapsed = start.elapsed().as_secs_f64();
    log::info!(
        "Batch finished in {}: {} found, {} converted, {} failed, {} skipped",
        time_str(elapsed),
        summary.found,
        summary.converted,
        summary.failed,
        summary.skipped
    );
    if summary.failed > 0 {
        let failed: Vec<&str> = outcomes
            .iter()
            .filter(|outcome| outcome.status.is_failure())
            .map(|outcome| outcome.file_name.as_str())
            .collect();
        log::warn!("Failed files: {}", failed.join(", "));
    }
    if args.dry_run {
        log::info!("Dry run: {} files would be converted", summary.probed);
    }

    if let Some(ref path) = args.report {
        let report = BatchReport {
            version: REPORT_VERSION,
            directory: args.dir.display().to_string(),
            threads,
            dry_run: args.dry_run,
            elapsed,
            summary: summary.clone(),
            files: outcomes,
        };
        report.write_to(path)?;
        log::info!("Report written to {}", path.display());
    }

    Ok(summary)
}

/// Converts every named file in `dir` on a pool of worker threads.
///
/// Returns one outcome per name, in the order of `names`. A failing file
/// never stops the others.
pub fn run_batch<S, F>(
    dir: &Path,
    names: Vec<String>,
    options: BatchOptions,
    streams: Arc<S>,
    encoders: Arc<F>,
    pb: Option<&ProgressBar>,
) -> Result<Vec<FileOutcome>>
where
    S: StreamOpener + 'static,
    F: EncoderFactory + 'static,
{
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let order: HashMap<String, usize> = names
        .iter()
        .enumerate()
        .map(|(index, name)| (name.clone(), index))
        .collect();
    let threads = options.threads.clamp(1, names.len());
    let batch = Arc::new(WorkBatch::new(dir, names));

    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(threads);
    for id in 0..threads {
        let config = WorkerConfig {
            id,
            batch: Arc::clone(&batch),
            streams: Arc::clone(&streams),
            encoders: Arc::clone(&encoders),
            options: options.worker,
            tx: tx.clone(),
        };
        match spawn_worker(config) {
            Ok(handle) => handles.push(handle),
            Err(e) => log::error!("Failed to start worker {id}: {e}"),
        }
    }
    drop(tx);

    if handles.is_empty() {
        anyhow::bail!("Could not start any worker thread");
    }
    if handles.len() < threads {
        log::warn!("Running with {} of {threads} worker threads", handles.len());
    }

    let mut outcomes = Vec::with_capacity(order.len());
    for outcome in rx {
        if let Some(pb) = pb {
            update_progress_bar(pb, &outcome);
        }
        outcomes.push(outcome);
    }

    for (id, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
            log::error!("Worker {id} panicked");
        }
    }

    // A task claimed by a worker that panicked has no outcome.
    let mut reported = vec![false; order.len()];
    for outcome in &outcomes {
        if let Some(&index) = order.get(&outcome.file_name) {
            reported[index] = true;
        }
    }
    let mut lost: Vec<(usize, &String)> = order
        .iter()
        .filter(|&(_, &index)| !reported[index])
        .map(|(name, &index)| (index, name))
        .collect();
    lost.sort();
    for (_, name) in lost {
        log::error!("{name}: worker terminated before reporting a result");
        let mut outcome = FileOutcome::new(name.as_str(), FileStatus::Failed);
        outcome.error = Some("worker terminated".to_string());
        outcomes.push(outcome);
    }

    outcomes.sort_by_key(|outcome| order.get(&outcome.file_name).copied());
    Ok(outcomes)
}
