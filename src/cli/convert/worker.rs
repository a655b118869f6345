use std::io;
use std::path::Path;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Instant;

use log::Level;
use wavpcm::process::convert::{StreamOpener, convert_file, probe_file};
use wavpcm::process::encode::EncoderFactory;
use wavpcm::process::parse::Parser;
use wavpcm::process::queue::{FileTask, WorkBatch};
use wavpcm::utils::errors::ConvertError;

use super::report::{FileOutcome, FileStatus};
use crate::discover::output_path;
use crate::timestamp::time_str;

#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    pub skip_existing: bool,
    pub dry_run: bool,
    pub fail_level: Level,
}

pub struct WorkerConfig<S, F> {
    pub id: usize,
    pub batch: Arc<WorkBatch>,
    pub streams: Arc<S>,
    pub encoders: Arc<F>,
    pub options: WorkerOptions,
    pub tx: mpsc::Sender<FileOutcome>,
}

/// Starts a worker that claims tasks until the queue is drained.
///
/// The thread returns the number of files it handled. Every claimed file is
/// reported on `tx`, whatever its outcome.
pub fn spawn_worker<S, F>(config: WorkerConfig<S, F>) -> io::Result<thread::JoinHandle<usize>>
where
    S: StreamOpener + 'static,
    F: EncoderFactory + 'static,
{
    thread::Builder::new()
        .name(format!("worker-{}", config.id))
        .spawn(move || {
            let WorkerConfig {
                id,
                batch,
                streams,
                encoders,
                options,
                tx,
            } = config;

            let mut parser = Parser::default();
            parser.set_fail_level(options.fail_level);

            let mut handled = 0;
            while let Some(task) = batch.queue.claim_next() {
                log::debug!("Worker {id} claimed {}", task.file_name);
                let outcome =
                    process_task(&batch, &task, streams.as_ref(), encoders.as_ref(), &mut parser, options);
                handled += 1;

                if tx.send(outcome).is_err() {
                    log::debug!("Worker {id}: result channel closed");
                    break;
                }
            }

            log::debug!("Worker {id} finished after {handled} files");
            handled
        })
}

pub fn process_task<S: StreamOpener, F: EncoderFactory>(
    batch: &WorkBatch,
    task: &FileTask,
    streams: &S,
    encoders: &F,
    parser: &mut Parser,
    options: WorkerOptions,
) -> FileOutcome {
    let src = batch.input_path(task);
    let dst = output_path(&src);
    let start = Instant::now();

    let mut outcome = if options.skip_existing && dst.exists() {
        log::info!("{}: {} exists, skipping", task.file_name, display_name(&dst));
        FileOutcome::new(&task.file_name, FileStatus::Skipped)
    } else if options.dry_run {
        probe_task(task, &src, streams, parser)
    } else {
        convert_task(task, &src, &dst, streams, encoders, parser)
    };

    outcome.elapsed = start.elapsed().as_secs_f64();
    if outcome.status == FileStatus::Converted {
        let speed = if outcome.elapsed > 0.0 {
            outcome.duration / outcome.elapsed
        } else {
            0.0
        };
        log::info!(
            "{}: {} frames, {} of audio, {:.1}x realtime",
            task.file_name,
            outcome.frames,
            time_str(outcome.duration),
            speed
        );
    }
    outcome
}

fn probe_task<S: StreamOpener>(
    task: &FileTask,
    src: &Path,
    streams: &S,
    parser: &mut Parser,
) -> FileOutcome {
    match probe_file(src, streams, parser) {
        Ok((_, descriptor)) => {
            log::info!(
                "{}: {descriptor}, {}",
                task.file_name,
                time_str(descriptor.duration_secs())
            );
            let mut outcome = FileOutcome::new(&task.file_name, FileStatus::Probed);
            outcome.format = Some(descriptor.to_string());
            outcome.duration = descriptor.duration_secs();
            outcome
        }
        Err(e) => failed(task, e),
    }
}

fn convert_task<S: StreamOpener, F: EncoderFactory>(
    task: &FileTask,
    src: &Path,
    dst: &Path,
    streams: &S,
    encoders: &F,
    parser: &mut Parser,
) -> FileOutcome {
    let result = convert_file(src, dst, streams, encoders, parser);

    let mut outcome = match result.error {
        Some(e) => failed(task, e),
        None => FileOutcome::new(&task.file_name, FileStatus::Converted),
    };
    outcome.frames = result.frames_processed;
    outcome.bytes_written = result.bytes_written;
    if let Some(descriptor) = result.descriptor {
        outcome.format = Some(descriptor.to_string());
        if descriptor.sample_rate > 0 {
            outcome.duration = result.frames_processed as f64 / descriptor.sample_rate as f64;
        }
    }
    outcome
}

fn failed(task: &FileTask, error: ConvertError) -> FileOutcome {
    log::error!("{}: {error}", task.file_name);

    let status = if error.is_unsupported_input() {
        FileStatus::Unsupported
    } else {
        FileStatus::Failed
    };
    let mut outcome = FileOutcome::new(&task.file_name, status);
    outcome.error = Some(error.to_string());
    outcome
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
