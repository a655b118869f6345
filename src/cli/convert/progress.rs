use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::report::{BatchSummary, FileOutcome};

pub fn create_progress_bar(multi: &MultiProgress, total_files: u64) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(total_files));
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} files ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("starting workers");
    Ok(pb)
}

pub fn update_progress_bar(pb: &ProgressBar, outcome: &FileOutcome) {
    pb.inc(1);
    pb.set_message(format!("{}: {}", outcome.status, outcome.file_name));
}

pub fn finalize_progress_bar(pb: &ProgressBar, summary: &BatchSummary) {
    pb.set_style(
        ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} files\n{msg} | elapsed: {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.finish_with_message(format!(
        "converted: {} | failed: {} | skipped: {}",
        summary.converted, summary.failed, summary.skipped
    ));
}
