use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, LogFormat};
use cli::convert::cmd_convert;

mod cli;
mod discover;
mod encoder;
mod input;
pub(crate) mod timestamp;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_level = cli.loglevel.to_level_filter();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                let line = json_record(
                    &buf.timestamp().to_string(),
                    record.level(),
                    std::thread::current().name().unwrap_or("main"),
                    &record.args().to_string(),
                );
                writeln!(buf, "{line}")
            });
        }
    }

    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    log::debug!("wavpcm {}", wavpcm::VERSION);

    let summary = cmd_convert(&cli.convert, &cli, pb)?;
    if cli.strict && summary.failed > 0 {
        anyhow::bail!("{} of {} files failed to convert", summary.failed, summary.found);
    }

    Ok(())
}

fn json_record(ts: &str, level: log::Level, thread: &str, msg: &str) -> serde_json::Value {
    serde_json::json!({
        "ts": ts,
        "lvl": level.as_str(),
        "thread": thread,
        "msg": msg,
    })
}

#[test]
fn test_json_record() {
    let line = json_record(
        "2025-01-01T00:00:00Z",
        log::Level::Warn,
        "worker-0",
        "bad \"file\"\tC:\\in.wav\nnext\u{1}",
    )
    .to_string();
    assert!(!line.contains('\n'));

    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["lvl"], "WARN");
    assert_eq!(parsed["thread"], "worker-0");
    assert_eq!(parsed["msg"], "bad \"file\"\tC:\\in.wav\nnext\u{1}");
}
