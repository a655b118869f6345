use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Args, Parser as ClapParser, ValueEnum};

/// Upper bound of the default worker count.
pub const MAX_DEFAULT_THREADS: usize = 20;

static LONG_VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{}\nwavpcm {}\nbuilt {}",
        env!("CARGO_PKG_VERSION"),
        wavpcm::VERSION,
        env!("BUILD_TIMESTAMP"),
    )
});

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION.as_str(),
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Convert every WAVE file in a directory to MP3",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors and exit non-zero if any file fails.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show a progress bar while converting.
    #[arg(long, global = true)]
    pub progress: bool,

    #[command(flatten)]
    pub convert: ConvertArgs,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Directory holding the .wav/.wave files to convert.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Maximum number of worker threads [default: available cores, at most 20].
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..=64))]
    pub threads: Option<u16>,

    /// Leave inputs alone whose .mp3 already exists.
    #[arg(long)]
    pub skip_existing: bool,

    /// Only parse headers and log what would be converted.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a YAML report of the batch to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl ConvertArgs {
    /// Worker limit, before capping by the number of files.
    pub fn thread_limit(&self) -> usize {
        match self.threads {
            Some(n) => n as usize,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_DEFAULT_THREADS),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_directory_and_flags() {
        let cli = Cli::try_parse_from([
            "wavmp3",
            "music",
            "-j",
            "4",
            "--skip-existing",
            "--report",
            "out.yaml",
            "--strict",
        ])
        .unwrap();

        assert_eq!(cli.convert.dir, PathBuf::from("music"));
        assert_eq!(cli.convert.thread_limit(), 4);
        assert!(cli.convert.skip_existing);
        assert!(!cli.convert.dry_run);
        assert_eq!(cli.convert.report, Some(PathBuf::from("out.yaml")));
        assert!(cli.strict);
    }

    #[test]
    fn directory_is_required() {
        assert!(Cli::try_parse_from(["wavmp3"]).is_err());
    }

    #[test]
    fn thread_count_is_bounded() {
        assert!(Cli::try_parse_from(["wavmp3", "d", "-j", "0"]).is_err());
        assert!(Cli::try_parse_from(["wavmp3", "d", "-j", "65"]).is_err());
        assert!(Cli::try_parse_from(["wavmp3", "d", "-j", "0x10"]).is_err());
        // base 10, leading zeros allowed
        let cli = Cli::try_parse_from(["wavmp3", "d", "--threads", "010"]).unwrap();
        assert_eq!(cli.convert.thread_limit(), 10);
    }

    #[test]
    fn default_thread_limit_is_capped() {
        let cli = Cli::try_parse_from(["wavmp3", "d"]).unwrap();
        let limit = cli.convert.thread_limit();
        assert!((1..=MAX_DEFAULT_THREADS).contains(&limit));
    }

    #[test]
    fn long_version_names_library() {
        let command = Cli::command();
        let long = command.get_long_version().unwrap_or_default();
        assert!(long.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(long.contains(&format!("wavpcm {}", wavpcm::VERSION)));
    }
}
