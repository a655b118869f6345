use std::io;
use std::path::PathBuf;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("Stream truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("Unrecognized container magic {0:#010X}")]
    UnrecognizedContainer(u32),

    #[error("Not a WAVE container: form tag {0:#010X}")]
    NotAContainer(u32),

    #[error("Non-PCM audio format {0:#06X} is not supported")]
    UnsupportedFormat(u16),

    #[error("Unsupported sample depth: {bits} bits (float: {is_float})")]
    UnsupportedBitDepth { bits: u16, is_float: bool },

    #[error("Unsupported channel count {0}, the encoder accepts 1 or 2")]
    UnsupportedChannelCount(u16),

    #[error("Sample rate must be non-zero")]
    InvalidSampleRate,

    #[error("fmt chunk must hold at least 16 bytes. Read {0}")]
    FormatChunkTooShort(u32),

    #[error("data chunk found before any fmt chunk")]
    MissingFormatChunk,

    #[error("No data chunk within the declared container size")]
    MissingDataChunk,

    #[error(
        "{} chunk declares {chunk_size} bytes but the container has {remaining} left",
        crate::process::fourcc(*chunk_id)
    )]
    ChunkExceedsContainer {
        chunk_id: u32,
        chunk_size: u32,
        remaining: u32,
    },

    #[error("data length {data_length} is not a multiple of the frame size {frame_size}")]
    MisalignedDataLength { data_length: u32, frame_size: u32 },

    #[error("Truncated header: {0}")]
    TruncatedHeader(#[from] StreamError),
}

#[derive(thiserror::Error, Debug)]
pub enum EncoderError {
    #[error("Encoder initialization failed: {0}")]
    Init(String),

    #[error("Encoder rejected configuration: {0}")]
    Configure(String),

    #[error("Failed to encode block: {0}")]
    Encode(String),

    #[error("Failed to flush encoder: {0}")]
    Flush(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Failed to open input {}: {source}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open output {}: {source}", .path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Encoder(#[from] EncoderError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConvertError {
    /// Whether the input was rejected before any encoder was created.
    pub fn is_unsupported_input(&self) -> bool {
        matches!(self, ConvertError::Parse(_))
    }
}
