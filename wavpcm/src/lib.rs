//! WAVE container parsing and PCM normalization for batch MP3 encoding.
//!
//! ## Technical Overview
//!
//! The crate covers the parts of a WAVE-to-MP3 converter that do not depend
//! on a particular encoder or operating system.
//!
//! ### Container Organization
//!
//! **Outer chunk**: `RIFF` magic, a little-endian size and the `WAVE` form tag.
//! **Sub-chunks**: `fmt ` carries the stream parameters, `data` carries the
//! interleaved samples; every other chunk is skipped.
//!
//! ### Sample Formats
//!
//! - 8-bit unsigned PCM
//! - 16, 24 and 32-bit signed little-endian PCM
//! - 32-bit IEEE float
//!
//! Samples are handed to the encoder left-justified in 32-bit signed integers,
//! one buffer per channel.
//!
//! ## Quick Start
//!
//! 1. Parse the header with [`process::parse::Parser`]
//! 2. Demux each payload block with [`process::demux::Demuxer`]
//! 3. Or let [`process::convert::Pipeline`] drive both against an encoder
//!
//! ```rust
//! use std::io::Cursor;
//! use wavpcm::process::{EXAMPLE_WAV, demux::Demuxer, parse::Parser};
//! use wavpcm::structs::channel::ChannelBuffers;
//!
//! let mut reader = Cursor::new(EXAMPLE_WAV);
//! let descriptor = Parser::default().parse(&mut reader)?;
//! assert_eq!(descriptor.channel_count, 2);
//! assert_eq!(descriptor.sample_count, 2);
//!
//! let payload = &EXAMPLE_WAV[44..];
//! let demuxer = Demuxer::new(&descriptor);
//! let mut buffers = ChannelBuffers::new(2, 2);
//! demuxer.demux(payload, &mut buffers);
//!
//! assert_eq!(buffers.left(), &[0x2211_0000, 0x6655_0000]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Version of this library, reported by the command line front end.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Processing stages of a conversion.
///
/// 1. **Parsing** ([`process::parse`]): container header validation.
/// 2. **Demuxing** ([`process::demux`]): interleaved bytes to per-channel samples.
/// 3. **Encoding contract** ([`process::encode`]): what an encoder must provide.
/// 4. **Conversion** ([`process::convert`]): the per-file state machine.
/// 5. **Work distribution** ([`process::queue`]): shared task list for worker threads.
pub mod process;

/// Data structures shared between the stages.
///
/// - **Descriptors** ([`structs::descriptor`]): parsed stream parameters
/// - **Channel buffers** ([`structs::channel`]): demuxed sample storage
pub mod structs;

/// Supporting infrastructure.
///
/// - **Byte order** ([`utils::byteorder`]): fixed-width integer I/O
/// - **Error Handling** ([`utils::errors`]): error types
pub mod utils;
