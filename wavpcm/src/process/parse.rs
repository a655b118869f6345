use std::io::Read;

use log::{debug, trace};

use crate::log_or_err;
use crate::process::{
    DATA_ID, FMT_ID, RIFF_ID, WAVE_FORMAT_EXTENSIBLE, WAVE_FORMAT_IEEE_FLOAT, WAVE_FORMAT_PCM,
    WAVE_ID, fourcc,
};
use crate::structs::descriptor::{ContainerDescriptor, SampleFormat};
use crate::utils::byteorder::{ReadBytesBe, ReadBytesLe, skip_bytes};
use crate::utils::errors::{ParseError, StreamError};

/// Size of the fixed part of a `fmt ` chunk.
const FMT_PREFIX_LEN: u32 = 16;
/// Size of the `WAVE_FORMAT_EXTENSIBLE` fields this parser reads.
const FMT_EXTENSION_LEN: u32 = 10;

/// Parses WAVE headers into [`ContainerDescriptor`]s.
///
/// The reader is left positioned at the first payload byte of the data
/// chunk, so the caller can stream samples straight from it.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use wavpcm::process::{EXAMPLE_WAV, parse::Parser};
///
/// let mut reader = Cursor::new(EXAMPLE_WAV);
/// let descriptor = Parser::default().parse(&mut reader)?;
///
/// assert_eq!(descriptor.sample_rate, 44100);
/// assert_eq!(descriptor.bits_per_sample, 16);
/// assert_eq!(reader.position(), 44);
/// # Ok::<(), wavpcm::utils::errors::ParseError>(())
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    state: ParserState,
}

#[derive(Debug)]
pub struct ParserState {
    pub fail_level: log::Level,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
        }
    }
}

/// Raw contents of the `fmt ` chunk.
#[derive(Debug, Clone, Copy)]
struct FormatChunk {
    format_code: u16,
    channels: u16,
    sample_rate: u32,
    container_bits: u16,
    valid_bits: Option<u16>,
}

impl Parser {
    /// Sets the failure level for header irregularities.
    ///
    /// - `log::Level::Error`: only hard errors fail the parse (default)
    /// - `log::Level::Warn`: irregularities such as a data length that is not
    ///   a whole number of frames also fail (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }

    /// Reads the container header up to the start of the sample payload.
    pub fn parse<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> Result<ContainerDescriptor, ParseError> {
        let magic = u32::read_be(reader)?;
        if magic != RIFF_ID {
            return Err(ParseError::UnrecognizedContainer(magic));
        }

        let mut remaining = u32::read_le(reader)?;
        let form = u32::read_be(reader)?;
        if form != WAVE_ID {
            return Err(ParseError::NotAContainer(form));
        }
        remaining = remaining.saturating_sub(4);

        let mut format: Option<FormatChunk> = None;
        let mut data_length: Option<u32> = None;

        while remaining > 0 && data_length.is_none() {
            let chunk_id = match u32::read_be(reader) {
                Ok(id) => id,
                // Clean end of stream on a chunk boundary.
                Err(StreamError::Truncated { got: 0, .. }) => break,
                Err(e) => return Err(e.into()),
            };
            let chunk_size = u32::read_le(reader)?;
            let pad = chunk_size & 1;

            trace!("Chunk {} with {chunk_size} bytes", fourcc(chunk_id));

            // Only the declared size counts against the outer size; chunk
            // headers and pad bytes do not.
            if chunk_size > remaining {
                log_or_err!(
                    self.state,
                    log::Level::Warn,
                    ParseError::ChunkExceedsContainer {
                        chunk_id,
                        chunk_size,
                        remaining,
                    }
                );
            }
            remaining = remaining.saturating_sub(chunk_size);

            match chunk_id {
                FMT_ID => {
                    format = Some(Self::read_format(reader, chunk_size)?);
                }
                DATA_ID => {
                    if format.is_none() {
                        return Err(ParseError::MissingFormatChunk);
                    }
                    data_length = Some(chunk_size);
                }
                _ => {
                    debug!("Skipping {} chunk ({chunk_size} bytes)", fourcc(chunk_id));
                    skip_bytes(reader, chunk_size as u64 + pad as u64)?;
                }
            }
        }

        let format = format.ok_or(ParseError::MissingFormatChunk)?;
        let data_length = data_length.ok_or(ParseError::MissingDataChunk)?;

        self.describe(format, data_length)
    }

    fn read_format<R: Read + ?Sized>(
        reader: &mut R,
        chunk_size: u32,
    ) -> Result<FormatChunk, ParseError> {
        if chunk_size < FMT_PREFIX_LEN {
            return Err(ParseError::FormatChunkTooShort(chunk_size));
        }

        let mut format_code = u16::read_le(reader)?;
        let channels = u16::read_le(reader)?;
        let sample_rate = u32::read_le(reader)?;
        let _byte_rate = u32::read_le(reader)?;
        let _block_align = u16::read_le(reader)?;
        let container_bits = u16::read_le(reader)?;
        let mut consumed = FMT_PREFIX_LEN;
        let mut valid_bits = None;

        if format_code == WAVE_FORMAT_EXTENSIBLE && chunk_size - consumed > FMT_EXTENSION_LEN - 1 {
            let _extension_size = u16::read_le(reader)?;
            let valid = u16::read_le(reader)?;
            let _channel_mask = u32::read_le(reader)?;
            // First two bytes of the sub-format GUID hold the format code.
            format_code = u16::read_le(reader)?;
            consumed += FMT_EXTENSION_LEN;

            if valid != 0 {
                valid_bits = Some(valid);
            }
        }

        if format_code != WAVE_FORMAT_PCM && format_code != WAVE_FORMAT_IEEE_FLOAT {
            return Err(ParseError::UnsupportedFormat(format_code));
        }

        skip_bytes(reader, (chunk_size - consumed) as u64 + (chunk_size & 1) as u64)?;

        Ok(FormatChunk {
            format_code,
            channels,
            sample_rate,
            container_bits,
            valid_bits,
        })
    }

    fn describe(
        &mut self,
        format: FormatChunk,
        data_length: u32,
    ) -> Result<ContainerDescriptor, ParseError> {
        let is_float = format.format_code == WAVE_FORMAT_IEEE_FLOAT;

        if !(1..=2).contains(&format.channels) {
            return Err(ParseError::UnsupportedChannelCount(format.channels));
        }
        if format.sample_rate == 0 {
            return Err(ParseError::InvalidSampleRate);
        }

        let unsupported_depth = ParseError::UnsupportedBitDepth {
            bits: format.container_bits,
            is_float,
        };
        if format.container_bits == 0 || format.container_bits > 32 {
            return Err(unsupported_depth);
        }
        let bytes_per_sample = format.container_bits.div_ceil(8) as u8;
        let Some(sample_format) = SampleFormat::from_width(bytes_per_sample, is_float) else {
            return Err(unsupported_depth);
        };

        let bits_per_sample = format
            .valid_bits
            .filter(|&valid| valid <= format.container_bits)
            .unwrap_or(format.container_bits) as u8;

        let frame_size = format.channels as u32 * bytes_per_sample as u32;
        if data_length % frame_size != 0 {
            log_or_err!(
                self.state,
                log::Level::Warn,
                ParseError::MisalignedDataLength {
                    data_length,
                    frame_size,
                }
            );
        }

        Ok(ContainerDescriptor {
            channel_count: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample,
            is_float,
            sample_format,
            data_length,
            sample_count: data_length / frame_size,
        })
    }
}
