use std::fmt::Display;

/// Layout of a single sample slot in the data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit unsigned, biased by 0x80.
    U8,
    /// 16-bit signed little-endian.
    I16,
    /// 24-bit signed little-endian, packed.
    I24,
    /// 32-bit signed little-endian.
    I32,
    /// 32-bit IEEE float little-endian.
    F32,
}

impl SampleFormat {
    /// Picks the slot layout for a byte width. Returns `None` for widths the
    /// demuxer cannot handle.
    pub fn from_width(bytes_per_sample: u8, is_float: bool) -> Option<Self> {
        match (bytes_per_sample, is_float) {
            (1, false) => Some(Self::U8),
            (2, false) => Some(Self::I16),
            (3, false) => Some(Self::I24),
            (4, false) => Some(Self::I32),
            (4, true) => Some(Self::F32),
            _ => None,
        }
    }

    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 => 2,
            Self::I24 => 3,
            Self::I32 | Self::F32 => 4,
        }
    }
}

impl Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleFormat::U8 => write!(f, "u8"),
            SampleFormat::I16 => write!(f, "s16le"),
            SampleFormat::I24 => write!(f, "s24le"),
            SampleFormat::I32 => write!(f, "s32le"),
            SampleFormat::F32 => write!(f, "f32le"),
        }
    }
}

/// Stream parameters extracted from a WAVE header.
///
/// Built once per input file by [`Parser`](crate::process::parse::Parser)
/// and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerDescriptor {
    /// 1 (mono) or 2 (stereo).
    pub channel_count: u16,
    pub sample_rate: u32,
    /// Significant bits per sample. For extensible headers this is the
    /// valid-bits field when present.
    pub bits_per_sample: u8,
    pub is_float: bool,
    /// Layout of one sample slot in the data chunk.
    pub sample_format: SampleFormat,
    /// Payload size in bytes as declared by the data chunk.
    pub data_length: u32,
    /// `data_length / frame_size`. Advisory only.
    pub sample_count: u32,
}

impl ContainerDescriptor {
    /// Bytes occupied by one sample of every channel.
    pub fn frame_size(&self) -> usize {
        self.channel_count as usize * self.bytes_per_sample()
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.sample_format.bytes_per_sample()
    }

    /// Playback duration implied by the declared sample count.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f64 / self.sample_rate as f64
    }

    pub fn is_stereo(&self) -> bool {
        self.channel_count == 2
    }
}

impl Display for ContainerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ch, {} Hz, {} bit {}, {} bytes of payload ({} samples)",
            self.channel_count,
            self.sample_rate,
            self.bits_per_sample,
            self.sample_format,
            self.data_length,
            self.sample_count
        )
    }
}

#[test]
fn test_frame_size() {
    let descriptor = ContainerDescriptor {
        channel_count: 2,
        sample_rate: 48000,
        bits_per_sample: 24,
        is_float: false,
        sample_format: SampleFormat::I24,
        data_length: 48000 * 6,
        sample_count: 48000,
    };

    assert_eq!(descriptor.frame_size(), 6);
    assert_eq!(descriptor.bytes_per_sample(), 3);
    assert_eq!(descriptor.duration_secs(), 1.0);
    assert!(descriptor.is_stereo());
}
