/// Container header parsing.
///
/// Provides the [`Parser`](parse::Parser) that validates a WAVE header and
/// returns a [`ContainerDescriptor`](crate::structs::descriptor::ContainerDescriptor).
pub mod parse;

/// Interleaved PCM to per-channel sample conversion.
///
/// Provides the [`Demuxer`](demux::Demuxer) that fills
/// [`ChannelBuffers`](crate::structs::channel::ChannelBuffers) from raw payload blocks.
pub mod demux;

/// Contract of the external block encoder.
pub mod encode;

/// Per-file conversion state machine.
///
/// Provides the [`Pipeline`](convert::Pipeline) and [`convert_file`](convert::convert_file).
pub mod convert;

/// Shared task list for worker threads.
pub mod queue;

/// Size of one payload block read from the input.
///
/// 48 KiB is a whole number of frames for every supported layout
/// (frame sizes 1, 2, 3, 4, 6 and 8 bytes).
pub const BLOCK_SIZE: usize = 48 * 1024;

/// `RIFF` read as a big-endian integer.
pub const RIFF_ID: u32 = 0x5249_4646;
/// `WAVE` read as a big-endian integer.
pub const WAVE_ID: u32 = 0x5741_5645;
/// `fmt ` read as a big-endian integer.
pub const FMT_ID: u32 = 0x666D_7420;
/// `data` read as a big-endian integer.
pub const DATA_ID: u32 = 0x6461_7461;

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// A 16-bit stereo file holding two frames.
pub const EXAMPLE_WAV: &[u8] = &[
    0x52, 0x49, 0x46, 0x46, 0x2C, 0x00, 0x00, 0x00, 0x57, 0x41, 0x56, 0x45, 0x66, 0x6D, 0x74, 0x20,
    0x10, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00, 0x44, 0xAC, 0x00, 0x00, 0x10, 0xB1, 0x02, 0x00,
    0x04, 0x00, 0x10, 0x00, 0x64, 0x61, 0x74, 0x61, 0x08, 0x00, 0x00, 0x00, 0x11, 0x22, 0x33, 0x44,
    0x55, 0x66, 0x77, 0x88,
];

/// Fourcc of a chunk id for log messages.
pub fn fourcc(id: u32) -> String {
    id.to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}


#[test]
fn test_fourcc() {
    assert_eq!(fourcc(FMT_ID), "fmt ");
    assert_eq!(fourcc(DATA_ID), "data");
    assert_eq!(fourcc(0x4C49_5300), "LIS?");
}
