use crate::structs::channel::ChannelBuffers;
use crate::structs::descriptor::{ContainerDescriptor, SampleFormat};

/// Splits interleaved little-endian PCM into left-justified channel buffers.
///
/// Every sample lands in an `i32` with its most significant bit at bit 31:
/// an 8-bit sample occupies bits 31-24, a 16-bit sample bits 31-16 and so on.
/// 8-bit input is unsigned and has its 0x80 bias removed first.
///
/// # Example
///
/// ```rust
/// use wavpcm::process::demux::Demuxer;
/// use wavpcm::structs::channel::ChannelBuffers;
/// use wavpcm::structs::descriptor::SampleFormat;
///
/// let demuxer = Demuxer::with_layout(SampleFormat::I24, 2);
/// let mut buffers = ChannelBuffers::new(2, 2);
///
/// let block = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB];
/// assert_eq!(demuxer.demux(&block, &mut buffers), 2);
///
/// assert_eq!(buffers.left(), &[0x2211_0000, 0x8877_6600u32 as i32]);
/// assert_eq!(buffers.right().unwrap(), &[0x5544_3300, 0xBBAA_9900u32 as i32]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Demuxer {
    format: SampleFormat,
    channels: usize,
}

impl Demuxer {
    pub fn new(descriptor: &ContainerDescriptor) -> Self {
        Self::with_layout(descriptor.sample_format, descriptor.channel_count as usize)
    }

    /// `channels` is clamped to 1..=2.
    pub fn with_layout(format: SampleFormat, channels: usize) -> Self {
        Self {
            format,
            channels: channels.clamp(1, 2),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.format.bytes_per_sample() * self.channels
    }

    /// Replaces the contents of `out` with the samples of `block` and returns
    /// the number of frames produced.
    ///
    /// Only whole frames are converted. A trailing partial frame is dropped,
    /// for every channel, so the buffers never disagree in length.
    pub fn demux(&self, block: &[u8], out: &mut ChannelBuffers) -> usize {
        if out.channel_count() != self.channels {
            *out = ChannelBuffers::new(self.channels, 0);
        }
        out.clear();

        let width = self.format.bytes_per_sample();
        let frames = block.chunks_exact(self.frame_size());
        out.reserve(frames.len());

        match self.channels {
            1 => frames.for_each(|frame| out.push_mono(self.sample(frame))),
            _ => frames.for_each(|frame| {
                let (left, right) = frame.split_at(width);
                out.push_stereo(self.sample(left), self.sample(right));
            }),
        }

        out.frames()
    }

    #[inline]
    fn sample(&self, bytes: &[u8]) -> i32 {
        left_justify(self.format, bytes)
    }
}

/// Converts one little-endian sample slot into a left-justified `i32`.
///
/// `bytes` must hold exactly `format.bytes_per_sample()` bytes.
#[inline]
pub fn left_justify(format: SampleFormat, bytes: &[u8]) -> i32 {
    match (format, bytes) {
        (SampleFormat::U8, &[b0]) => i32::from_le_bytes([0, 0, 0, b0 ^ 0x80]),
        (SampleFormat::I16, &[b0, b1]) => i32::from_le_bytes([0, 0, b0, b1]),
        (SampleFormat::I24, &[b0, b1, b2]) => i32::from_le_bytes([0, b0, b1, b2]),
        (SampleFormat::I32, &[b0, b1, b2, b3]) => i32::from_le_bytes([b0, b1, b2, b3]),
        (SampleFormat::F32, &[b0, b1, b2, b3]) => {
            let value = f32::from_le_bytes([b0, b1, b2, b3]);
            if value.is_nan() {
                0
            } else {
                // `as` saturates, the clamp keeps -1.0 symmetric with 1.0.
                (value.clamp(-1.0, 1.0) as f64 * i32::MAX as f64) as i32
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demux(format: SampleFormat, channels: usize, block: &[u8]) -> ChannelBuffers {
        let mut buffers = ChannelBuffers::new(channels, 0);
        Demuxer::with_layout(format, channels).demux(block, &mut buffers);
        buffers
    }

    #[test]
    fn stereo_16_bit() {
        let block = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        let buffers = demux(SampleFormat::I16, 2, &block);

        assert_eq!(buffers.left(), &[0x2211_0000, 0x6655_0000]);
        assert_eq!(
            buffers.right().unwrap(),
            &[0x4433_0000, 0x8877_0000u32 as i32]
        );
    }

    #[test]
    fn unsigned_8_bit_bias() {
        let buffers = demux(SampleFormat::U8, 1, &[0x00, 0x80, 0xFF]);
        assert_eq!(buffers.left(), &[i32::MIN, 0, 0x7F00_0000]);
        assert!(buffers.right().is_none());

        let buffers = demux(SampleFormat::U8, 2, &[0x00, 0x11, 0x22, 0x33]);
        assert_eq!(buffers.left(), &[0x8000_0000u32 as i32, 0xA200_0000u32 as i32]);
        assert_eq!(buffers.right().unwrap(), &[0x9100_0000u32 as i32, 0xB300_0000u32 as i32]);
    }

    #[test]
    fn mono_24_bit() {
        let block = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
        let buffers = demux(SampleFormat::I24, 1, &block);
        assert_eq!(buffers.left(), &[0x2211_0000, 0x5544_3300]);
    }

    #[test]
    fn stereo_32_bit() {
        let block = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
            0xEE, 0xFF,
        ];
        let buffers = demux(SampleFormat::I32, 2, &block);
        assert_eq!(buffers.left(), &[0x3322_1100, 0xBBAA_9988u32 as i32]);
        assert_eq!(
            buffers.right().unwrap(),
            &[0x7766_5544, 0xFFEE_DDCCu32 as i32]
        );
    }

    #[test]
    fn partial_frame_is_dropped() {
        // Two full 24-bit stereo frames, then only the left sample of a third.
        let mut block = vec![0u8; 12];
        block.extend_from_slice(&[0x01, 0x02, 0x03]);
        let buffers = demux(SampleFormat::I24, 2, &block);

        assert_eq!(buffers.frames(), 2);
        assert_eq!(buffers.right().unwrap().len(), 2);

        let buffers = demux(SampleFormat::I16, 1, &[0x01, 0x02, 0x03]);
        assert_eq!(buffers.left(), &[0x0201_0000]);
    }

    #[test]
    fn float_is_scaled() {
        let mut block = Vec::new();
        for value in [0.0f32, 1.0, -1.0, 2.0, 0.5, f32::NAN] {
            block.extend_from_slice(&value.to_le_bytes());
        }
        let buffers = demux(SampleFormat::F32, 1, &block);
        assert_eq!(
            buffers.left(),
            &[0, i32::MAX, -i32::MAX, i32::MAX, i32::MAX / 2, 0]
        );
    }

    #[test]
    fn buffers_are_reused() {
        let demuxer = Demuxer::with_layout(SampleFormat::I16, 2);
        let mut buffers = ChannelBuffers::new(1, 0);

        assert_eq!(demuxer.demux(&[0; 8], &mut buffers), 2);
        assert_eq!(buffers.channel_count(), 2);

        assert_eq!(demuxer.demux(&[0; 4], &mut buffers), 1);
        assert_eq!(buffers.left().len(), 1);

        assert_eq!(demuxer.demux(&[], &mut buffers), 0);
        assert!(buffers.is_empty());
    }
}
