use mp3lame_encoder::{self as mp3, FlushGap};

use wavpcm::process::encode::{BlockEncoder, EncoderFactory};
use wavpcm::structs::channel::ChannelBuffers;
use wavpcm::structs::descriptor::ContainerDescriptor;
use wavpcm::utils::errors::EncoderError;

/// Creates LAME encoders with default quality settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct LameFactory;

impl EncoderFactory for LameFactory {
    type Encoder = LameEncoder;

    fn create(&self, descriptor: &ContainerDescriptor) -> Result<LameEncoder, EncoderError> {
        let mut builder = mp3::Builder::new()
            .ok_or_else(|| EncoderError::Init("LAME context allocation failed".to_string()))?;

        builder
            .set_num_channels(descriptor.channel_count as u8)
            .map_err(|e| EncoderError::Configure(format!("channel count: {e:?}")))?;
        builder
            .set_sample_rate(descriptor.sample_rate)
            .map_err(|e| EncoderError::Configure(format!("sample rate: {e:?}")))?;
        set_sample_hint(&mut builder, descriptor.sample_count)?;

        let inner = builder
            .build()
            .map_err(|e| EncoderError::Configure(format!("{e:?}")))?;

        log::trace!(
            "LAME ready: {} ch, {} Hz, {} samples expected",
            descriptor.channel_count,
            descriptor.sample_rate,
            descriptor.sample_count
        );

        Ok(LameEncoder { inner })
    }
}

/// Tells LAME how many samples per channel to expect. Only the VBR/Xing
/// header uses it; the stream itself is not cut to this length.
fn set_sample_hint(builder: &mut mp3::Builder, samples: u32) -> Result<(), EncoderError> {
    // SAFETY: the flags pointer belongs to `builder` and stays valid for
    // the duration of this call; LAME only stores the value.
    let code = unsafe { mp3lame_sys::lame_set_num_samples(builder.as_ptr(), samples as _) };
    if code != 0 {
        return Err(EncoderError::Configure(format!(
            "sample count hint {samples} rejected ({code})"
        )));
    }
    Ok(())
}

pub struct LameEncoder {
    inner: mp3::Encoder,
}

impl BlockEncoder for LameEncoder {
    fn encode_block(
        &mut self,
        buffers: &ChannelBuffers,
        out: &mut Vec<u8>,
    ) -> Result<usize, EncoderError> {
        // encode_to_vec writes into spare capacity only
        out.reserve(mp3::max_required_buffer_size(buffers.frames()));

        let result = match buffers.right() {
            Some(right) => self.inner.encode_to_vec(
                mp3::DualPcm {
                    left: buffers.left(),
                    right,
                },
                out,
            ),
            None => self.inner.encode_to_vec(mp3::MonoPcm(buffers.left()), out),
        };

        result.map_err(|e| EncoderError::Encode(format!("{e:?}")))
    }

    fn flush(&mut self, out: &mut Vec<u8>) -> Result<usize, EncoderError> {
        out.reserve(mp3::max_required_buffer_size(0));
        self.inner
            .flush_to_vec::<FlushGap>(out)
            .map_err(|e| EncoderError::Flush(format!("{e:?}")))
    }
}
