use crate::structs::channel::ChannelBuffers;
use crate::structs::descriptor::ContainerDescriptor;
use crate::utils::errors::EncoderError;

/// A streaming encoder for one output file.
///
/// Blocks are fed in order; encoded bytes are appended to `out` and their
/// count returned. Dropping the encoder releases it.
pub trait BlockEncoder {
    /// Encodes every frame held in `buffers`. Mono or stereo is decided by
    /// [`ChannelBuffers::right`].
    fn encode_block(
        &mut self,
        buffers: &ChannelBuffers,
        out: &mut Vec<u8>,
    ) -> Result<usize, EncoderError>;

    /// Emits whatever the encoder still holds. Called once, after the last block.
    fn flush(&mut self, out: &mut Vec<u8>) -> Result<usize, EncoderError>;
}

/// Creates and configures an encoder for a parsed input.
///
/// Shared by all worker threads; every call returns an encoder owned by the
/// calling thread.
pub trait EncoderFactory: Send + Sync {
    type Encoder: BlockEncoder;

    /// Initializes an encoder for `descriptor`'s channel count and sample
    /// rate, with the sample count as a length hint.
    fn create(&self, descriptor: &ContainerDescriptor) -> Result<Self::Encoder, EncoderError>;
}
