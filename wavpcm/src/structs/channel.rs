/// Per-channel sample storage for one processing block.
///
/// Samples are 32-bit signed and left-justified: the most significant bit of
/// the source sample sits at bit 31. Owned by the thread converting a file
/// and reused from block to block.
#[derive(Debug, Clone, Default)]
pub struct ChannelBuffers {
    left: Vec<i32>,
    right: Option<Vec<i32>>,
}

impl ChannelBuffers {
    /// Creates buffers for `channels` (1 or 2) with room for `capacity` frames.
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            left: Vec::with_capacity(capacity),
            right: (channels > 1).then(|| Vec::with_capacity(capacity)),
        }
    }

    pub fn channel_count(&self) -> usize {
        if self.right.is_some() { 2 } else { 1 }
    }

    /// Number of frames currently held. Both channels always hold the same
    /// number of samples.
    pub fn frames(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Channel 0, or the only channel of a mono stream.
    pub fn left(&self) -> &[i32] {
        &self.left
    }

    /// Channel 1, `None` for mono.
    pub fn right(&self) -> Option<&[i32]> {
        self.right.as_deref()
    }

    pub fn clear(&mut self) {
        self.left.clear();
        if let Some(right) = &mut self.right {
            right.clear();
        }
    }

    pub(crate) fn push_mono(&mut self, sample: i32) {
        self.left.push(sample);
    }

    pub(crate) fn push_stereo(&mut self, left: i32, right: i32) {
        self.left.push(left);
        if let Some(buffer) = &mut self.right {
            buffer.push(right);
        }
    }

    pub(crate) fn reserve(&mut self, frames: usize) {
        self.left.reserve(frames);
        if let Some(right) = &mut self.right {
            right.reserve(frames);
        }
    }
}
