use std::io::{self, Read, Take, Write};
use std::path::Path;

use log::{debug, trace};

use crate::process::BLOCK_SIZE;
use crate::process::demux::Demuxer;
use crate::process::encode::{BlockEncoder, EncoderFactory};
use crate::process::parse::Parser;
use crate::structs::channel::ChannelBuffers;
use crate::structs::descriptor::ContainerDescriptor;
use crate::utils::errors::ConvertError;

/// Opens the byte streams a conversion reads from and writes to.
pub trait StreamOpener: Send + Sync {
    type Reader: Read;
    type Writer: Write;

    fn open_read(&self, path: &Path) -> io::Result<Self::Reader>;
    fn open_write(&self, path: &Path) -> io::Result<Self::Writer>;
}

/// States of the per-file conversion.
///
/// `AccumulateData -> Encode -> AccumulateData ... -> Flush -> Done`, with
/// `Failed` reachable from every non-terminal state.
#[derive(Debug)]
pub enum PipelineState {
    /// Read the next payload block.
    AccumulateData,
    /// Demux and encode the block just read, holding its length in bytes.
    Encode(usize),
    /// Drain the encoder after the last block.
    Flush,
    Done,
    Failed(ConvertError),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// Outcome of converting one file.
#[derive(Debug)]
pub struct PipelineResult {
    pub success: bool,
    pub frames_processed: u64,
    pub bytes_written: u64,
    /// Set once the header was parsed.
    pub descriptor: Option<ContainerDescriptor>,
    pub error: Option<ConvertError>,
}

impl PipelineResult {
    fn failed(descriptor: Option<ContainerDescriptor>, error: ConvertError) -> Self {
        Self {
            success: false,
            frames_processed: 0,
            bytes_written: 0,
            descriptor,
            error: Some(error),
        }
    }
}

/// Streams the payload of one input through an encoder into one output.
///
/// One thread owns a pipeline from start to end, so block N is written
/// before block N+1 is read. Both streams are dropped when [`run`](Self::run)
/// returns, whichever terminal state was reached.
pub struct Pipeline<R: Read, W: Write, E: BlockEncoder> {
    input: Take<R>,
    output: W,
    encoder: E,
    descriptor: ContainerDescriptor,
    demuxer: Demuxer,
    block: Vec<u8>,
    buffers: ChannelBuffers,
    encoded: Vec<u8>,
    frames_processed: u64,
    bytes_written: u64,
}

impl<R: Read, W: Write, E: BlockEncoder> Pipeline<R, W, E> {
    /// `input` must be positioned at the first payload byte. Reading stops
    /// after `descriptor.data_length` bytes even if the stream goes on.
    pub fn new(input: R, output: W, encoder: E, descriptor: ContainerDescriptor) -> Self {
        let demuxer = Demuxer::new(&descriptor);
        let block_frames = BLOCK_SIZE / demuxer.frame_size();

        Self {
            input: input.take(descriptor.data_length as u64),
            output,
            encoder,
            descriptor,
            demuxer,
            block: vec![0u8; BLOCK_SIZE],
            buffers: ChannelBuffers::new(descriptor.channel_count as usize, block_frames),
            encoded: Vec::new(),
            frames_processed: 0,
            bytes_written: 0,
        }
    }

    /// Runs the state machine until it reaches `Done` or `Failed`.
    pub fn run(mut self) -> PipelineResult {
        let mut state = PipelineState::AccumulateData;
        while !state.is_terminal() {
            state = self.step(state);
        }

        let error = match state {
            PipelineState::Failed(error) => Some(error),
            _ => None,
        };

        PipelineResult {
            success: error.is_none(),
            frames_processed: self.frames_processed,
            bytes_written: self.bytes_written,
            descriptor: Some(self.descriptor),
            error,
        }
    }

    /// Performs the work of `state` and returns the state that follows.
    pub fn step(&mut self, state: PipelineState) -> PipelineState {
        match state {
            PipelineState::AccumulateData => match self.read_block() {
                Ok(0) => PipelineState::Flush,
                Ok(len) => PipelineState::Encode(len),
                Err(e) => PipelineState::Failed(e.into()),
            },
            PipelineState::Encode(len) => match self.encode(len) {
                Ok(()) => PipelineState::AccumulateData,
                Err(e) => PipelineState::Failed(e),
            },
            PipelineState::Flush => match self.flush() {
                Ok(()) => PipelineState::Done,
                Err(e) => PipelineState::Failed(e),
            },
            terminal => terminal,
        }
    }

    /// Fills the block buffer, returning fewer bytes only at end of payload.
    fn read_block(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.block.len() {
            match self.input.read(&mut self.block[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn encode(&mut self, len: usize) -> Result<(), ConvertError> {
        let frames = self.demuxer.demux(&self.block[..len], &mut self.buffers);
        if frames == 0 {
            trace!("Dropping {len} trailing bytes shorter than a frame");
            return Ok(());
        }

        self.encoded.clear();
        let written = self.encoder.encode_block(&self.buffers, &mut self.encoded)?;
        self.output.write_all(&self.encoded[..written])?;

        self.frames_processed += frames as u64;
        self.bytes_written += written as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ConvertError> {
        self.encoded.clear();
        let written = self.encoder.flush(&mut self.encoded)?;
        self.output.write_all(&self.encoded[..written])?;
        self.output.flush()?;

        self.bytes_written += written as u64;
        Ok(())
    }
}

/// Opens `src` and parses its header, leaving the reader at the payload.
pub fn probe_file<S: StreamOpener>(
    src: &Path,
    streams: &S,
    parser: &mut Parser,
) -> Result<(S::Reader, ContainerDescriptor), ConvertError> {
    let mut input = streams
        .open_read(src)
        .map_err(|source| ConvertError::OpenInput {
            path: src.to_path_buf(),
            source,
        })?;
    let descriptor = parser.parse(&mut input)?;
    Ok((input, descriptor))
}

/// Converts `src` into `dst`.
///
/// The output is only created once the header has been accepted and an
/// encoder configured, so rejected inputs leave nothing behind.
pub fn convert_file<S: StreamOpener, F: EncoderFactory>(
    src: &Path,
    dst: &Path,
    streams: &S,
    encoders: &F,
    parser: &mut Parser,
) -> PipelineResult {
    let (input, descriptor) = match probe_file(src, streams, parser) {
        Ok(probed) => probed,
        Err(e) => return PipelineResult::failed(None, e),
    };
    debug!("{}: {descriptor}", src.display());

    let encoder = match encoders.create(&descriptor) {
        Ok(encoder) => encoder,
        Err(e) => return PipelineResult::failed(Some(descriptor), e.into()),
    };

    let output = match streams.open_write(dst) {
        Ok(output) => output,
        Err(source) => {
            let error = ConvertError::OpenOutput {
                path: dst.to_path_buf(),
                source,
            };
            return PipelineResult::failed(Some(descriptor), error);
        }
    };

    Pipeline::new(input, output, encoder, descriptor).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fixtures::pcm_wav;
    use crate::utils::errors::{EncoderError, ParseError};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Writes one little-endian frame count per block and `END` on flush.
    pub struct CountingEncoder {
        channels: usize,
        blocks: usize,
        fail_at_block: Option<usize>,
    }

    impl BlockEncoder for CountingEncoder {
        fn encode_block(
            &mut self,
            buffers: &ChannelBuffers,
            out: &mut Vec<u8>,
        ) -> Result<usize, EncoderError> {
            assert_eq!(buffers.channel_count(), self.channels);
            if self.fail_at_block == Some(self.blocks) {
                return Err(EncoderError::Encode("buffer too small".into()));
            }
            self.blocks += 1;
            out.extend_from_slice(&(buffers.frames() as u32).to_le_bytes());
            Ok(4)
        }

        fn flush(&mut self, out: &mut Vec<u8>) -> Result<usize, EncoderError> {
            out.extend_from_slice(b"END");
            Ok(3)
        }
    }

    #[derive(Default)]
    pub struct CountingFactory {
        pub created: AtomicUsize,
        pub fail_at_block: Option<usize>,
    }

    impl EncoderFactory for CountingFactory {
        type Encoder = CountingEncoder;

        fn create(&self, descriptor: &ContainerDescriptor) -> Result<CountingEncoder, EncoderError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(CountingEncoder {
                channels: descriptor.channel_count as usize,
                blocks: 0,
                fail_at_block: self.fail_at_block,
            })
        }
    }

    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MemoryStreams {
        pub inputs: HashMap<PathBuf, Vec<u8>>,
        pub outputs: Mutex<HashMap<PathBuf, SharedBuffer>>,
    }

    impl MemoryStreams {
        pub fn with_input(mut self, path: &str, bytes: Vec<u8>) -> Self {
            self.inputs.insert(PathBuf::from(path), bytes);
            self
        }

        pub fn output(&self, path: &str) -> Option<Vec<u8>> {
            let outputs = self.outputs.lock().unwrap();
            outputs
                .get(Path::new(path))
                .map(|buffer| buffer.0.lock().unwrap().clone())
        }
    }

    impl StreamOpener for MemoryStreams {
        type Reader = Cursor<Vec<u8>>;
        type Writer = SharedBuffer;

        fn open_read(&self, path: &Path) -> io::Result<Self::Reader> {
            self.inputs
                .get(path)
                .cloned()
                .map(Cursor::new)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such input"))
        }

        fn open_write(&self, path: &Path) -> io::Result<Self::Writer> {
            let buffer = SharedBuffer::default();
            self.outputs
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), buffer.clone());
            Ok(buffer)
        }
    }

    fn convert(streams: &MemoryStreams, factory: &CountingFactory) -> PipelineResult {
        convert_file(
            Path::new("in.wav"),
            Path::new("in.mp3"),
            streams,
            factory,
            &mut Parser::default(),
        )
    }

    #[test]
    fn converts_in_blocks_then_flushes() {
        // 16-bit stereo, one and a half blocks of payload.
        let payload = vec![0x10u8; BLOCK_SIZE + BLOCK_SIZE / 2];
        let streams =
            MemoryStreams::default().with_input("in.wav", pcm_wav(2, 44100, 16, &payload));
        let factory = CountingFactory::default();

        let result = convert(&streams, &factory);
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.frames_processed, payload.len() as u64 / 4);
        assert_eq!(result.bytes_written, 4 + 4 + 3);

        let full = (BLOCK_SIZE as u32 / 4).to_le_bytes();
        let half = (BLOCK_SIZE as u32 / 8).to_le_bytes();
        let expected = [&full[..], &half[..], b"END"].concat();
        assert_eq!(streams.output("in.mp3").unwrap(), expected);
    }

    #[test]
    fn payload_is_bounded_by_data_length() {
        let mut bytes = pcm_wav(1, 8000, 8, &[0x80; 10]);
        bytes.extend_from_slice(b"LIST\x04\x00\x00\x00abcd");
        let streams = MemoryStreams::default().with_input("in.wav", bytes);

        let result = convert(&streams, &CountingFactory::default());
        assert!(result.success);
        assert_eq!(result.frames_processed, 10);
    }

    #[test]
    fn empty_payload_only_flushes() {
        let streams = MemoryStreams::default().with_input("in.wav", pcm_wav(2, 44100, 16, &[]));
        let result = convert(&streams, &CountingFactory::default());

        assert!(result.success);
        assert_eq!(result.frames_processed, 0);
        assert_eq!(streams.output("in.mp3").unwrap(), b"END");
    }

    #[test]
    fn unsupported_format_never_reaches_encoder() {
        let mut bytes = pcm_wav(2, 44100, 16, &[0; 16]);
        // audio format code lives right after the fmt chunk header
        bytes[20..22].copy_from_slice(&0x0055u16.to_le_bytes());
        let streams = MemoryStreams::default().with_input("in.wav", bytes);
        let factory = CountingFactory::default();

        let result = convert(&streams, &factory);
        assert!(!result.success);
        assert!(matches!(
            result.error,
            Some(ConvertError::Parse(ParseError::UnsupportedFormat(0x0055)))
        ));
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
        assert!(streams.output("in.mp3").is_none());
    }

    #[test]
    fn encode_failure_stops_the_file() {
        let payload = vec![0u8; BLOCK_SIZE * 3];
        let streams =
            MemoryStreams::default().with_input("in.wav", pcm_wav(1, 44100, 16, &payload));
        let factory = CountingFactory {
            fail_at_block: Some(1),
            ..Default::default()
        };

        let result = convert(&streams, &factory);
        assert!(!result.success);
        assert!(matches!(
            result.error,
            Some(ConvertError::Encoder(EncoderError::Encode(_)))
        ));
        assert_eq!(result.frames_processed, BLOCK_SIZE as u64 / 2);
        assert_eq!(streams.output("in.mp3").unwrap().len(), 4);
    }

    #[test]
    fn missing_input_is_reported() {
        let streams = MemoryStreams::default();
        let result = convert(&streams, &CountingFactory::default());
        assert!(matches!(
            result.error,
            Some(ConvertError::OpenInput { .. })
        ));
        assert!(result.descriptor.is_none());
    }

    #[test]
    fn step_leaves_terminal_states_alone() {
        let streams = MemoryStreams::default().with_input("in.wav", pcm_wav(1, 8000, 8, &[0x80]));
        let (input, descriptor) =
            probe_file(Path::new("in.wav"), &streams, &mut Parser::default()).unwrap();
        let encoder = CountingFactory::default().create(&descriptor).unwrap();
        let mut pipeline = Pipeline::new(input, SharedBuffer::default(), encoder, descriptor);

        assert!(matches!(pipeline.step(PipelineState::Done), PipelineState::Done));
        assert!(matches!(
            pipeline.step(PipelineState::AccumulateData),
            PipelineState::Encode(1)
        ));
        assert!(matches!(
            pipeline.step(PipelineState::AccumulateData),
            PipelineState::Flush
        ));
    }
}
