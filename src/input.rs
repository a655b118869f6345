use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::Path;

use wavpcm::process::BLOCK_SIZE;
use wavpcm::process::convert::StreamOpener;

/// Buffered reader over a regular file.
pub struct InputReader {
    reader: BufReader<File>,
}

impl InputReader {
    /// Opens `input_path` for reading. Anything but a regular file is
    /// refused, so a directory or a FIFO never blocks a worker.
    pub fn new<P: AsRef<Path>>(input_path: P) -> io::Result<Self> {
        let file = File::open(input_path)?;
        if !file.metadata()?.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }

        Ok(Self {
            reader: BufReader::with_capacity(BLOCK_SIZE, file),
        })
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Opens inputs and outputs on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStreams;

impl StreamOpener for FsStreams {
    type Reader = InputReader;
    type Writer = BufWriter<File>;

    fn open_read(&self, path: &Path) -> io::Result<InputReader> {
        InputReader::new(path)
    }

    /// Creates or truncates `path`.
    fn open_write(&self, path: &Path) -> io::Result<BufWriter<File>> {
        Ok(BufWriter::new(File::create(path)?))
    }
}
