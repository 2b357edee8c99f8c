//! Raw PCM output
//!
//! The consumer end of the pipeline: converted samples are written as
//! little-endian 16-bit words to any `io::Write`, normally locked stdout so
//! the stream can be piped into whatever comes next.

use std::io::{self, Write};

/// Writes 16-bit PCM samples to an underlying writer.
pub struct PcmSink<W: Write> {
    writer: W,
    samples_written: u64,
}

impl<W: Write> PcmSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            samples_written: 0,
        }
    }

    /// Write a block of samples as little-endian bytes and flush.
    pub fn write_block(&mut self, samples: &[i16]) -> io::Result<()> {
        for &sample in samples {
            self.writer.write_all(&sample.to_le_bytes())?;
        }
        self.samples_written += samples.len() as u64;
        self.writer.flush()
    }

    /// Total samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Consume the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut sink = PcmSink::new(Vec::new());
        sink.write_block(&[0x1234, -1, 0]).unwrap();
        assert_eq!(sink.samples_written(), 3);
        assert_eq!(sink.into_inner(), vec![0x34, 0x12, 0xFF, 0xFF, 0x00, 0x00]);
    }

    #[test]
    fn test_empty_block() {
        let mut sink = PcmSink::new(Vec::new());
        sink.write_block(&[]).unwrap();
        assert_eq!(sink.samples_written(), 0);
        assert!(sink.into_inner().is_empty());
    }
}
