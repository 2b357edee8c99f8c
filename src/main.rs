#![allow(dead_code)]

//! mictap - microphone to raw PCM pipe
//!
//! Captures the default input device, converts each block of float samples
//! to signed 16-bit PCM on the audio thread, and writes the raw
//! little-endian stream to stdout. Logs go to stderr, so the output can be
//! piped straight into ffmpeg, aplay, or a file.

use std::error::Error;
use std::io::{self, BufWriter};
use std::thread;
use std::time::Duration;

mod audio;
mod processor;
mod settings;
mod sink;

use audio::{AudioInput, PcmChannel, MAX_BLOCK_SIZE};
use processor::{MicProcessor, ProcessorRegistry, MIC_PROCESSOR_ID};
use settings::AppSettings;
use sink::PcmSink;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Starting mictap");

    let settings = AppSettings::load();
    // Materialize the file on first run so it can be edited
    settings.save();

    let channel = PcmChannel::new(settings.ring_capacity);
    let producer = channel
        .take_producer()
        .ok_or("PCM channel producer already taken")?;
    let mut consumer = channel
        .take_consumer()
        .ok_or("PCM channel consumer already taken")?;

    let mut registry = ProcessorRegistry::new();
    registry.register(
        MIC_PROCESSOR_ID,
        Box::new(MicProcessor::new(producer, MAX_BLOCK_SIZE)),
    )?;

    let mut input = AudioInput::new();
    input.selected_device = settings.device;
    input.start(&mut registry, MIC_PROCESSOR_ID)?;

    let stdout = io::stdout();
    let mut sink = PcmSink::new(BufWriter::new(stdout.lock()));

    let poll = Duration::from_millis(settings.poll_interval_ms);
    let mut chunk: Vec<i16> = Vec::with_capacity(settings.ring_capacity);
    let mut reported_dropped = 0u64;

    // Drain until the process is terminated; the host stops invoking the
    // capture callback when the stream is dropped with the process.
    loop {
        thread::sleep(poll);

        chunk.clear();
        if consumer.pop_chunk(&mut chunk) > 0 {
            sink.write_block(&chunk)?;
        }

        let dropped = consumer.samples_dropped();
        if dropped > reported_dropped {
            log::warn!(
                "Consumer fell behind: {} samples dropped",
                dropped - reported_dropped
            );
            reported_dropped = dropped;
        }
    }
}
