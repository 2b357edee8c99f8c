//! Per-block audio processors and their registry
//!
//! A processor is invoked once per block by the capture engine, on the
//! real-time audio thread. Processors are registered under a fixed string
//! identifier before capture starts; the engine then takes the processor it
//! wants out of the registry and drives it from the stream callback.

use std::collections::HashMap;

use thiserror::Error;

use crate::audio::{convert, PcmProducer};

/// Identifier the microphone processor is registered under.
pub const MIC_PROCESSOR_ID: &str = "mic-processor";

/// Errors from processor registration.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("processor \"{0}\" is already registered")]
    AlreadyRegistered(String),
}

/// A per-block audio processor driven by the capture engine.
///
/// `process` runs on the real-time audio thread: implementations must not
/// block, lock, or allocate. `input` is the current mono block, or `None`
/// when the host delivered nothing this round; in that case the processor
/// produces no output. The return value tells the engine whether to keep
/// invoking the processor on subsequent callbacks.
pub trait AudioProcessor: Send {
    fn process(&mut self, input: Option<&[f32]>) -> bool;
}

/// Converts each incoming block to 16-bit PCM and queues it for the consumer.
///
/// Stateless across invocations apart from the reusable scratch buffer,
/// which is grown up front so the hot path never allocates.
pub struct MicProcessor {
    output: PcmProducer,
    scratch: Vec<i16>,
}

impl MicProcessor {
    /// Create a processor feeding `output`, with scratch space for blocks
    /// up to `max_block_size` samples.
    pub fn new(output: PcmProducer, max_block_size: usize) -> Self {
        Self {
            output,
            scratch: Vec::with_capacity(max_block_size),
        }
    }
}

impl AudioProcessor for MicProcessor {
    fn process(&mut self, input: Option<&[f32]>) -> bool {
        let Some(input) = input else {
            return true;
        };
        convert::convert_block(input, &mut self.scratch);
        self.output.push_block(&self.scratch);
        true
    }
}

/// Registry mapping identifiers to processors.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Box<dyn AudioProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor under `id`. Each id may be registered once.
    pub fn register(
        &mut self,
        id: &str,
        processor: Box<dyn AudioProcessor>,
    ) -> Result<(), RegistryError> {
        if self.processors.contains_key(id) {
            return Err(RegistryError::AlreadyRegistered(id.to_string()));
        }
        log::info!("Registered processor \"{}\"", id);
        self.processors.insert(id.to_string(), processor);
        Ok(())
    }

    /// Move the processor registered under `id` out of the registry.
    pub fn take(&mut self, id: &str) -> Option<Box<dyn AudioProcessor>> {
        self.processors.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PcmChannel;

    #[test]
    fn test_register_exactly_once() {
        let channel = PcmChannel::new(16);
        let mut registry = ProcessorRegistry::new();

        let processor = MicProcessor::new(channel.take_producer().unwrap(), 8);
        registry
            .register(MIC_PROCESSOR_ID, Box::new(processor))
            .unwrap();

        struct Noop;
        impl AudioProcessor for Noop {
            fn process(&mut self, _input: Option<&[f32]>) -> bool {
                true
            }
        }
        let duplicate = registry.register(MIC_PROCESSOR_ID, Box::new(Noop));
        assert!(matches!(
            duplicate,
            Err(RegistryError::AlreadyRegistered(_))
        ));

        assert!(registry.take(MIC_PROCESSOR_ID).is_some());
        assert!(registry.take(MIC_PROCESSOR_ID).is_none());
    }

    #[test]
    fn test_processor_converts_and_queues() {
        let channel = PcmChannel::new(16);
        let mut consumer = channel.take_consumer().unwrap();
        let mut processor = MicProcessor::new(channel.take_producer().unwrap(), 8);

        assert!(processor.process(Some(&[0.5, -1.0, 0.0])));

        let mut out = Vec::new();
        consumer.pop_chunk(&mut out);
        assert_eq!(out, vec![16383, -32767, 0]);
    }

    #[test]
    fn test_missing_input_is_noop() {
        let channel = PcmChannel::new(16);
        let mut consumer = channel.take_consumer().unwrap();
        let mut processor = MicProcessor::new(channel.take_producer().unwrap(), 8);

        // Absent block: no output, keep receiving callbacks
        assert!(processor.process(None));

        let mut out = Vec::new();
        assert_eq!(consumer.pop_chunk(&mut out), 0);
        assert_eq!(consumer.blocks_pushed(), 0);
    }
}
