//! Audio input capture
//!
//! This module owns the cpal input stream. The stream's data callback is the
//! host real-time callback: once per block it extracts channel 0 into a
//! preallocated mono scratch and hands the block to the registered
//! processor. Nothing in the callback blocks, locks, or allocates.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::processor::ProcessorRegistry;

/// Upper bound on the host block size we preallocate scratch for.
/// cpal callbacks on every supported backend stay well under this.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Errors that can occur while setting up audio capture.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("no input device at index {0}")]
    DeviceNotFound(usize),

    #[error("failed to query device config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("no processor registered as \"{0}\"")]
    NoProcessor(String),
}

/// Audio input capture engine
pub struct AudioInput {
    /// Whether capture is active
    is_capturing: Arc<AtomicBool>,

    /// The audio input stream
    stream: Option<cpal::Stream>,

    /// Available input devices
    pub devices: Vec<String>,

    /// Selected device index
    pub selected_device: usize,
}

impl AudioInput {
    /// Create a new capture engine and enumerate input devices.
    pub fn new() -> Self {
        let host = cpal::default_host();
        let devices: Vec<String> = host
            .input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default();

        if devices.is_empty() {
            log::warn!("No input devices found");
        } else {
            log::info!("Found {} input device(s)", devices.len());
        }

        Self {
            is_capturing: Arc::new(AtomicBool::new(false)),
            stream: None,
            devices,
            selected_device: 0,
        }
    }

    /// Check if currently capturing
    pub fn is_capturing(&self) -> bool {
        self.is_capturing.load(Ordering::Relaxed)
    }

    /// Start capture, driving the processor registered under `id`.
    ///
    /// The processor is moved out of the registry and into the stream
    /// callback; it stays there until the stream is dropped.
    pub fn start(
        &mut self,
        registry: &mut ProcessorRegistry,
        id: &str,
    ) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let processor = registry
            .take(id)
            .ok_or_else(|| CaptureError::NoProcessor(id.to_string()))?;

        log::info!("Starting audio capture...");

        let host = cpal::default_host();
        let device = host
            .input_devices()?
            .nth(self.selected_device)
            .ok_or(CaptureError::DeviceNotFound(self.selected_device))?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Using input device: {}", device_name);

        let config = device.default_input_config()?;
        log::info!("Audio config: {:?}", config);

        let channels = config.channels() as usize;
        let is_capturing = Arc::clone(&self.is_capturing);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let mut processor = processor;
                let mut mono = Vec::with_capacity(MAX_BLOCK_SIZE);
                // Goes false once the processor asks to stop receiving blocks
                let mut active = true;
                device.build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if !active || !is_capturing.load(Ordering::Relaxed) {
                            return;
                        }
                        active = if channels == 1 {
                            processor.process(Some(data))
                        } else {
                            mono.clear();
                            mono.extend(data.chunks(channels).map(|frame| frame[0]));
                            processor.process(Some(&mono))
                        };
                    },
                    |err| log::error!("Audio error: {}", err),
                    None,
                )?
            }
            cpal::SampleFormat::I16 => {
                let mut processor = processor;
                let mut mono = Vec::with_capacity(MAX_BLOCK_SIZE);
                let mut active = true;
                device.build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if !active || !is_capturing.load(Ordering::Relaxed) {
                            return;
                        }
                        mono.clear();
                        mono.extend(
                            data.chunks(channels)
                                .map(|frame| frame[0] as f32 / 32768.0),
                        );
                        active = processor.process(Some(&mono));
                    },
                    |err| log::error!("Audio error: {}", err),
                    None,
                )?
            }
            format => return Err(CaptureError::UnsupportedFormat(format)),
        };

        stream.play()?;

        self.is_capturing.store(true, Ordering::Relaxed);
        self.stream = Some(stream);
        log::info!("Capturing: {}", device_name);
        Ok(())
    }

    /// Stop audio capture
    pub fn stop(&mut self) {
        self.is_capturing.store(false, Ordering::Relaxed);
        self.stream = None;
        log::info!("Capture stopped");
    }
}

impl Default for AudioInput {
    fn default() -> Self {
        Self::new()
    }
}
