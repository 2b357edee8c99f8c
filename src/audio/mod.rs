//! Audio module - capture, sample conversion, and block hand-off
//!
//! This module provides:
//! - Float to 16-bit PCM conversion
//! - Lock-free ring for passing converted blocks to the writer thread
//! - Audio input capture

mod block;
pub mod convert;
mod input;

pub use block::{PcmChannel, PcmConsumer, PcmProducer};
pub use input::{AudioInput, CaptureError, MAX_BLOCK_SIZE};
