//! Lock-free hand-off of converted PCM blocks between threads
//!
//! The capture callback runs on a real-time thread with a strict deadline.
//! If it blocked on a mutex held by the writer thread, the host would miss
//! its buffer deadline and drop audio, so the hand-off uses a SPSC
//! (single-producer, single-consumer) ring buffer from the `ringbuf` crate:
//! the audio thread is the producer, the writer thread the consumer, and
//! neither ever waits for the other.
//!
//! Overflow policy: a block is copied into the ring as far as it fits;
//! samples that do not fit are dropped and counted. The producer never
//! blocks waiting for the consumer to catch up.

use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapRb,
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

/// Shared push/drop counters, readable from any thread.
#[derive(Default)]
struct Counters {
    blocks_pushed: AtomicU64,
    samples_dropped: AtomicU64,
}

/// Producer half of the PCM ring (owned by the audio thread).
pub struct PcmProducer {
    producer: ringbuf::HeapProd<i16>,
    counters: Arc<Counters>,
}

impl PcmProducer {
    /// Copy a converted block into the ring.
    ///
    /// Lock-free and non-blocking, safe to call from the capture callback.
    /// Samples that do not fit are dropped and counted. Returns the number
    /// of samples actually queued.
    #[inline]
    pub fn push_block(&mut self, block: &[i16]) -> usize {
        let written = self.producer.push_slice(block);
        if written < block.len() {
            self.counters
                .samples_dropped
                .fetch_add((block.len() - written) as u64, Ordering::Relaxed);
        }
        self.counters.blocks_pushed.fetch_add(1, Ordering::Relaxed);
        written
    }
}

/// Consumer half of the PCM ring (owned by the writer thread).
pub struct PcmConsumer {
    consumer: ringbuf::HeapCons<i16>,
    counters: Arc<Counters>,
}

impl PcmConsumer {
    /// Drain everything currently queued into `out`, appending to it.
    ///
    /// Returns the number of samples drained.
    pub fn pop_chunk(&mut self, out: &mut Vec<i16>) -> usize {
        let mut drained = 0;
        while let Some(sample) = self.consumer.try_pop() {
            out.push(sample);
            drained += 1;
        }
        drained
    }

    /// Total blocks pushed by the producer so far.
    pub fn blocks_pushed(&self) -> u64 {
        self.counters.blocks_pushed.load(Ordering::Relaxed)
    }

    /// Total samples dropped to overflow so far.
    pub fn samples_dropped(&self) -> u64 {
        self.counters.samples_dropped.load(Ordering::Relaxed)
    }
}

/// The PCM hand-off channel.
///
/// Built once at startup; the audio thread takes the producer half and the
/// writer thread takes the consumer half, each exactly once.
pub struct PcmChannel {
    producer: Mutex<Option<PcmProducer>>,
    consumer: Mutex<Option<PcmConsumer>>,
    capacity: usize,
}

impl PcmChannel {
    /// Create a channel holding up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<i16>::new(capacity);
        let (prod, cons) = rb.split();

        let counters = Arc::new(Counters::default());

        Self {
            producer: Mutex::new(Some(PcmProducer {
                producer: prod,
                counters: Arc::clone(&counters),
            })),
            consumer: Mutex::new(Some(PcmConsumer {
                consumer: cons,
                counters,
            })),
            capacity,
        }
    }

    /// Take the producer half. Returns `None` after the first call.
    pub fn take_producer(&self) -> Option<PcmProducer> {
        self.producer.lock().unwrap().take()
    }

    /// Take the consumer half. Returns `None` after the first call.
    pub fn take_consumer(&self) -> Option<PcmConsumer> {
        self.consumer.lock().unwrap().take()
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_drain() {
        let channel = PcmChannel::new(8);
        let mut producer = channel.take_producer().unwrap();
        let mut consumer = channel.take_consumer().unwrap();

        assert_eq!(producer.push_block(&[1, 2, 3]), 3);
        assert_eq!(producer.push_block(&[4, 5]), 2);

        let mut out = Vec::new();
        assert_eq!(consumer.pop_chunk(&mut out), 5);
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
        assert_eq!(consumer.blocks_pushed(), 2);
        assert_eq!(consumer.samples_dropped(), 0);
    }

    #[test]
    fn test_overflow_drops_and_counts() {
        let channel = PcmChannel::new(4);
        let mut producer = channel.take_producer().unwrap();
        let mut consumer = channel.take_consumer().unwrap();

        // 6 samples into a 4-sample ring: the last 2 are dropped
        assert_eq!(producer.push_block(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(consumer.samples_dropped(), 2);

        let mut out = Vec::new();
        consumer.pop_chunk(&mut out);
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_halves_taken_once() {
        let channel = PcmChannel::new(4);
        assert!(channel.take_producer().is_some());
        assert!(channel.take_producer().is_none());
        assert!(channel.take_consumer().is_some());
        assert!(channel.take_consumer().is_none());
    }

    #[test]
    fn test_empty_drain() {
        let channel = PcmChannel::new(4);
        let mut consumer = channel.take_consumer().unwrap();
        let mut out = Vec::new();
        assert_eq!(consumer.pop_chunk(&mut out), 0);
        assert!(out.is_empty());
    }
}
