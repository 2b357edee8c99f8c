//! Float to 16-bit PCM sample conversion
//!
//! The capture callback delivers normalized `f32` samples in [-1.0, 1.0];
//! downstream consumers want signed 16-bit PCM. The conversion is a plain
//! scale-and-truncate with no dithering and no clamping.

/// Full-scale factor for 16-bit PCM (0x7FFF).
pub const PCM_SCALE: f32 = 32767.0;

/// Convert one normalized sample to signed 16-bit PCM.
///
/// The sample is scaled by [`PCM_SCALE`], truncated toward zero, and reduced
/// modulo 2^16 into the `i16` range. Inputs outside [-1.0, 1.0] are
/// deliberately not clamped, so they wrap (`2.0` becomes `-2`); NaN becomes 0.
#[inline]
pub fn sample_to_pcm(sample: f32) -> i16 {
    // f32 -> i64 truncates toward zero, i64 -> i16 keeps the low 16 bits.
    (sample * PCM_SCALE) as i64 as i16
}

/// Convert a whole block of samples into `out`.
///
/// `out` is cleared first and ends up with exactly `input.len()` samples.
/// Existing capacity is reused, so a scratch buffer grown once keeps this
/// allocation-free on the audio thread.
pub fn convert_block(input: &[f32], out: &mut Vec<i16>) {
    out.clear();
    out.extend(input.iter().map(|&s| sample_to_pcm(s)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_truncate() {
        assert_eq!(sample_to_pcm(0.0), 0);
        assert_eq!(sample_to_pcm(0.5), 16383); // 16383.5 truncated
        assert_eq!(sample_to_pcm(-0.5), -16383);
        assert_eq!(sample_to_pcm(1.0), 32767);
        assert_eq!(sample_to_pcm(-1.0), -32767);
    }

    #[test]
    fn test_out_of_range_wraps() {
        // 2.0 * 32767 = 65534, which wraps to -2 in 16 bits
        assert_eq!(sample_to_pcm(2.0), -2);
        assert_eq!(sample_to_pcm(-2.0), 2);
        assert_eq!(sample_to_pcm(1.5), -16386);
    }

    #[test]
    fn test_nan_is_zero() {
        assert_eq!(sample_to_pcm(f32::NAN), 0);
    }

    #[test]
    fn test_block_length_preserved() {
        let input = vec![0.25_f32; 128];
        let mut out = Vec::new();
        convert_block(&input, &mut out);
        assert_eq!(out.len(), 128);
        assert!(out.iter().all(|&s| s == 8191)); // 0.25 * 32767 = 8191.75
    }

    #[test]
    fn test_zero_block_stays_zero() {
        for len in [0, 1, 256, 1024] {
            let input = vec![0.0_f32; len];
            let mut out = Vec::new();
            convert_block(&input, &mut out);
            assert_eq!(out, vec![0_i16; len]);
        }
    }

    #[test]
    fn test_block_reuses_capacity() {
        let mut out = Vec::with_capacity(256);
        let ptr = out.as_ptr();
        convert_block(&[0.1; 256], &mut out);
        assert_eq!(out.as_ptr(), ptr);
    }
}
