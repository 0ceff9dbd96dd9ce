//! Latency-compensated bypass pass-through.
//!
//! A plugin that reports latency must keep honoring it while bypassed,
//! otherwise toggling bypass shifts the dry signal against the rest of the
//! session and breaks host crossfades. The pass-through path therefore runs
//! the input through a multichannel delay line sized to the reported
//! latency. At zero latency the delay line is not used at all and bypass
//! degenerates to a pure copy.
//!
//! The delay line is recreated (and its history cleared) only at lifecycle
//! synchronization points the host guarantees not to overlap a processing
//! call; nothing here allocates inside the block path.

use crate::sample::Sample;

/// Multichannel circular delay line with a fixed integer delay.
///
/// One ring buffer per channel, all sharing a single write position. Each
/// processed sample emits the value written `delay` samples earlier.
#[derive(Clone, Debug)]
pub struct NChanDelayLine<S: Sample> {
    buffers: Vec<Vec<S>>,
    write_pos: usize,
    delay: usize,
}

impl<S: Sample> NChanDelayLine<S> {
    /// Create a delay line for `n_channels` channels of `delay` samples.
    ///
    /// `delay` must be at least 1; a zero-latency pass-through should not
    /// build a delay line at all.
    pub fn new(n_channels: usize, delay: usize) -> Self {
        debug_assert!(delay > 0);
        Self {
            buffers: (0..n_channels).map(|_| vec![S::ZERO; delay]).collect(),
            write_pos: 0,
            delay,
        }
    }

    /// Number of channels this delay line carries.
    pub fn n_channels(&self) -> usize {
        self.buffers.len()
    }

    /// Delay in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay
    }

    /// Zero the delay history.
    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(S::ZERO);
        }
        self.write_pos = 0;
    }

    /// Delay one block for every channel.
    ///
    /// Channels beyond `inputs`/`outputs` (or beyond this delay line's
    /// channel count) are left untouched. Each ring slot is read before it
    /// is rewritten, so the emitted sample is the one written `delay`
    /// samples ago even when `n_frames` exceeds the delay. Input and output
    /// pointers may alias (in-place host processing).
    ///
    /// # Safety
    ///
    /// Every pointer used must be valid for `n_frames` reads (inputs) or
    /// writes (outputs) for the duration of the current processing call.
    pub unsafe fn process_block(
        &mut self,
        inputs: &[*const S],
        outputs: &[*mut S],
        n_frames: usize,
    ) {
        let n_channels = self.buffers.len().min(inputs.len()).min(outputs.len());
        for ch in 0..n_channels {
            let buffer = &mut self.buffers[ch];
            let mut pos = self.write_pos;
            for frame in 0..n_frames {
                // SAFETY: Caller guarantees both pointers valid for
                // n_frames elements. Reading the input sample before
                // writing the output keeps aliased in-place buffers
                // correct.
                unsafe {
                    let incoming = *inputs[ch].add(frame);
                    let delayed = buffer[pos];
                    buffer[pos] = incoming;
                    *outputs[ch].add(frame) = delayed;
                }
                pos += 1;
                if pos == self.delay {
                    pos = 0;
                }
            }
        }
        self.write_pos = (self.write_pos + n_frames) % self.delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_block(delay: &mut NChanDelayLine<f64>, input: &[f64]) -> Vec<f64> {
        let mut output = vec![0.0; input.len()];
        let in_ptrs = [input.as_ptr()];
        let out_ptrs = [output.as_mut_ptr()];
        // SAFETY: Both locals live across the call and hold input.len()
        // samples.
        unsafe { delay.process_block(&in_ptrs, &out_ptrs, input.len()) };
        output
    }

    #[test]
    fn test_impulse_arrives_after_delay() {
        let mut delay = NChanDelayLine::new(1, 256);
        let mut impulse = vec![0.0f64; 64];
        impulse[0] = 1.0;

        let silence = vec![0.0f64; 64];
        let mut collected = Vec::new();
        collected.extend(run_block(&mut delay, &impulse));
        for _ in 0..7 {
            collected.extend(run_block(&mut delay, &silence));
        }

        for (i, &sample) in collected.iter().enumerate() {
            let expected = if i == 256 { 1.0 } else { 0.0 };
            assert_eq!(sample, expected, "sample {i}");
        }
    }

    #[test]
    fn test_block_longer_than_delay() {
        let mut delay = NChanDelayLine::new(1, 4);
        let input: Vec<f64> = (1..=12).map(f64::from).collect();
        let output = run_block(&mut delay, &input);

        // First 4 samples are history (silence), then the input shifted by 4.
        assert_eq!(&output[..4], &[0.0; 4]);
        assert_eq!(&output[4..], &input[..8]);
    }

    #[test]
    fn test_delay_spans_block_boundaries() {
        let mut delay = NChanDelayLine::new(1, 6);
        let first = run_block(&mut delay, &[1.0, 2.0, 3.0, 4.0]);
        let second = run_block(&mut delay, &[5.0, 6.0, 7.0, 8.0]);

        assert_eq!(first, [0.0; 4]);
        assert_eq!(second, [0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut delay = NChanDelayLine::new(2, 2);
        let left = [1.0f64, 0.0, 0.0];
        let right = [0.0f64, -1.0, 0.0];
        let mut out_l = [9.0f64; 3];
        let mut out_r = [9.0f64; 3];
        let in_ptrs = [left.as_ptr(), right.as_ptr()];
        let out_ptrs = [out_l.as_mut_ptr(), out_r.as_mut_ptr()];
        // SAFETY: All four locals live across the call with 3 samples each.
        unsafe { delay.process_block(&in_ptrs, &out_ptrs, 3) };

        assert_eq!(out_l, [0.0, 0.0, 1.0]);
        assert_eq!(out_r, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_in_place_processing() {
        let mut delay = NChanDelayLine::new(1, 1);
        let mut buffer = [1.0f64, 2.0, 3.0];
        let ptr = buffer.as_mut_ptr();
        let in_ptrs = [ptr as *const f64];
        let out_ptrs = [ptr];
        // SAFETY: Aliasing input/output is explicitly supported; buffer
        // holds 3 samples and lives across the call.
        unsafe { delay.process_block(&in_ptrs, &out_ptrs, 3) };
        assert_eq!(buffer, [0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_clear_wipes_history() {
        let mut delay = NChanDelayLine::new(1, 3);
        run_block(&mut delay, &[1.0, 1.0, 1.0]);
        delay.clear();
        assert_eq!(run_block(&mut delay, &[0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
    }
}
