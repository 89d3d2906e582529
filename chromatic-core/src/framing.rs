//! # Frame Accumulation Module
//!
//! Capture backends deliver audio in chunks whose size they choose. The
//! estimator wants fixed-size windows. [`FrameAccumulator`] sits between
//! the two and hands out every complete window in arrival order.

use crate::error::{TunerError, TunerResult};

/// Default analysis window size in samples.
///
/// Larger windows resolve lower pitches but increase latency and the
/// quadratic correlation cost. 2048 samples is about 46 ms at 44.1 kHz.
pub const DEFAULT_WINDOW_SIZE: usize = 2048;

/// Collects incoming sample chunks into fixed-size, non-overlapping windows.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    window_size: usize,
    buffer: Vec<f32>,
}

impl FrameAccumulator {
    /// Creates an accumulator producing windows of `window_size` samples.
    pub fn new(window_size: usize) -> TunerResult<Self> {
        if window_size == 0 {
            return Err(TunerError::InvalidWindowSize { size: window_size });
        }
        Ok(Self {
            window_size,
            buffer: Vec::with_capacity(window_size * 2),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of samples waiting for the next window to fill.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Appends `chunk` and calls `on_window` for each window it completes.
    ///
    /// Returns the number of windows emitted.
    pub fn push<F>(&mut self, chunk: &[f32], mut on_window: F) -> usize
    where
        F: FnMut(&[f32]),
    {
        // Append new data to our buffer.
        self.buffer.extend_from_slice(chunk);

        // While we have enough data for a full frame, process it.
        let mut emitted = 0;
        let mut offset = 0;
        while self.buffer.len() - offset >= self.window_size {
            on_window(&self.buffer[offset..offset + self.window_size]);
            offset += self.window_size;
            emitted += 1;
        }

        // Remove the processed samples from the front of the buffer.
        self.buffer.drain(..offset);
        emitted
    }

    /// Discards any partially filled window.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_window() {
        assert!(matches!(
            FrameAccumulator::new(0),
            Err(TunerError::InvalidWindowSize { size: 0 })
        ));
    }

    #[test]
    fn emits_complete_windows_in_order() {
        let mut acc = FrameAccumulator::new(4).unwrap();
        let mut windows: Vec<Vec<f32>> = Vec::new();

        let n = acc.push(&[1.0, 2.0, 3.0], |w| windows.push(w.to_vec()));
        assert_eq!(n, 0);
        assert_eq!(acc.pending(), 3);

        let n = acc.push(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0], |w| windows.push(w.to_vec()));
        assert_eq!(n, 2);
        assert_eq!(acc.pending(), 2);
        assert_eq!(
            windows,
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]]
        );
    }

    #[test]
    fn clear_drops_partial_window() {
        let mut acc = FrameAccumulator::new(3).unwrap();
        acc.push(&[1.0, 2.0], |_| panic!("no window expected"));
        acc.clear();
        assert_eq!(acc.pending(), 0);

        let mut first = None;
        acc.push(&[7.0, 8.0, 9.0], |w| first = Some(w.to_vec()));
        assert_eq!(first, Some(vec![7.0, 8.0, 9.0]));
    }
}
