//! Median filter over a fixed ring of raw analog samples.
//!
//! Each read sorts a stack copy of the ring; the window is 8 samples.

/// Default ring capacity.
pub const SAMPLE_WINDOW: usize = 8;

#[derive(Debug, Clone)]
pub struct SampleFilter<const N: usize = SAMPLE_WINDOW> {
    buf: [u16; N],
    index: usize,
    filled: bool,
}

impl<const N: usize> Default for SampleFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleFilter<N> {
    pub fn new() -> Self {
        const { assert!(N > 0, "sample window must hold at least one sample") };
        Self {
            buf: [0; N],
            index: 0,
            filled: false,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of samples the median is computed over.
    #[inline]
    pub fn len(&self) -> usize {
        if self.filled { N } else { self.index }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the ring has wrapped at least once.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Overwrite the oldest slot with `raw`.
    pub fn push_sample(&mut self, raw: u16) {
        self.buf[self.index] = raw;
        self.index = (self.index + 1) % N;
        if self.index == 0 && !self.filled {
            self.filled = true;
        }
    }

    /// Median of the valid samples; the lower of the two middle values on an
    /// even count. `None` before the first push.
    pub fn filtered_value(&self) -> Option<u16> {
        let n = self.len();
        if n == 0 {
            return None;
        }
        let mut scratch = self.buf;
        let window = &mut scratch[..n];
        window.sort_unstable();
        Some(window[(n - 1) / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_value() {
        let f: SampleFilter = SampleFilter::new();
        assert!(f.is_empty());
        assert_eq!(f.filtered_value(), None);
    }

    #[test]
    fn count_tracks_index_until_wrap() {
        let mut f: SampleFilter<4> = SampleFilter::new();
        for i in 0..3 {
            f.push_sample(i);
            assert_eq!(f.len(), usize::from(i) + 1);
            assert!(!f.is_filled());
        }
        f.push_sample(3);
        assert!(f.is_filled());
        assert_eq!(f.len(), 4);
        f.push_sample(4);
        assert_eq!(f.len(), 4);
    }

    #[test]
    fn interleaved_window_picks_lower_middle() {
        let mut f: SampleFilter = SampleFilter::new();
        for v in [10, 90, 20, 80, 30, 70, 40, 60] {
            f.push_sample(v);
        }
        assert_eq!(f.filtered_value(), Some(40));
    }

    #[test]
    fn partial_window_ignores_unwritten_slots() {
        let mut f: SampleFilter = SampleFilter::new();
        f.push_sample(3000);
        assert_eq!(f.filtered_value(), Some(3000));
        f.push_sample(3100);
        f.push_sample(2900);
        assert_eq!(f.filtered_value(), Some(3000));
    }

    #[test]
    fn single_spike_is_rejected() {
        let mut f: SampleFilter = SampleFilter::new();
        for _ in 0..7 {
            f.push_sample(2048);
        }
        f.push_sample(4095);
        assert_eq!(f.filtered_value(), Some(2048));
    }
}
