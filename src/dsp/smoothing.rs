/// Simple moving average over the last `N` pushed values.
///
/// Until `N` values have been pushed the average is over what has been seen
/// so far, so the first value passes straight through.
#[derive(Debug, Clone)]
pub struct MovingAverage<const N: usize> {
    window: [f64; N],
    len: usize,
    next: usize,
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            window: [0.0; N],
            len: 0,
            next: 0,
        }
    }

    /// Push `value` and return the updated average.
    pub fn push(&mut self, value: f64) -> f64 {
        self.window[self.next] = value;
        self.next = (self.next + 1) % N;
        self.len = (self.len + 1).min(N);
        self.value()
    }

    pub fn value(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        // Unfilled slots are still zero; summing the whole window keeps the
        // average free of accumulated drift.
        self.window.iter().sum::<f64>() / self.len as f64
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}
