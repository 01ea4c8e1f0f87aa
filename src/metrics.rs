/// Folds per-window hits and error into per-call accuracy and mean error.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MetricAccumulator {
    batch_size: u32,

    pub total_hits: u64,
    pub total_error: f64,
    pub sample_count: u64,
    pub batch_count: u64,
}

impl MetricAccumulator {
    /// Creates a new `MetricAccumulator`.
    ///
    /// # Arguments
    /// * `batch_size` - Samples per batch, used to count samples.
    pub fn new(batch_size: u32) -> Self {
        Self {
            batch_size,
            ..Default::default()
        }
    }

    /// Folds in a single batch.
    #[inline]
    pub fn add_batch(&mut self, hits: u64, error: f64) {
        self.add_window(1, hits, error);
    }

    /// Folds in a window of `batches` batches.
    ///
    /// # Arguments
    /// * `batches` - Batches processed by the window.
    /// * `hits` - Correct predictions over the whole window.
    /// * `error` - Error summed over the window's batches.
    #[inline]
    pub fn add_window(&mut self, batches: u32, hits: u64, error: f64) {
        self.total_hits += hits;
        self.total_error += error;
        self.batch_count += batches as u64;
        self.sample_count += batches as u64 * self.batch_size as u64;
    }

    /// The fraction of samples predicted correctly, `0` if nothing was processed.
    pub fn accuracy(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }

        self.total_hits as f64 / self.sample_count as f64
    }

    /// The error averaged per batch, `0` if nothing was processed.
    pub fn mean_error(&self) -> f64 {
        if self.batch_count == 0 {
            return 0.0;
        }

        self.total_error / self.batch_count as f64
    }

    /// Clears every total, keeping the batch size.
    pub fn reset(&mut self) {
        *self = Self::new(self.batch_size);
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }
}
