use std::time::Duration;

use ndarray::Array2;

use crate::diagnostics::HookReading;

/// What a single training epoch measured.
///
/// A field is only filled when its logging option was set and the engine supports it.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// Zero based.
    pub epoch: u32,
    pub accuracy: Option<f64>,
    pub error: Option<f64>,
    pub forward: Vec<HookReading>,
    pub backward: Vec<HookReading>,
    pub confusion_matrix: Option<Array2<f32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub epochs: Vec<EpochReport>,
    /// Wall-clock span of the whole epoch loop.
    pub elapsed: Duration,
}

impl TrainingReport {
    /// The report of the last epoch, if any ran.
    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestingReport {
    pub accuracy: Option<f64>,
    pub error: Option<f64>,
    pub confusion_matrix: Option<Array2<f32>>,
    pub elapsed: Duration,
}
