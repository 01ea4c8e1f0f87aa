//! Host functions an engine is instantiated with.
//!
//! Engine bindings forward the engine's imports to these methods. None of them can fail
//! across the boundary: problems are logged and, for the assertion callbacks, counted.

use std::{
    cell::{Cell, RefCell},
    time::{SystemTime, UNIX_EPOCH},
};

use log::{error, info, warn};
use ndarray::Array2;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::data::bridge;

/// The math, system, message and test imports of an engine.
#[derive(Debug)]
pub struct HostImports {
    rng: RefCell<StdRng>,
    failures: Cell<usize>,
}

impl HostImports {
    /// Creates a new `HostImports`.
    ///
    /// # Arguments
    /// * `seed` - Seed for the engine's random source, or `None` to seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            rng: RefCell::new(rng),
            failures: Cell::new(0),
        }
    }

    pub fn exp(&self, x: f64) -> f64 {
        x.exp()
    }

    pub fn log(&self, x: f64) -> f64 {
        x.ln()
    }

    /// Uniform sample in `[0, 1)`.
    pub fn random(&self) -> f64 {
        self.rng.borrow_mut().random::<f64>()
    }

    /// Wall-clock milliseconds since the Unix epoch.
    pub fn time(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    /// Logs a row-major `rows x cols` table of `f32` stored at `offset`.
    pub fn print_table_f32(&self, memory: &[u8], offset: usize, rows: usize, cols: usize) {
        match read_table(memory, offset, rows, cols) {
            Some(table) => log_table("table", &table),
            None => warn!("print_table_f32: {rows}x{cols} table at {offset} is out of bounds"),
        }
    }

    /// Scalar equality assertion used by the engine's self tests.
    ///
    /// # Returns
    /// Whether both values are equal. A failure is counted.
    pub fn assert_eq_f32(&self, got: f32, expected: f32) -> bool {
        if got == expected {
            return true;
        }

        error!("scalar equality failed: got {got}, expected {expected}");
        self.failures.set(self.failures.get() + 1);
        false
    }

    /// Matrix equality assertion used by the engine's self tests.
    ///
    /// # Arguments
    /// * `memory` - The engine's memory.
    /// * `lhs` - Offset of the first row-major matrix.
    /// * `rhs` - Offset of the second row-major matrix.
    /// * `rows` - Rows of both matrices.
    /// * `cols` - Columns of both matrices.
    ///
    /// # Returns
    /// Whether every element matches. A failure is counted and both matrices are logged.
    pub fn assert_matrix_eq(
        &self,
        memory: &[u8],
        lhs: usize,
        rhs: usize,
        rows: usize,
        cols: usize,
    ) -> bool {
        let (Some(a), Some(b)) = (
            read_table(memory, lhs, rows, cols),
            read_table(memory, rhs, rows, cols),
        ) else {
            error!("matrix equality failed: {rows}x{cols} operands are out of bounds");
            self.failures.set(self.failures.get() + 1);
            return false;
        };

        if a == b {
            return true;
        }

        error!("matrix equality failed");
        log_table("lhs", &a);
        log_table("rhs", &b);
        self.failures.set(self.failures.get() + 1);
        false
    }

    /// The amount of failed assertions so far.
    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    pub fn log_training_time(&self, ms: f64) {
        info!("training time: {ms} ms");
    }

    pub fn log_training_error(&self, epoch: u32, error: f32) {
        info!(epoch = epoch + 1; "training error: {error}");
    }

    pub fn log_training_accuracy(&self, epoch: u32, accuracy: f32) {
        info!(epoch = epoch + 1; "training accuracy: {accuracy:.4}");
    }

    pub fn log_testing_time(&self, ms: f64) {
        info!("testing time: {ms} ms");
    }

    pub fn log_testing_error(&self, error: f32) {
        info!("testing error: {error}");
    }

    pub fn log_testing_accuracy(&self, accuracy: f32) {
        info!("testing accuracy: {accuracy:.4}");
    }

    pub fn log_prediction_time(&self, ms: f64) {
        info!("prediction time: {ms} ms");
    }
}

impl Default for HostImports {
    fn default() -> Self {
        Self::new(None)
    }
}

fn read_table(memory: &[u8], offset: usize, rows: usize, cols: usize) -> Option<Array2<f32>> {
    let values = bridge::read_f32s(memory, offset, rows * cols).ok()?;
    Array2::from_shape_vec((rows, cols), values).ok()
}

/// Logs a matrix one row per line.
pub(crate) fn log_table(label: &str, table: &Array2<f32>) {
    info!(rows = table.nrows(), cols = table.ncols(); "{label}:");
    for (i, row) in table.rows().into_iter().enumerate() {
        info!("  [{i}] {row}");
    }
}
