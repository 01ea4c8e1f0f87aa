use ndarray::{Array2, ShapeBuilder};

use crate::{Result, RuntimeErr};

/// A sample matrix re-encoded in the engine's block-transposed layout.
///
/// Each batch is stored column-major (one contiguous run per feature), and batches are
/// laid out one after the other: value `(row r of batch b, column c)` lives at
/// `b * entry_size * batch_size + c * batch_size + r`.
///
/// A value of this type only exists for a well formed matrix, so every batch is whole.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDataset {
    data: Vec<f32>,
    entry_size: u32,
    sample_count: u32,
    batch_size: u32,
}

impl EncodedDataset {
    /// Encodes a row-major sample matrix.
    ///
    /// # Arguments
    /// * `rows` - The samples, all of the same width.
    /// * `batch_size` - Samples per batch, must divide the amount of rows.
    ///
    /// # Returns
    /// The encoded dataset.
    ///
    /// # Errors
    /// A shape error if the batch size is zero, the matrix is empty, the rows can't be
    /// split in whole batches or a row has the wrong width. Nothing is encoded on error.
    pub fn encode<R>(rows: &[R], batch_size: u32) -> Result<Self>
    where
        R: AsRef<[f32]>,
    {
        if batch_size == 0 {
            return Err(RuntimeErr::ZeroBatchSize);
        }

        let entry_size = match rows.first() {
            Some(first) if !first.as_ref().is_empty() => first.as_ref().len(),
            _ => return Err(RuntimeErr::EmptyMatrix),
        };

        if rows.len() % batch_size as usize != 0 {
            return Err(RuntimeErr::NotDivisible {
                rows: rows.len(),
                batch_size,
            });
        }

        if let Some((row, bad)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.as_ref().len() != entry_size)
        {
            return Err(RuntimeErr::RowLength {
                row,
                got: bad.as_ref().len(),
                expected: entry_size,
            });
        }

        let mut data = Vec::with_capacity(rows.len() * entry_size);

        for batch in rows.chunks(batch_size as usize) {
            for c in 0..entry_size {
                data.extend(batch.iter().map(|row| row.as_ref()[c]));
            }
        }

        Ok(Self {
            data,
            entry_size: entry_size as u32,
            sample_count: rows.len() as u32,
            batch_size,
        })
    }

    /// Reverses the block transpose.
    ///
    /// # Returns
    /// A `sample_count x entry_size` matrix equal to the one that was encoded.
    pub fn decode(&self) -> Array2<f32> {
        let entry = self.entry_size as usize;
        let batch = self.batch_size as usize;

        Array2::from_shape_fn((self.sample_count as usize, entry), |(i, c)| {
            let (b, r) = (i / batch, i % batch);
            self.data[b * entry * batch + c * batch + r]
        })
    }

    /// The flat encoded buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn entry_size(&self) -> u32 {
        self.entry_size
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn total_batches(&self) -> u32 {
        self.sample_count / self.batch_size
    }

    /// The amount of `f32` values a single batch takes.
    pub fn batch_len(&self) -> usize {
        self.entry_size as usize * self.batch_size as usize
    }

    /// The values of `count` batches starting at batch `first`.
    pub(crate) fn batches(&self, first: u32, count: u32) -> &[f32] {
        let start = first as usize * self.batch_len();
        let end = start + count as usize * self.batch_len();
        &self.data[start..end]
    }
}

/// Input data and the labels it should map to, encoded with the same batch size.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    data: EncodedDataset,
    labels: EncodedDataset,
}

impl LabeledDataset {
    /// Encodes samples together with their labels.
    ///
    /// # Arguments
    /// * `data` - The input samples.
    /// * `labels` - One label row per sample.
    /// * `batch_size` - Samples per batch.
    ///
    /// # Errors
    /// `RuntimeErr::CountMismatch` if `data` and `labels` differ in length, checked before
    /// encoding, or any error of `EncodedDataset::encode`.
    pub fn encode<D, L>(data: &[D], labels: &[L], batch_size: u32) -> Result<Self>
    where
        D: AsRef<[f32]>,
        L: AsRef<[f32]>,
    {
        if data.len() != labels.len() {
            return Err(RuntimeErr::CountMismatch {
                data: data.len(),
                labels: labels.len(),
            });
        }

        Ok(Self {
            data: EncodedDataset::encode(data, batch_size)?,
            labels: EncodedDataset::encode(labels, batch_size)?,
        })
    }

    pub fn data(&self) -> &EncodedDataset {
        &self.data
    }

    pub fn labels(&self) -> &EncodedDataset {
        &self.labels
    }

    pub fn batch_size(&self) -> u32 {
        self.data.batch_size
    }

    pub fn total_batches(&self) -> u32 {
        self.data.total_batches()
    }
}

/// Interprets one engine-side block, stored column-major, as a `rows x cols` matrix.
///
/// # Arguments
/// * `block` - Exactly `rows * cols` values, one contiguous run per column.
/// * `rows` - Rows of the resulting matrix.
/// * `cols` - Columns of the resulting matrix.
pub fn decode_block(block: Vec<f32>, rows: usize, cols: usize) -> Result<Array2<f32>> {
    let matrix = Array2::from_shape_vec((rows, cols).f(), block)?;
    Ok(matrix.as_standard_layout().into_owned())
}
