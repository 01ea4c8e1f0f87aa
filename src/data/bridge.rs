//! Moves encoded data in and out of the engine's linear memory.
//!
//! Every access is bounds checked before a single byte is read or written. Values are
//! stored as native `f32` bytes, the same layout the engine reads them with.

use std::ops::Range;

use log::debug;

use super::EncodedDataset;
use crate::{Result, RuntimeErr};

const F32_SIZE: usize = size_of::<f32>();

/// Where a chunk of encoded data must land in engine memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWindow {
    pub base_offset: usize,
    pub capacity_in_batches: u32,
}

impl MemoryWindow {
    pub fn new(base_offset: usize, capacity_in_batches: u32) -> Self {
        Self {
            base_offset,
            capacity_in_batches,
        }
    }
}

/// How a dataset is walked for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch_size: u32,
    pub total_batches: u32,
    /// Upper bound of batches per window, the last window may hold fewer.
    pub batches_resident: u32,
}

impl BatchPlan {
    /// The `(first_batch, batch_count)` windows of this plan, in order.
    pub fn windows(&self) -> Chunks {
        chunks(self.total_batches, self.batches_resident)
    }
}

/// Iterator over the windows needed to stream `total` batches.
#[derive(Debug, Clone)]
pub struct Chunks {
    next: u32,
    total: u32,
    capacity: u32,
}

impl Iterator for Chunks {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total || self.capacity == 0 {
            return None;
        }

        let first = self.next;
        let count = self.capacity.min(self.total - first);
        self.next += count;
        Some((first, count))
    }
}

/// Splits `total` batches in windows of at most `capacity` batches.
///
/// The last window is truncated to the batches that remain; an empty window is never
/// produced.
pub fn chunks(total: u32, capacity: u32) -> Chunks {
    Chunks {
        next: 0,
        total,
        capacity,
    }
}

/// Copies a window of whole batches into engine memory.
///
/// # Arguments
/// * `memory` - The engine's memory.
/// * `encoded` - The source dataset.
/// * `window` - Destination offset and capacity.
/// * `batch_index` - The first batch to copy.
/// * `requested` - The amount of batches to copy.
///
/// # Returns
/// The amount of batches actually copied. It is lower than `requested` when fewer batches
/// remain past `batch_index` or when the window can't hold them all; it is never a
/// partial batch.
///
/// # Errors
/// `RuntimeErr::OutOfBounds` if the destination doesn't fit in `memory`; nothing is
/// written in that case.
pub fn stream_chunk(
    memory: &mut [u8],
    encoded: &EncodedDataset,
    window: MemoryWindow,
    batch_index: u32,
    requested: u32,
) -> Result<u32> {
    let remaining = encoded.total_batches().saturating_sub(batch_index);
    let count = requested.min(window.capacity_in_batches).min(remaining);

    if count == 0 {
        return Ok(0);
    }

    write_f32s(memory, window.base_offset, encoded.batches(batch_index, count))?;
    debug!(
        batch_index = batch_index,
        batches = count,
        offset = window.base_offset;
        "chunk streamed"
    );

    Ok(count)
}

/// Reads `count` consecutive `f32` values stored at `offset`.
pub fn read_f32s(memory: &[u8], offset: usize, count: usize) -> Result<Vec<f32>> {
    let len = count.checked_mul(F32_SIZE).ok_or(RuntimeErr::OutOfBounds {
        offset,
        len: usize::MAX,
        memory: memory.len(),
    })?;
    let range = byte_range(memory.len(), offset, len)?;

    let values = memory[range]
        .chunks_exact(F32_SIZE)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect();

    Ok(values)
}

/// Writes `values` at `offset`.
pub fn write_f32s(memory: &mut [u8], offset: usize, values: &[f32]) -> Result<()> {
    let bytes: &[u8] = bytemuck::cast_slice(values);
    let range = byte_range(memory.len(), offset, bytes.len())?;
    memory[range].copy_from_slice(bytes);
    Ok(())
}

/// Validates that `len` bytes starting at `offset` fit in a memory of `memory` bytes.
pub(crate) fn byte_range(memory: usize, offset: usize, len: usize) -> Result<Range<usize>> {
    match offset.checked_add(len) {
        Some(end) if end <= memory => Ok(offset..end),
        _ => Err(RuntimeErr::OutOfBounds {
            offset,
            len,
            memory,
        }),
    }
}
