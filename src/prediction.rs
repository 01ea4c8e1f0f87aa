use std::time::{Duration, Instant};

use log::{info, warn};
use ndarray::Array2;

use crate::{
    Result, RuntimeErr,
    config::{PredictionConfig, ResultMode},
    context::Context,
    data::{EncodedDataset, bridge::byte_range, decode_block},
    engine::{Engine, Export, imports::log_table},
};

/// What a prediction call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionReport {
    /// Batches run through the engine.
    pub batches: u32,
    /// One row of outputs per sample, in input order. `None` when the engine can't
    /// serve the configured result mode.
    pub results: Option<Array2<f32>>,
    pub elapsed: Duration,
}

impl ResultMode {
    fn offset(self) -> Export {
        match self {
            ResultMode::Default => Export::PredictionResultOffset,
            ResultMode::Softmax => Export::PredictionSoftmaxResultOffset,
            ResultMode::Hardmax => Export::PredictionHardmaxResultOffset,
        }
    }
}

/// Where the engine leaves the outputs of the resident batch.
struct ResultBlock {
    offset: usize,
    outputs: usize,
}

impl ResultBlock {
    fn resolve<E: Engine>(
        ctx: &mut Context<E>,
        mode: ResultMode,
        batch_size: u32,
    ) -> Result<Option<Self>> {
        let export = mode.offset();

        let Some(offset) = ctx.try_query_usize(&export)? else {
            warn!("engine doesn't export `{export}`, predictions won't be extracted");
            return Ok(None);
        };

        let Some(outputs) = ctx.output_size()? else {
            warn!("engine doesn't report its output size, predictions won't be extracted");
            return Ok(None);
        };
        let outputs = outputs as usize;

        let len = outputs
            .checked_mul(batch_size as usize)
            .and_then(|values| values.checked_mul(size_of::<f32>()))
            .unwrap_or(usize::MAX);
        byte_range(ctx.engine().memory().len(), offset, len)?;

        Ok(Some(Self { offset, outputs }))
    }
}

/// Runs every sample of `dataset` through the engine, one batch at a time.
///
/// # Arguments
/// * `ctx` - The context owning the engine.
/// * `dataset` - Unlabeled samples, encoded with the engine's prediction batch size.
/// * `cfg` - Result mode and what to report.
///
/// # Returns
/// The predicted rows, in the same order as the encoded samples.
///
/// # Errors
/// `RuntimeErr::BatchSizeMismatch` before the engine is touched, or any error the engine
/// or the memory bridge fails with.
pub fn predict<E: Engine>(
    ctx: &mut Context<E>,
    dataset: &EncodedDataset,
    cfg: &PredictionConfig,
) -> Result<PredictionReport> {
    let batch_size = ctx.query_u32(&Export::PredictionBatchSize)?;
    if dataset.batch_size() != batch_size {
        return Err(RuntimeErr::BatchSizeMismatch {
            got: dataset.batch_size(),
            expected: batch_size,
        });
    }

    let window = ctx.window(&Export::PredictionDataOffset, 1)?;
    let block = ResultBlock::resolve(ctx, cfg.result_mode, batch_size)?;
    let total_batches = dataset.total_batches();

    let mut values = match &block {
        Some(block) => Vec::with_capacity(dataset.sample_count() as usize * block.outputs),
        None => Vec::new(),
    };

    let start = Instant::now();

    for batch in 0..total_batches {
        ctx.stream(dataset, window, batch, 1)?;
        ctx.call(&Export::PredictBatch, &[])?;

        let Some(block) = &block else {
            continue;
        };

        let raw = ctx.read_f32s(block.offset, block.outputs * batch_size as usize)?;
        let rows = decode_block(raw, batch_size as usize, block.outputs)?;

        if cfg.log_result {
            log_table(&format!("batch {batch} prediction"), &rows);
        }

        values.extend(rows.iter().copied());
    }

    let elapsed = start.elapsed();
    info!(batches = total_batches; "prediction finished");

    if cfg.log_time {
        ctx.engine()
            .imports()
            .log_prediction_time(elapsed.as_secs_f64() * 1000.0);
    }

    let results = match block {
        Some(block) => {
            let shape = (dataset.sample_count() as usize, block.outputs);
            Some(Array2::from_shape_vec(shape, values)?)
        }
        None => None,
    };

    Ok(PredictionReport {
        batches: total_batches,
        results,
        elapsed,
    })
}
