use log::{debug, warn};

use crate::{
    Result,
    context::Context,
    data::{BatchPlan, LabeledDataset},
    engine::{Engine, Export, Mode, Value},
    metrics::MetricAccumulator,
};

/// The per-window metrics a sweep reads back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Readouts {
    pub hits: bool,
    pub error: bool,
}

impl Readouts {
    /// Keeps the requested readouts the engine can serve, warning about the others.
    pub(super) fn resolve<E: Engine>(
        ctx: &Context<E>,
        mode: Mode,
        hits: bool,
        error: bool,
    ) -> Self {
        Self {
            hits: hits && available(ctx, &mode.hits(), "accuracy"),
            error: error && available(ctx, &mode.error(), "error"),
        }
    }
}

fn available<E: Engine>(ctx: &Context<E>, export: &Export, metric: &str) -> bool {
    let found = ctx.has(export);
    if !found {
        warn!("engine doesn't export `{export}`, {metric} won't be reported");
    }

    found
}

/// Streams the whole dataset through the engine once.
///
/// Each window is written, consumed by the engine and only then replaced by the next one.
/// Hits and error are read back after every window, the engine reports them for the
/// batches it just processed.
///
/// # Returns
/// The metrics of the sweep, only holding hits or error if `readouts` asks for them.
pub(super) fn sweep<E: Engine>(
    ctx: &mut Context<E>,
    mode: Mode,
    dataset: &LabeledDataset,
    plan: BatchPlan,
    readouts: Readouts,
) -> Result<MetricAccumulator> {
    let data_window = ctx.window(&mode.data_offset(), plan.batches_resident)?;
    let labels_window = ctx.window(&mode.labels_offset(), plan.batches_resident)?;
    let mut metrics = MetricAccumulator::new(plan.batch_size);

    for (first, requested) in plan.windows() {
        let copied = ctx.stream(dataset.data(), data_window, first, requested)?;
        ctx.stream(dataset.labels(), labels_window, first, copied)?;

        ctx.call(&mode.process(), &[Value::I32(copied as i32)])?;

        let hits = match readouts.hits {
            true => ctx.query_f64(&mode.hits())?.max(0.0).round() as u64,
            false => 0,
        };
        let error = match readouts.error {
            true => ctx.query_f64(&mode.error())?,
            false => 0.0,
        };

        metrics.add_window(copied, hits, error);
        debug!(first_batch = first, batches = copied, hits = hits; "{mode} window processed");
    }

    Ok(metrics)
}
