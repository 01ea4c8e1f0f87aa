//! Optional introspection an engine may implement: step timings and confusion matrices.

use log::{info, warn};
use ndarray::Array2;

use crate::{
    Result,
    context::Context,
    engine::{DiagnosticHook, Engine, Export, Mode, Phase, imports::log_table},
};

/// The value a diagnostic hook returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HookReading {
    pub hook: DiagnosticHook,
    pub value: f64,
}

/// Calls every hook the engine implements for `phase`, in step order.
///
/// # Returns
/// One reading per implemented hook, empty if the engine implements none for `phase`.
///
/// # Errors
/// Whatever the engine fails with while running a hook.
pub fn pull_hooks<E: Engine>(ctx: &mut Context<E>, phase: Phase) -> Result<Vec<HookReading>> {
    let hooks: Vec<_> = ctx.manifest().hooks(phase).collect();

    if hooks.is_empty() {
        warn!("engine implements no {phase} diagnostics");
        return Ok(Vec::new());
    }

    let mut readings = Vec::with_capacity(hooks.len());
    for hook in hooks {
        let value = ctx.query_f64(&Export::Diagnostic(hook))?;
        info!("{phase} {}: {value}", hook.step());
        readings.push(HookReading { hook, value });
    }

    Ok(readings)
}

/// Reads the `classes x classes` confusion matrix the engine keeps for `mode`.
///
/// # Returns
/// The row-major matrix, or `None` when the engine doesn't report it or doesn't report
/// the size of its output layer.
///
/// # Errors
/// `RuntimeErr::OutOfBounds` if the matrix doesn't fit in engine memory.
pub fn confusion_matrix<E: Engine>(
    ctx: &mut Context<E>,
    mode: Mode,
) -> Result<Option<Array2<f32>>> {
    let Some(offset) = ctx.try_query_usize(&mode.confusion_matrix_offset())? else {
        warn!("engine keeps no {mode} confusion matrix");
        return Ok(None);
    };

    let Some(classes) = ctx.output_size()? else {
        warn!("engine doesn't report its output size, {mode} confusion matrix skipped");
        return Ok(None);
    };

    let classes = classes as usize;
    let cells = classes.checked_mul(classes).unwrap_or(usize::MAX);
    let values = ctx.read_f32s(offset, cells)?;
    let matrix = Array2::from_shape_vec((classes, classes), values)?;

    log_table(&format!("{mode} confusion matrix"), &matrix);
    Ok(Some(matrix))
}
