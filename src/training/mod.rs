//! Epoch and batch iteration for training and testing.

mod report;
mod sweep;

use std::time::Instant;

use log::info;

pub use report::{EpochReport, TestingReport, TrainingReport};
use sweep::{Readouts, sweep};

use crate::{
    Result,
    config::{TestingConfig, TrainingConfig},
    context::Context,
    data::LabeledDataset,
    diagnostics,
    engine::{Engine, Mode, Phase},
};

/// Trains the engine on `dataset` for `cfg.epochs` epochs.
///
/// # Arguments
/// * `ctx` - The context owning the engine.
/// * `dataset` - Samples and labels, encoded with the engine's training batch size.
/// * `cfg` - Epochs, learning rate and what to report.
///
/// # Returns
/// One report per epoch, plus the time the whole loop took.
///
/// # Errors
/// `RuntimeErr::InvalidConfig` or `RuntimeErr::BatchSizeMismatch` before the engine is
/// touched, or any error the engine or the memory bridge fails with.
pub fn train<E: Engine>(
    ctx: &mut Context<E>,
    dataset: &LabeledDataset,
    cfg: &TrainingConfig,
) -> Result<TrainingReport> {
    cfg.validate()?;
    let plan = ctx.batch_plan(Mode::Training, dataset)?;
    let readouts = Readouts::resolve(ctx, Mode::Training, cfg.log_accuracy, cfg.log_error);

    ctx.set_learning_rate(cfg.learning_rate)?;
    info!(
        epochs = cfg.epochs,
        batches = plan.total_batches,
        resident = plan.batches_resident,
        learning_rate = cfg.learning_rate;
        "training started"
    );

    let start = Instant::now();
    let mut epochs = Vec::with_capacity(cfg.epochs as usize);

    for epoch in 0..cfg.epochs {
        let metrics = sweep(ctx, Mode::Training, dataset, plan, readouts)?;

        if cfg.log_epoch_num {
            info!("epoch {}/{}", epoch + 1, cfg.epochs);
        }

        let accuracy = readouts.hits.then(|| metrics.accuracy());
        let error = readouts.error.then(|| metrics.mean_error());
        let imports = ctx.engine().imports();

        if let Some(accuracy) = accuracy {
            imports.log_training_accuracy(epoch, accuracy as f32);
        }
        if let Some(error) = error {
            imports.log_training_error(epoch, error as f32);
        }

        let forward = match cfg.log_forward {
            true => diagnostics::pull_hooks(ctx, Phase::Forward)?,
            false => Vec::new(),
        };
        let backward = match cfg.log_backward {
            true => diagnostics::pull_hooks(ctx, Phase::Backward)?,
            false => Vec::new(),
        };
        let confusion_matrix = match cfg.log_conf_mat {
            true => diagnostics::confusion_matrix(ctx, Mode::Training)?,
            false => None,
        };

        epochs.push(EpochReport {
            epoch,
            accuracy,
            error,
            forward,
            backward,
            confusion_matrix,
        });
    }

    let elapsed = start.elapsed();
    if cfg.log_time {
        ctx.engine()
            .imports()
            .log_training_time(elapsed.as_secs_f64() * 1000.0);
    }

    Ok(TrainingReport { epochs, elapsed })
}

/// Runs `dataset` through the engine once, without learning.
///
/// # Arguments
/// * `ctx` - The context owning the engine.
/// * `dataset` - Samples and labels, encoded with the engine's testing batch size.
/// * `cfg` - What to report.
///
/// # Errors
/// `RuntimeErr::BatchSizeMismatch` before the engine is touched, or any error the engine
/// or the memory bridge fails with.
pub fn test<E: Engine>(
    ctx: &mut Context<E>,
    dataset: &LabeledDataset,
    cfg: &TestingConfig,
) -> Result<TestingReport> {
    let plan = ctx.batch_plan(Mode::Testing, dataset)?;
    let readouts = Readouts::resolve(ctx, Mode::Testing, cfg.log_accuracy, cfg.log_error);

    let start = Instant::now();
    let metrics = sweep(ctx, Mode::Testing, dataset, plan, readouts)?;
    let elapsed = start.elapsed();

    let accuracy = readouts.hits.then(|| metrics.accuracy());
    let error = readouts.error.then(|| metrics.mean_error());
    let imports = ctx.engine().imports();

    if let Some(accuracy) = accuracy {
        imports.log_testing_accuracy(accuracy as f32);
    }
    if let Some(error) = error {
        imports.log_testing_error(error as f32);
    }
    if cfg.log_time {
        imports.log_testing_time(elapsed.as_secs_f64() * 1000.0);
    }

    let confusion_matrix = match cfg.log_conf_mat {
        true => diagnostics::confusion_matrix(ctx, Mode::Testing)?,
        false => None,
    };

    Ok(TestingReport {
        accuracy,
        error,
        confusion_matrix,
        elapsed,
    })
}
