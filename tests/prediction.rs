mod common;

use common::{FakeEngine, init_logger};
use model_runtime::{
    Context, EncodedDataset, PredictionConfig, PredictionReport, ResultMode, RuntimeErr, Value,
    predict,
};
use ndarray::{Axis, array};

fn rows() -> Vec<[f32; 2]> {
    vec![[1.0, 2.0], [4.0, 3.0], [5.0, 6.0], [8.0, 7.0]]
}

fn run(engine: FakeEngine, mode: ResultMode) -> (Context<FakeEngine>, PredictionReport) {
    init_logger();
    let mut ctx = Context::new(engine);
    let dataset = ctx.encode_prediction(&rows()).unwrap();

    let cfg = PredictionConfig {
        log_time: true,
        log_result: true,
        result_mode: mode,
    };
    let report = predict(&mut ctx, &dataset, &cfg).unwrap();
    (ctx, report)
}

#[test]
fn results_keep_the_input_order() {
    let (ctx, report) = run(FakeEngine::new(), ResultMode::Default);

    assert_eq!(report.batches, 2);
    assert_eq!(ctx.engine().predict_calls, 2);
    assert_eq!(
        report.results,
        Some(array![[1.0, 2.0], [4.0, 3.0], [5.0, 6.0], [8.0, 7.0]])
    );
}

#[test]
fn hardmax_results_are_one_hot() {
    let (_, report) = run(FakeEngine::new(), ResultMode::Hardmax);

    assert_eq!(
        report.results,
        Some(array![[0.0, 1.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]])
    );
}

#[test]
fn softmax_rows_are_distributions() {
    let (_, report) = run(FakeEngine::new(), ResultMode::Softmax);
    let results = report.results.unwrap();

    assert_eq!(results.dim(), (4, 2));
    for (i, row) in results.axis_iter(Axis(0)).enumerate() {
        assert!((row.sum() - 1.0).abs() < 1e-6);
        let larger = if i % 2 == 0 { row[1] } else { row[0] };
        assert!(larger > 0.5);
    }
}

#[test]
fn missing_result_mode_still_runs_every_batch() {
    let engine = FakeEngine::new().without("prediction_softmax_result_offset");
    let (ctx, report) = run(engine, ResultMode::Softmax);

    assert_eq!(report.results, None);
    assert_eq!(report.batches, 2);
    assert_eq!(ctx.engine().predict_calls, 2);
}

#[test]
fn missing_output_size_still_runs_every_batch() {
    let (ctx, report) = run(FakeEngine::new().without("layer_2_size"), ResultMode::Default);

    assert_eq!(report.results, None);
    assert_eq!(ctx.engine().predict_calls, 2);
}

#[test]
fn dataset_must_use_the_prediction_batch_size() {
    init_logger();
    let mut ctx = Context::new(FakeEngine::new());
    let dataset = EncodedDataset::encode(&rows(), 4).unwrap();

    let err = predict(&mut ctx, &dataset, &PredictionConfig::default()).unwrap_err();

    assert!(matches!(
        err,
        RuntimeErr::BatchSizeMismatch {
            got: 4,
            expected: 2
        }
    ));
    assert_eq!(ctx.engine().predict_calls, 0);
}

#[test]
fn partial_batches_are_rejected_while_encoding() {
    init_logger();
    let mut ctx = Context::new(FakeEngine::new());

    let err = ctx.encode_prediction(&rows()[..3]).unwrap_err();
    assert!(matches!(
        err,
        RuntimeErr::NotDivisible {
            rows: 3,
            batch_size: 2
        }
    ));
}

#[test]
fn result_block_larger_than_memory_is_rejected() {
    init_logger();
    let engine = FakeEngine::new().returning("layer_2_size", Value::I32(-1));
    let mut ctx = Context::new(engine);
    let dataset = ctx.encode_prediction(&rows()).unwrap();

    let err = predict(&mut ctx, &dataset, &PredictionConfig::default()).unwrap_err();

    assert!(matches!(err, RuntimeErr::OutOfBounds { offset: 176, .. }));
    assert_eq!(ctx.engine().predict_calls, 0);
}
