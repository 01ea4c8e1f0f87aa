#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use model_runtime::{
    Engine, Export, HostImports, Manifest, Result, RuntimeErr, Value,
    data::bridge::{read_f32s, write_f32s},
    engine::{DiagnosticHook, Phase},
};

pub const TRAINING_BATCH: u32 = 2;
pub const TRAINING_RESIDENT: u32 = 3;
pub const TESTING_BATCH: u32 = 2;
pub const TESTING_RESIDENT: u32 = 2;
pub const PREDICTION_BATCH: u32 = 2;
pub const ENTRY: usize = 2;
pub const LAYER_SIZES: [u32; 3] = [2, 3, 2];

pub const TRAINING_DATA: usize = 0;
pub const TRAINING_LABELS: usize = 48;
pub const TESTING_DATA: usize = 96;
pub const TESTING_LABELS: usize = 128;
pub const PREDICTION_DATA: usize = 160;
pub const RESULT: usize = 176;
pub const SOFTMAX_RESULT: usize = 192;
pub const HARDMAX_RESULT: usize = 208;
pub const TRAINING_CONF_MAT: usize = 224;
pub const TESTING_CONF_MAT: usize = 240;
/// `(weight offset, weight bytes, bias offset, bias bytes)` of layers 1 and 2.
pub const LAYER_REGIONS: [(usize, usize, usize, usize); 2] =
    [(256, 24, 280, 12), (292, 24, 316, 8)];
pub const MEMORY: usize = 384;

/// A tiny two-in two-out engine living entirely in host memory.
///
/// Training and testing record what they see; a window's hits are the samples whose
/// label starts with `1.0` and its error is `0.5` per batch. Prediction is the identity.
pub struct FakeEngine {
    memory: Vec<u8>,
    imports: HostImports,
    manifest: Manifest,
    missing: HashSet<String>,
    overrides: HashMap<String, Value>,

    pub learning_rate: f32,
    pub train_calls: Vec<u32>,
    pub test_calls: Vec<u32>,
    pub predict_calls: u32,
    pub seen_training: Vec<f32>,
    pub seen_testing: Vec<f32>,
    pub seen_labels: Vec<f32>,

    last_hits: u32,
    last_error: f32,
}

impl FakeEngine {
    pub fn new() -> Self {
        let hooks = vec![
            DiagnosticHook::new(Phase::Forward, "time"),
            DiagnosticHook::new(Phase::Forward, "a_1"),
            DiagnosticHook::new(Phase::Backward, "time"),
        ];
        let self_tests = vec![
            "test_pass".to_string(),
            "test_fail".to_string(),
            "test_trap".to_string(),
        ];

        let mut engine = Self {
            memory: vec![0; MEMORY],
            imports: HostImports::new(Some(42)),
            manifest: Manifest::new(hooks, self_tests),
            missing: HashSet::new(),
            overrides: HashMap::new(),
            learning_rate: 0.0,
            train_calls: Vec::new(),
            test_calls: Vec::new(),
            predict_calls: 0,
            seen_training: Vec::new(),
            seen_testing: Vec::new(),
            seen_labels: Vec::new(),
            last_hits: 0,
            last_error: 0.0,
        };

        engine.write(TRAINING_CONF_MAT, &[1.0, 0.0, 0.0, 1.0]);
        engine.write(TESTING_CONF_MAT, &[2.0, 1.0, 0.0, 3.0]);

        let (w1, _, b1, _) = LAYER_REGIONS[0];
        engine.write(w1, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        engine.write(b1, &[0.01, 0.02, 0.03]);
        let (w2, _, b2, _) = LAYER_REGIONS[1];
        engine.write(w2, &[-0.1, -0.2, -0.3, -0.4, -0.5, -0.6]);
        engine.write(b2, &[0.5, -0.5]);

        engine
    }

    /// Drops an entry point from the export table.
    pub fn without(mut self, name: &str) -> Self {
        self.missing.insert(name.to_string());
        self
    }

    /// Makes an entry point return `value` instead of what the engine would.
    pub fn returning(mut self, name: &str, value: Value) -> Self {
        self.overrides.insert(name.to_string(), value);
        self
    }

    /// Replaces the reported capabilities.
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn read(&self, offset: usize, count: usize) -> Vec<f32> {
        read_f32s(&self.memory, offset, count).unwrap()
    }

    fn write(&mut self, offset: usize, values: &[f32]) {
        write_f32s(&mut self.memory, offset, values).unwrap();
    }

    fn knows(&self, export: &Export) -> bool {
        match export {
            Export::LayerSize(i) => (*i as usize) < LAYER_SIZES.len(),
            Export::LayerWeightOffset(i)
            | Export::LayerWeightByteSize(i)
            | Export::LayerBiasOffset(i)
            | Export::LayerBiasByteSize(i) => (1..LAYER_SIZES.len() as u32).contains(i),
            Export::Diagnostic(hook) => self.manifest.hooks(hook.phase()).any(|h| h == *hook),
            Export::SelfTest(name) => self.manifest.self_tests().contains(name),
            _ => true,
        }
    }

    /// Consumes `batches` resident batches, returning their data and labels.
    fn consume(
        &mut self,
        data: usize,
        labels: usize,
        batch: u32,
        batches: u32,
    ) -> (Vec<f32>, Vec<f32>) {
        let samples = (batch * batches) as usize;
        let data = self.read(data, samples * ENTRY);
        let labels = self.read(labels, samples * ENTRY);

        // Labels are block-transposed too: the first column of a batch is its first run.
        self.last_hits = labels
            .chunks(batch as usize * ENTRY)
            .map(|block| block[..batch as usize].iter().filter(|&&v| v == 1.0).count() as u32)
            .sum();
        self.last_error = 0.5 * batches as f32;

        (data, labels)
    }

    fn predict(&mut self) {
        let batch = PREDICTION_BATCH as usize;
        let input = self.read(PREDICTION_DATA, batch * ENTRY);

        let mut softmax = vec![0.0; input.len()];
        let mut hardmax = vec![0.0; input.len()];
        for r in 0..batch {
            let sample: Vec<f32> = (0..ENTRY).map(|c| input[c * batch + r]).collect();
            let total: f32 = sample.iter().map(|v| v.exp()).sum();
            let best = if sample[1] > sample[0] { 1 } else { 0 };

            for c in 0..ENTRY {
                softmax[c * batch + r] = sample[c].exp() / total;
                hardmax[c * batch + r] = if c == best { 1.0 } else { 0.0 };
            }
        }

        self.write(RESULT, &input);
        self.write(SOFTMAX_RESULT, &softmax);
        self.write(HARDMAX_RESULT, &hardmax);
        self.predict_calls += 1;
    }
}

fn offset(value: usize) -> Option<Value> {
    Some(Value::I32(value as i32))
}

fn count(value: u32) -> Option<Value> {
    Some(Value::I32(value as i32))
}

impl Engine for FakeEngine {
    fn manifest(&self) -> Manifest {
        self.manifest.clone()
    }

    fn has_export(&self, export: &Export) -> bool {
        !self.missing.contains(&export.name()) && self.knows(export)
    }

    fn invoke(&mut self, export: &Export, args: &[Value]) -> Result<Option<Value>> {
        if !self.has_export(export) {
            return Err(RuntimeErr::MissingExport(export.name()));
        }
        if let Some(value) = self.overrides.get(&export.name()) {
            return Ok(Some(*value));
        }

        let batches = || args.first().and_then(|v| v.as_u32()).unwrap_or(0);

        let value = match export {
            Export::TrainBatchesInMemory => {
                let n = batches();
                let (data, labels) =
                    self.consume(TRAINING_DATA, TRAINING_LABELS, TRAINING_BATCH, n);
                self.train_calls.push(n);
                self.seen_training.extend(data);
                self.seen_labels.extend(labels);
                None
            }
            Export::TestBatchesInMemory => {
                let n = batches();
                let (data, _) = self.consume(TESTING_DATA, TESTING_LABELS, TESTING_BATCH, n);
                self.test_calls.push(n);
                self.seen_testing.extend(data);
                None
            }
            Export::PredictBatch => {
                self.predict();
                None
            }

            Export::TrainingDataOffset => offset(TRAINING_DATA),
            Export::TrainingLabelsOffset => offset(TRAINING_LABELS),
            Export::TestingDataOffset => offset(TESTING_DATA),
            Export::TestingLabelsOffset => offset(TESTING_LABELS),
            Export::PredictionDataOffset => offset(PREDICTION_DATA),

            Export::TrainingBatchSize => count(TRAINING_BATCH),
            Export::TestingBatchSize => count(TESTING_BATCH),
            Export::PredictionBatchSize => count(PREDICTION_BATCH),
            Export::TrainingBatchesInMemory => count(TRAINING_RESIDENT),
            Export::TestingBatchesInMemory => count(TESTING_RESIDENT),

            Export::TotalLayers => count(LAYER_SIZES.len() as u32),
            Export::LayerSize(i) => count(LAYER_SIZES[*i as usize]),
            Export::LayerWeightOffset(i) => offset(LAYER_REGIONS[*i as usize - 1].0),
            Export::LayerWeightByteSize(i) => offset(LAYER_REGIONS[*i as usize - 1].1),
            Export::LayerBiasOffset(i) => offset(LAYER_REGIONS[*i as usize - 1].2),
            Export::LayerBiasByteSize(i) => offset(LAYER_REGIONS[*i as usize - 1].3),

            Export::GetLearningRate => Some(Value::F32(self.learning_rate)),
            Export::SetLearningRate => {
                if let Some(Value::F32(lr)) = args.first() {
                    self.learning_rate = *lr;
                }
                None
            }

            Export::TrainingBatchesHits | Export::TestingBatchesHits => count(self.last_hits),
            Export::TrainingBatchesError | Export::TestingBatchesError => {
                Some(Value::F32(self.last_error))
            }

            Export::PredictionResultOffset => offset(RESULT),
            Export::PredictionSoftmaxResultOffset => offset(SOFTMAX_RESULT),
            Export::PredictionHardmaxResultOffset => offset(HARDMAX_RESULT),
            Export::TrainingConfusionMatrixOffset => offset(TRAINING_CONF_MAT),
            Export::TestingConfusionMatrixOffset => offset(TESTING_CONF_MAT),

            Export::Diagnostic(hook) => match hook.phase() {
                Phase::Forward => Some(Value::F64(1.5)),
                Phase::Backward => Some(Value::F64(2.5)),
            },

            Export::SelfTest(name) => match name.as_str() {
                "test_pass" => {
                    self.imports.assert_eq_f32(1.0, 1.0);
                    None
                }
                "test_fail" => {
                    self.imports
                        .assert_matrix_eq(&self.memory, TRAINING_CONF_MAT, TESTING_CONF_MAT, 2, 2);
                    None
                }
                _ => {
                    return Err(RuntimeErr::Trap {
                        export: name.clone(),
                        detail: "unreachable executed".to_string(),
                    });
                }
            },
        };

        Ok(value)
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn imports(&self) -> &HostImports {
        &self.imports
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `samples` rows of two features each, the label of even rows is `[1, 0]`.
pub fn alternating(samples: usize) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let data = (0..samples)
        .map(|i| vec![i as f32, -(i as f32)])
        .collect();
    let labels = (0..samples)
        .map(|i| match i % 2 {
            0 => vec![1.0, 0.0],
            _ => vec![0.0, 1.0],
        })
        .collect();

    (data, labels)
}
