use std::fmt;

use super::DiagnosticHook;

/// An entry point of the engine's export table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Export {
    TrainBatchesInMemory,
    TestBatchesInMemory,
    PredictBatch,

    TrainingDataOffset,
    TrainingLabelsOffset,
    TestingDataOffset,
    TestingLabelsOffset,
    PredictionDataOffset,

    TrainingBatchSize,
    TestingBatchSize,
    PredictionBatchSize,
    TrainingBatchesInMemory,
    TestingBatchesInMemory,

    TotalLayers,
    LayerSize(u32),
    LayerWeightOffset(u32),
    LayerWeightByteSize(u32),
    LayerBiasOffset(u32),
    LayerBiasByteSize(u32),

    GetLearningRate,
    SetLearningRate,

    TrainingBatchesHits,
    TestingBatchesHits,
    TrainingBatchesError,
    TestingBatchesError,

    PredictionResultOffset,
    PredictionSoftmaxResultOffset,
    PredictionHardmaxResultOffset,

    TrainingConfusionMatrixOffset,
    TestingConfusionMatrixOffset,

    Diagnostic(DiagnosticHook),
    /// A self-test entry point, by its full export name.
    SelfTest(String),
}

impl Export {
    /// The name the engine exports this entry point under.
    pub fn name(&self) -> String {
        let fixed = match self {
            Export::TrainBatchesInMemory => "train_batches_in_memory",
            Export::TestBatchesInMemory => "test_batches_in_memory",
            Export::PredictBatch => "predict_batch",
            Export::TrainingDataOffset => "training_data_offset",
            Export::TrainingLabelsOffset => "training_labels_offset",
            Export::TestingDataOffset => "testing_data_offset",
            Export::TestingLabelsOffset => "testing_labels_offset",
            Export::PredictionDataOffset => "prediction_data_offset",
            Export::TrainingBatchSize => "training_batch_size",
            Export::TestingBatchSize => "testing_batch_size",
            Export::PredictionBatchSize => "prediction_batch_size",
            Export::TrainingBatchesInMemory => "training_batches_in_memory",
            Export::TestingBatchesInMemory => "testing_batches_in_memory",
            Export::TotalLayers => "total_layers",
            Export::GetLearningRate => "get_learning_rate",
            Export::SetLearningRate => "set_learning_rate",
            Export::TrainingBatchesHits => "training_batches_hits",
            Export::TestingBatchesHits => "testing_batches_hits",
            Export::TrainingBatchesError => "training_batches_error",
            Export::TestingBatchesError => "testing_batches_error",
            Export::PredictionResultOffset => "prediction_result_offset",
            Export::PredictionSoftmaxResultOffset => "prediction_softmax_result_offset",
            Export::PredictionHardmaxResultOffset => "prediction_hardmax_result_offset",
            Export::TrainingConfusionMatrixOffset => "training_confusion_matrix_offset",
            Export::TestingConfusionMatrixOffset => "testing_confusion_matrix_offset",
            Export::LayerSize(i) => return format!("layer_{i}_size"),
            Export::LayerWeightOffset(i) => return format!("layer_{i}_weight_offset"),
            Export::LayerWeightByteSize(i) => return format!("layer_{i}_weight_byte_size"),
            Export::LayerBiasOffset(i) => return format!("layer_{i}_bias_offset"),
            Export::LayerBiasByteSize(i) => return format!("layer_{i}_bias_byte_size"),
            Export::Diagnostic(hook) => return hook.name(),
            Export::SelfTest(name) => return name.clone(),
        };

        fixed.to_string()
    }
}

impl fmt::Display for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Selects the training or the testing family of entry points.
///
/// Both sweeps share the same loop and only differ in which exports they use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Training,
    Testing,
}

impl Mode {
    pub fn data_offset(self) -> Export {
        match self {
            Mode::Training => Export::TrainingDataOffset,
            Mode::Testing => Export::TestingDataOffset,
        }
    }

    pub fn labels_offset(self) -> Export {
        match self {
            Mode::Training => Export::TrainingLabelsOffset,
            Mode::Testing => Export::TestingLabelsOffset,
        }
    }

    pub fn batch_size(self) -> Export {
        match self {
            Mode::Training => Export::TrainingBatchSize,
            Mode::Testing => Export::TestingBatchSize,
        }
    }

    pub fn batches_in_memory(self) -> Export {
        match self {
            Mode::Training => Export::TrainingBatchesInMemory,
            Mode::Testing => Export::TestingBatchesInMemory,
        }
    }

    /// The entry point that consumes the resident batches.
    pub fn process(self) -> Export {
        match self {
            Mode::Training => Export::TrainBatchesInMemory,
            Mode::Testing => Export::TestBatchesInMemory,
        }
    }

    pub fn hits(self) -> Export {
        match self {
            Mode::Training => Export::TrainingBatchesHits,
            Mode::Testing => Export::TestingBatchesHits,
        }
    }

    pub fn error(self) -> Export {
        match self {
            Mode::Training => Export::TrainingBatchesError,
            Mode::Testing => Export::TestingBatchesError,
        }
    }

    pub fn confusion_matrix_offset(self) -> Export {
        match self {
            Mode::Training => Export::TrainingConfusionMatrixOffset,
            Mode::Testing => Export::TestingConfusionMatrixOffset,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Training => f.write_str("training"),
            Mode::Testing => f.write_str("testing"),
        }
    }
}
