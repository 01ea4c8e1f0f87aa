pub mod config;
pub mod context;
pub mod data;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod prediction;
pub mod training;
pub mod weights;

pub use config::{PredictionConfig, ResultMode, TestingConfig, TrainingConfig};
pub use context::Context;
pub use data::{EncodedDataset, LabeledDataset};
pub use engine::{Engine, Export, HostImports, Manifest, Value};
pub use error::{Result, RuntimeErr};
pub use metrics::MetricAccumulator;
pub use prediction::{PredictionReport, predict};
pub use self_test::{SelfTestReport, run_self_tests};
pub use training::{TestingReport, TrainingReport};
pub use weights::{LayerWeightsBundle, export_weights, import_weights};
