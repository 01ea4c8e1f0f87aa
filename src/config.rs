//! Options for the training, testing and prediction calls.
//!
//! Every record deserializes from JSON with missing fields taking their default value.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Result, RuntimeErr};

/// Options for `training::train`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub log_epoch_num: bool,
    pub log_accuracy: bool,
    pub log_error: bool,
    pub log_time: bool,
    pub log_forward: bool,
    pub log_backward: bool,
    pub log_conf_mat: bool,
    pub epochs: u32,
    pub learning_rate: f32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            log_epoch_num: true,
            log_accuracy: false,
            log_error: false,
            log_time: false,
            log_forward: false,
            log_backward: false,
            log_conf_mat: false,
            epochs: 0,
            learning_rate: 0.01,
        }
    }
}

impl TrainingConfig {
    /// Checks the options before the engine is touched.
    ///
    /// # Errors
    /// `RuntimeErr::InvalidConfig` if the learning rate isn't a finite positive number.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(RuntimeErr::InvalidConfig(format!(
                "learning_rate must be a finite positive number, got {}",
                self.learning_rate
            )));
        }

        Ok(())
    }
}

/// Options for `training::test`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    pub log_accuracy: bool,
    pub log_error: bool,
    pub log_time: bool,
    pub log_conf_mat: bool,
}

/// Which of the engine's result blocks a prediction reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    /// The raw output layer.
    #[default]
    Default,
    Softmax,
    /// One-hot of the strongest output.
    Hardmax,
}

/// Options for `prediction::predict`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub log_time: bool,
    pub log_result: bool,
    pub result_mode: ResultMode,
}

/// Reads a configuration record out of a JSON file.
///
/// # Arguments
/// * `path` - The file to read.
///
/// # Errors
/// `RuntimeErr::Io` if the file can't be opened, `RuntimeErr::Json` if it isn't a valid
/// record.
pub fn load_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: TrainingConfig = serde_json::from_str(r#"{ "epochs": 3 }"#).unwrap();

        assert_eq!(cfg.epochs, 3);
        assert!(cfg.log_epoch_num);
        assert!(!cfg.log_conf_mat);
        assert_eq!(cfg.learning_rate, 0.01);
    }

    #[test]
    fn result_mode_is_snake_case() {
        let cfg: PredictionConfig =
            serde_json::from_str(r#"{ "log_result": true, "result_mode": "hardmax" }"#).unwrap();

        assert!(cfg.log_result);
        assert_eq!(cfg.result_mode, ResultMode::Hardmax);
        assert_eq!(PredictionConfig::default().result_mode, ResultMode::Default);
    }

    #[test]
    fn learning_rate_is_validated() {
        assert!(TrainingConfig::default().validate().is_ok());

        for learning_rate in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            let cfg = TrainingConfig {
                learning_rate,
                ..Default::default()
            };
            assert!(matches!(cfg.validate(), Err(RuntimeErr::InvalidConfig(_))));
        }
    }

    #[test]
    fn load_json_reads_a_file() {
        let path = std::env::temp_dir().join(format!("testing_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "log_accuracy": true }"#).unwrap();

        let cfg: TestingConfig = load_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(cfg.log_accuracy);
        assert!(!cfg.log_time);
    }

    #[test]
    fn load_json_reports_missing_files() {
        let err = load_json::<TestingConfig, _>("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, RuntimeErr::Io(_)));
    }
}
