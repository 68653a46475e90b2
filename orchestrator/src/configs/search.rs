use std::{num::NonZeroUsize, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::{DatasetConfig, OpConfig};
use crate::error::OrchestratorError;

const DEFAULT_EPOCHS: NonZeroUsize = NonZeroUsize::new(10).unwrap();
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(50).unwrap();

fn default_epochs() -> NonZeroUsize {
    DEFAULT_EPOCHS
}

fn default_batch_size() -> NonZeroUsize {
    DEFAULT_BATCH_SIZE
}

/// Everything a grid search needs, as read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub learning_rates: Vec<f32>,
    pub momenta: Vec<f32>,
    #[serde(default = "default_epochs")]
    pub epochs: NonZeroUsize,
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,
    /// Whether every training epoch visits the samples in a new random order.
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub nesterov: bool,
    /// Seeds shuffling and weight initialization, `None` draws from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    /// The amount of trials trained at once.
    #[serde(default)]
    pub workers: Option<NonZeroUsize>,
    /// Wall clock cap per trial, checked between epochs.
    #[serde(default)]
    pub max_trial_secs: Option<u64>,
    #[serde(default = "OpConfig::default_chain")]
    pub ops: Vec<OpConfig>,
    pub train: DatasetConfig,
    pub validation: DatasetConfig,
    pub test: DatasetConfig,
    /// Where to write the sweep report.
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

impl SearchConfig {
    /// Checks the whole config before any training starts.
    ///
    /// # Errors
    /// `OrchestratorError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        let invalid = |msg: String| Err(OrchestratorError::InvalidConfig(msg));

        if self.learning_rates.is_empty() {
            return invalid("at least one learning rate is required".into());
        }

        if let Some(lr) = self
            .learning_rates
            .iter()
            .find(|lr| !lr.is_finite() || **lr <= 0.)
        {
            return invalid(format!("learning rates must be positive and finite, got {lr}"));
        }

        if self.momenta.is_empty() {
            return invalid("at least one momentum is required".into());
        }

        if let Some(mu) = self.momenta.iter().find(|mu| !(0. ..1.).contains(*mu)) {
            return invalid(format!("momenta must be in [0, 1), got {mu}"));
        }

        if self.max_trial_secs == Some(0) {
            return invalid("max_trial_secs must be greater than 0".into());
        }

        let partitions = [
            ("train", &self.train),
            ("validation", &self.validation),
            ("test", &self.test),
        ];

        for (name, dataset) in partitions {
            if let Err(msg) = dataset.validate() {
                return invalid(format!("{name} dataset: {msg}"));
            }
        }

        for (name, dataset) in &partitions[1..] {
            if dataset.shape() != self.train.shape() {
                return invalid(format!(
                    "{name} samples have shape {:?}, train samples have shape {:?}",
                    dataset.shape(),
                    self.train.shape()
                ));
            }

            if dataset.num_classes() != self.train.num_classes() {
                return invalid(format!(
                    "{name} dataset has {} classes, train dataset has {}",
                    dataset.num_classes(),
                    self.train.num_classes()
                ));
            }
        }

        Ok(())
    }
}
