use serde::{Deserialize, Serialize};

/// A raw sample written out in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineSample {
    pub data: Vec<u8>,
    pub label: usize,
}

fn default_noise() -> f32 {
    16.
}

/// Where a dataset partition comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetConfig {
    /// `u8` samples listed in the config, every `data` holding `shape.iter().product()`
    /// values in row major order.
    Inline {
        shape: Vec<usize>,
        num_classes: usize,
        samples: Vec<InlineSample>,
    },
    /// Noisy copies of one random prototype image per class.
    ///
    /// Partitions with the same `seed` share their prototypes, `stream` picks the noise
    /// so partitions of one problem differ.
    Synthetic {
        len: usize,
        shape: Vec<usize>,
        num_classes: usize,
        seed: u64,
        #[serde(default)]
        stream: u64,
        #[serde(default = "default_noise")]
        noise: f32,
    },
}

impl DatasetConfig {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Inline { shape, .. } | Self::Synthetic { shape, .. } => shape,
        }
    }

    pub fn num_classes(&self) -> usize {
        match self {
            Self::Inline { num_classes, .. } | Self::Synthetic { num_classes, .. } => *num_classes,
        }
    }

    /// Checks the description is self consistent.
    ///
    /// # Returns
    /// A description of the first problem found.
    pub(super) fn validate(&self) -> Result<(), String> {
        let shape = self.shape();
        if shape.is_empty() || shape.contains(&0) {
            return Err(format!("invalid sample shape {shape:?}"));
        }

        if self.num_classes() == 0 {
            return Err("num_classes must be greater than 0".into());
        }

        match self {
            Self::Inline {
                samples,
                num_classes,
                ..
            } => {
                if samples.is_empty() {
                    return Err("dataset must have at least one sample".into());
                }

                let size: usize = shape.iter().product();
                for (i, sample) in samples.iter().enumerate() {
                    if sample.data.len() != size {
                        return Err(format!(
                            "sample {i} has {} values, shape {shape:?} needs {size}",
                            sample.data.len()
                        ));
                    }

                    if sample.label >= *num_classes {
                        return Err(format!(
                            "sample {i} has label {}, but there are only {num_classes} classes",
                            sample.label
                        ));
                    }
                }
            }
            Self::Synthetic { len, noise, .. } => {
                if *len == 0 {
                    return Err("dataset must have at least one sample".into());
                }

                if !noise.is_finite() || *noise < 0. {
                    return Err(format!("noise must be non negative and finite, got {noise}"));
                }
            }
        }

        Ok(())
    }
}
