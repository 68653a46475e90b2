use super::{Dataset, Sample};
use crate::{MlErr, Result};

/// A dataset whose samples all live in memory.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    samples: Vec<Sample>,
    num_classes: usize,
}

impl InMemoryDataset {
    /// Creates a new `InMemoryDataset`.
    ///
    /// # Arguments
    /// * `samples` - The samples, all of them with the same shape.
    /// * `num_classes` - The amount of classes, every label must be lower than it.
    ///
    /// # Returns
    /// A new `InMemoryDataset` or an error if the samples are inconsistent.
    pub fn new(samples: Vec<Sample>, num_classes: usize) -> Result<Self> {
        if num_classes == 0 {
            return Err(MlErr::InvalidConfig(
                "a dataset needs at least one class".into(),
            ));
        }

        let Some(first) = samples.first() else {
            return Err(MlErr::InvalidConfig("a dataset needs samples".into()));
        };
        let shape = first.data.shape().to_vec();

        for sample in &samples {
            if sample.data.ndim() != shape.len() {
                return Err(MlErr::DimensionMismatch {
                    what: "sample",
                    got: sample.data.ndim(),
                    expected: shape.len(),
                });
            }

            if sample.data.len() != first.data.len() || sample.data.shape() != shape {
                return Err(MlErr::ShapeMismatch {
                    what: "sample",
                    got: sample.data.len(),
                    expected: first.data.len(),
                });
            }

            if sample.label >= num_classes {
                return Err(MlErr::LabelOutOfRange {
                    label: sample.label,
                    num_classes,
                });
            }
        }

        Ok(Self {
            samples,
            num_classes,
        })
    }

    /// Returns the shape shared by every sample.
    pub fn sample_shape(&self) -> &[usize] {
        self.samples[0].data.shape()
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn get(&self, index: usize) -> Result<Sample> {
        self.samples
            .get(index)
            .cloned()
            .ok_or(MlErr::OutOfBounds {
                index,
                len: self.samples.len(),
            })
    }
}
