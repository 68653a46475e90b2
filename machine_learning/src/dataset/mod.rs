mod memory;
mod synthetic;
mod tensor;

pub use memory::InMemoryDataset;
pub use synthetic::SyntheticImages;
pub use tensor::{DType, Tensor};

use crate::Result;

/// A single labeled sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub data: Tensor,
    pub label: usize,
}

impl Sample {
    pub fn new(data: impl Into<Tensor>, label: usize) -> Self {
        Self {
            data: data.into(),
            label,
        }
    }
}

/// A fixed size, index addressable collection of samples.
///
/// A `Dataset` is responsible only for *providing access* to samples.
/// It does not define how they are preprocessed nor how they are batched.
/// Indices must be stable for the lifetime of the value.
pub trait Dataset: Send + Sync {
    /// Returns the total number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of classes labels are drawn from.
    fn num_classes(&self) -> usize;

    /// Fetches a sample by index.
    ///
    /// # Errors
    /// Returns `MlErr::OutOfBounds` if `index` is invalid.
    fn get(&self, index: usize) -> Result<Sample>;
}
