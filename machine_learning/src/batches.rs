use std::num::NonZeroUsize;

use log::debug;
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{MlErr, Result, dataset::Dataset, ops::Op};

/// A group of preprocessed samples.
///
/// Row `i` of `data` is the sample whose label is `labels[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub data: Array2<f32>,
    pub labels: Array1<usize>,
}

impl Batch {
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Splits a dataset into preprocessed batches.
///
/// Every call to `iter` starts a new pass over the whole dataset, covering each sample
/// exactly once. When shuffling is enabled each pass draws a fresh permutation, otherwise
/// the samples come in index order. The last batch of a pass may be shorter than the
/// batch size.
///
/// The generator can be shared between threads; the only state it mutates is the random
/// number generator, which is locked while a permutation is drawn.
pub struct BatchGenerator<D: Dataset> {
    dataset: D,
    batch_size: NonZeroUsize,
    shuffle: bool,
    op: Op,
    rng: Mutex<StdRng>,
}

impl<D: Dataset> BatchGenerator<D> {
    /// Creates a new `BatchGenerator`.
    ///
    /// # Arguments
    /// * `dataset` - The samples to split.
    /// * `batch_size` - The maximum amount of samples per batch.
    /// * `shuffle` - Whether every pass visits the samples in a new random order.
    /// * `op` - Preprocessing applied to each sample, it must produce vectors.
    ///
    /// # Returns
    /// A new `BatchGenerator` or `MlErr::InvalidConfig` if `batch_size` is zero.
    pub fn new(dataset: D, batch_size: usize, shuffle: bool, op: Op) -> Result<Self> {
        let batch_size = NonZeroUsize::new(batch_size)
            .ok_or_else(|| MlErr::InvalidConfig("batch size must be positive".into()))?;

        Ok(Self {
            dataset,
            batch_size,
            shuffle,
            op,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    /// Replaces the random number generator with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    #[inline]
    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    #[inline]
    pub fn shuffles(&self) -> bool {
        self.shuffle
    }

    /// Returns the amount of batches a single pass yields.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size.get())
    }

    /// Returns the width of the rows this generator stacks, found by preprocessing the
    /// first sample.
    ///
    /// # Errors
    /// `MlErr::InvalidConfig` if the dataset is empty, or whatever the op fails with.
    pub fn feature_dim(&self) -> Result<usize> {
        if self.dataset.is_empty() {
            return Err(MlErr::InvalidConfig("the dataset has no samples".into()));
        }

        let sample = self.dataset.get(0)?;
        Ok((self.op)(sample.data)?.to_row()?.len())
    }

    /// Starts a new pass over the dataset.
    pub fn iter(&self) -> Batches<'_, D> {
        self.iter_with(&mut *self.rng.lock())
    }

    /// Starts a new pass over the dataset, drawing the permutation from `rng` instead of
    /// the generator's own random number generator.
    ///
    /// Callers sharing one generator between threads use this to keep their pass order
    /// independent of each other.
    pub fn iter_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Batches<'_, D> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();

        if self.shuffle {
            order.shuffle(rng);
        }

        debug!(
            samples = order.len(), shuffle = self.shuffle;
            "starting batch pass"
        );

        Batches {
            generator: self,
            order,
            cursor: 0,
            dim: None,
        }
    }
}

impl<'a, D: Dataset> IntoIterator for &'a BatchGenerator<D> {
    type Item = Result<Batch>;
    type IntoIter = Batches<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A single pass over a `BatchGenerator`.
///
/// Yields an error and then stops if a sample cannot be fetched or preprocessed, or if
/// preprocessing produces rows of different widths.
pub struct Batches<'g, D: Dataset> {
    generator: &'g BatchGenerator<D>,
    order: Vec<usize>,
    cursor: usize,
    dim: Option<usize>,
}

impl<D: Dataset> Batches<'_, D> {
    /// Returns the sample indices of this pass in the order they are visited.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn stack(&mut self, indices: &[usize]) -> Result<Batch> {
        let BatchGenerator { dataset, op, .. } = self.generator;

        let mut data = Vec::new();
        let mut labels = Vec::with_capacity(indices.len());

        for &index in indices {
            let sample = dataset.get(index)?;
            let row = op(sample.data)?.to_row()?;

            let dim = *self.dim.get_or_insert(row.len());
            if row.len() != dim {
                return Err(MlErr::ShapeMismatch {
                    what: "batch row",
                    got: row.len(),
                    expected: dim,
                });
            }

            data.extend(row);
            labels.push(sample.label);
        }

        let dim = self.dim.unwrap_or_default();
        let data = Array2::from_shape_vec((labels.len(), dim), data).map_err(|_| {
            MlErr::ShapeMismatch {
                what: "batch",
                got: labels.len(),
                expected: indices.len(),
            }
        })?;

        Ok(Batch {
            data,
            labels: Array1::from_vec(labels),
        })
    }
}

impl<D: Dataset> Iterator for Batches<'_, D> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }

        let end = (self.cursor + self.generator.batch_size.get()).min(self.order.len());
        let indices = self.order[self.cursor..end].to_vec();

        match self.stack(&indices) {
            Ok(batch) => {
                self.cursor = end;
                Some(Ok(batch))
            }
            Err(e) => {
                self.cursor = self.order.len();
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.order.len() - self.cursor;
        let n = remaining.div_ceil(self.generator.batch_size.get());
        (n, Some(n))
    }
}
