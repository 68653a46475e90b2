use std::time::Duration;

use machine_learning::{
    dataset::{InMemoryDataset, Sample, SyntheticImages},
    ops::{self, Op},
};
use ndarray::{ArrayD, IxDyn};
use rand::{SeedableRng, rngs::StdRng};

use super::{DatasetConfig, OpConfig, SearchConfig};
use crate::{error::OrchestratorError, search::GridSearch};

/// Turns validated configs into the objects the search runs on.
pub struct Adapter;

impl Adapter {
    pub fn new() -> Self {
        Self
    }

    /// Builds the grid search described by `config`.
    pub fn adapt_search(&self, config: &SearchConfig) -> Result<GridSearch, OrchestratorError> {
        let search = GridSearch::new(
            config.learning_rates.clone(),
            config.momenta.clone(),
            config.epochs,
        )?
        .with_nesterov(config.nesterov)
        .with_seed(config.seed)
        .with_workers(config.workers)
        .with_max_trial_time(config.max_trial_secs.map(Duration::from_secs));

        Ok(search)
    }

    /// Chains the configured ops, in order, into a single op.
    pub fn adapt_ops(&self, configs: &[OpConfig]) -> Op {
        ops::chain(configs.iter().map(|&config| self.adapt_op(config)))
    }

    fn adapt_op(&self, config: OpConfig) -> Op {
        match config {
            OpConfig::Vectorize => ops::vectorize(),
            OpConfig::TypeCast { dtype } => ops::type_cast(dtype),
            OpConfig::Add { value } => ops::add(value),
            OpConfig::Mul { value } => ops::mul(value),
            OpConfig::Hwc2chw => ops::hwc2chw(),
            OpConfig::Hflip => ops::hflip(),
        }
    }

    /// Materializes a dataset partition.
    pub fn adapt_dataset(&self, config: &DatasetConfig) -> Result<InMemoryDataset, OrchestratorError> {
        let dataset = match config {
            DatasetConfig::Inline {
                shape,
                num_classes,
                samples,
            } => {
                let samples = samples
                    .iter()
                    .map(|sample| {
                        let data = ArrayD::from_shape_vec(IxDyn(shape), sample.data.clone())
                            .map_err(|e| OrchestratorError::InvalidConfig(e.to_string()))?;
                        Ok(Sample::new(data, sample.label))
                    })
                    .collect::<Result<Vec<_>, OrchestratorError>>()?;

                InMemoryDataset::new(samples, *num_classes)?
            }
            DatasetConfig::Synthetic {
                len,
                shape,
                num_classes,
                seed,
                stream,
                noise,
            } => {
                let source = SyntheticImages::new(
                    shape,
                    *num_classes,
                    *noise,
                    &mut StdRng::seed_from_u64(*seed),
                )?;
                source.generate(*len, &mut StdRng::seed_from_u64(*stream))?
            }
        };

        Ok(dataset)
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::InlineSample;
    use machine_learning::dataset::{DType, Dataset, Tensor};

    #[test]
    fn inline_datasets_keep_their_samples() {
        let config = DatasetConfig::Inline {
            shape: vec![1, 2, 1],
            num_classes: 2,
            samples: vec![
                InlineSample {
                    data: vec![0, 255],
                    label: 1,
                },
                InlineSample {
                    data: vec![3, 4],
                    label: 0,
                },
            ],
        };

        let dataset = Adapter::new().adapt_dataset(&config).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.sample_shape(), &[1, 2, 1]);

        let sample = dataset.get(0).unwrap();
        assert_eq!(sample.label, 1);
        assert_eq!(sample.data.dtype(), DType::U8);
    }

    #[test]
    fn synthetic_partitions_share_prototypes() {
        let partition = |stream| DatasetConfig::Synthetic {
            len: 6,
            shape: vec![2, 2, 3],
            num_classes: 3,
            seed: 5,
            stream,
            noise: 0.,
        };

        let adapter = Adapter::new();
        let a = adapter.adapt_dataset(&partition(0)).unwrap();
        let b = adapter.adapt_dataset(&partition(1)).unwrap();

        // Without noise every sample is its class prototype.
        assert_eq!(a.get(4).unwrap(), b.get(1).unwrap());
        assert_eq!(a.num_classes(), 3);
    }

    #[test]
    fn ops_are_applied_in_order() {
        let adapter = Adapter::new();
        let op = adapter.adapt_ops(&[
            OpConfig::Vectorize,
            OpConfig::TypeCast { dtype: DType::F32 },
            OpConfig::Mul { value: 2. },
            OpConfig::Add { value: 1. },
        ]);

        let sample = Tensor::U8(ArrayD::from_elem(IxDyn(&[2, 2]), 3));
        let row = op(sample).unwrap().to_row().unwrap();
        assert_eq!(row.to_vec(), [7.; 4]);
    }
}
