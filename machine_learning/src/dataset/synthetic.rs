use ndarray::{ArrayD, IxDyn, Zip};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::{Normal, Uniform};

use super::{InMemoryDataset, Sample};
use crate::{MlErr, Result};

/// A source of `u8` image datasets where every class is a noisy copy of its own
/// prototype image.
///
/// Datasets generated by the same `SyntheticImages` share the prototypes, so they can
/// serve as the train, validation and test partitions of one problem. With a moderate
/// noise the classes are linearly separable.
#[derive(Debug, Clone)]
pub struct SyntheticImages {
    shape: Vec<usize>,
    prototypes: Vec<ArrayD<f32>>,
    noise: Normal<f32>,
}

impl SyntheticImages {
    /// Creates a new `SyntheticImages` source.
    ///
    /// # Arguments
    /// * `shape` - The shape of each sample, e.g. `[32, 32, 3]`.
    /// * `num_classes` - The amount of classes.
    /// * `noise` - Standard deviation of the per pixel gaussian noise.
    /// * `rng` - Source of randomness for the prototypes.
    ///
    /// # Errors
    /// `MlErr::InvalidConfig` if the shape is empty or has a zero length axis, there are
    /// no classes or the noise is negative.
    pub fn new<R: Rng>(shape: &[usize], num_classes: usize, noise: f32, rng: &mut R) -> Result<Self> {
        if shape.is_empty() || shape.contains(&0) {
            return Err(MlErr::InvalidConfig(format!(
                "invalid synthetic sample shape {shape:?}"
            )));
        }

        if num_classes == 0 {
            return Err(MlErr::InvalidConfig(
                "a dataset needs at least one class".into(),
            ));
        }

        let pixels = Uniform::new(0f32, 255.).map_err(|e| MlErr::InvalidConfig(e.to_string()))?;
        let noise = Normal::new(0f32, noise).map_err(|e| MlErr::InvalidConfig(e.to_string()))?;

        let prototypes = (0..num_classes)
            .map(|_| ArrayD::random_using(IxDyn(shape), &pixels, rng))
            .collect();

        Ok(Self {
            shape: shape.to_vec(),
            prototypes,
            noise,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.prototypes.len()
    }

    /// Generates `len` samples.
    ///
    /// Labels are assigned round robin so every class gets the same amount of samples,
    /// give or take one.
    pub fn generate<R: Rng>(&self, len: usize, rng: &mut R) -> Result<InMemoryDataset> {
        let shape = IxDyn(&self.shape);

        let samples = (0..len)
            .map(|i| {
                let label = i % self.prototypes.len();
                let jitter = ArrayD::random_using(shape.clone(), &self.noise, rng);

                let mut data = ArrayD::<u8>::zeros(shape.clone());
                Zip::from(&mut data)
                    .and(&self.prototypes[label])
                    .and(&jitter)
                    .for_each(|d, &p, &j| *d = (p + j).clamp(0., 255.) as u8);

                Sample::new(data, label)
            })
            .collect();

        InMemoryDataset::new(samples, self.prototypes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use rand::{SeedableRng, rngs::StdRng};

    fn source(seed: u64) -> SyntheticImages {
        SyntheticImages::new(&[4, 4, 3], 2, 8., &mut StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn generates_balanced_labels() {
        let ds = source(42).generate(10, &mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(ds.len(), 10);
        assert_eq!(ds.num_classes(), 2);
        assert_eq!(ds.sample_shape(), &[4, 4, 3]);

        let ones = (0..ds.len())
            .filter(|&i| ds.get(i).unwrap().label == 1)
            .count();
        assert_eq!(ones, 5);
    }

    #[test]
    fn same_seeds_same_data() {
        let a = source(7).generate(4, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = source(7).generate(4, &mut StdRng::seed_from_u64(1)).unwrap();

        for i in 0..4 {
            assert_eq!(a.get(i).unwrap(), b.get(i).unwrap());
        }
    }

    #[test]
    fn partitions_differ_but_share_prototypes() {
        let source = source(7);
        let a = source.generate(2, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = source.generate(2, &mut StdRng::seed_from_u64(2)).unwrap();

        assert_ne!(a.get(0).unwrap(), b.get(0).unwrap());
        assert_eq!(a.get(0).unwrap().label, b.get(0).unwrap().label);
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);

        assert!(SyntheticImages::new(&[], 2, 8., &mut rng).is_err());
        assert!(SyntheticImages::new(&[2, 0], 2, 8., &mut rng).is_err());
        assert!(SyntheticImages::new(&[2], 0, 8., &mut rng).is_err());
        assert!(SyntheticImages::new(&[2], 2, -1., &mut rng).is_err());
    }
}
