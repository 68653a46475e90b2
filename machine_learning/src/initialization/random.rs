use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::ParamGen;
use crate::{MlErr, Result};

/// A parameter generator that draws from a probability distribution.
///
/// The random number generator is shared so that several generators in a chain advance
/// the same stream, keeping a seeded initialization reproducible.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
    remaining: usize,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen`.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(rng: Rc<RefCell<R>>, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<R: Rng> RandParamGen<R, Normal<f32>> {
    /// Creates a new `RandParamGen` with a normal distribution.
    ///
    /// # Errors
    /// `MlErr::InvalidConfig` if `std_dev` is negative or not finite.
    pub fn normal(rng: Rc<RefCell<R>>, limit: usize, mean: f32, std_dev: f32) -> Result<Self> {
        let distribution =
            Normal::new(mean, std_dev).map_err(|e| MlErr::InvalidConfig(e.to_string()))?;
        Ok(Self::new(rng, distribution, limit))
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;

        let mut rng = self.rng.borrow_mut();
        Some((0..n).map(|_| self.distribution.sample(&mut *rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seeded_rng(seed: u64) -> Rc<RefCell<StdRng>> {
        Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn respects_limit() {
        let mut param_gen = RandParamGen::normal(seeded_rng(42), 10, 0., 1.).unwrap();

        assert_eq!(param_gen.sample(7).unwrap().len(), 7);
        assert_eq!(param_gen.sample(7).unwrap().len(), 3);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn same_seed_same_values() {
        let a = RandParamGen::normal(seeded_rng(3), 8, 0., 0.5).unwrap().sample(8);
        let b = RandParamGen::normal(seeded_rng(3), 8, 0., 0.5).unwrap().sample(8);
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_distributions_are_rejected() {
        assert!(RandParamGen::normal(seeded_rng(0), 1, 0., -1.).is_err());
        assert!(RandParamGen::normal(seeded_rng(0), 1, 0., f32::NAN).is_err());
    }
}
