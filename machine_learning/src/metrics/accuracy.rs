use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

use ndarray::ArrayView1;

use crate::{MlErr, Result};

/// Running classification accuracy.
///
/// Accumulators compare by their accuracy: `a > b` holds only if `a` is strictly more
/// accurate, so two accumulators with the same accuracy are not ordered either way and a
/// caller selecting the best one has to choose its own tie break.
#[derive(Debug, Default, Clone, Copy)]
pub struct Accuracy {
    correct: u64,
    total: u64,
}

impl Accuracy {
    /// Returns a new `Accuracy` with no observations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates a batch of predictions.
    ///
    /// # Arguments
    /// * `predicted` - The predicted class of every sample.
    /// * `truth` - The actual class of every sample.
    ///
    /// # Errors
    /// `MlErr::ShapeMismatch` if the two sequences have different lengths, in which case
    /// nothing is accumulated.
    pub fn update(&mut self, predicted: ArrayView1<usize>, truth: ArrayView1<usize>) -> Result<()> {
        if predicted.len() != truth.len() {
            return Err(MlErr::ShapeMismatch {
                what: "predictions",
                got: predicted.len(),
                expected: truth.len(),
            });
        }

        let hits = predicted.iter().zip(&truth).filter(|(p, t)| p == t).count();
        self.correct += hits as u64;
        self.total += truth.len() as u64;
        Ok(())
    }

    /// The ratio of correct predictions, `0` if nothing was observed yet.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.;
        }

        self.correct as f64 / self.total as f64
    }

    /// Forgets every observation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn correct(&self) -> u64 {
        self.correct
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether this accumulator is strictly more accurate than `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self > other
    }
}

impl PartialEq for Accuracy {
    fn eq(&self, other: &Self) -> bool {
        self.accuracy() == other.accuracy()
    }
}

impl PartialOrd for Accuracy {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.accuracy().partial_cmp(&other.accuracy())
    }
}

impl Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "accuracy: {:.3}", self.accuracy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn with(correct: usize, total: usize) -> Accuracy {
        let predicted = ndarray::Array1::from_elem(total, 1);
        let truth = ndarray::Array1::from_shape_fn(total, |i| (i < correct) as usize);

        let mut accuracy = Accuracy::new();
        accuracy.update(predicted.view(), truth.view()).unwrap();
        accuracy
    }

    #[test]
    fn counts_matches() {
        let mut accuracy = Accuracy::new();
        accuracy.update(array![1, 1, 1].view(), array![1, 1, 0].view()).unwrap();

        assert_eq!(accuracy.correct(), 2);
        assert_eq!(accuracy.total(), 3);
        assert!((accuracy.accuracy() - 2. / 3.).abs() < 1e-12);
        assert_eq!(accuracy.to_string(), "accuracy: 0.667");
    }

    #[test]
    fn accumulates_across_updates() {
        let mut accuracy = Accuracy::new();
        accuracy.update(array![0, 1].view(), array![0, 1].view()).unwrap();
        accuracy.update(array![0, 1].view(), array![1, 0].view()).unwrap();

        assert_eq!(accuracy.accuracy(), 0.5);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(Accuracy::new().accuracy(), 0.);
        assert!(!Accuracy::new().is_better_than(&Accuracy::new()));
    }

    #[test]
    fn length_mismatch_fails_without_accumulating() {
        let mut accuracy = Accuracy::new();
        let err = accuracy.update(array![1, 1].view(), array![1].view()).unwrap_err();

        assert!(err.is_shape());
        assert_eq!(accuracy.total(), 0);
    }

    #[test]
    fn orders_by_accuracy() {
        let better = with(9, 10);
        let worse = with(8, 10);

        assert!(better > worse);
        assert!(better.is_better_than(&worse));
        assert!(!worse.is_better_than(&better));
    }

    #[test]
    fn equal_accuracies_are_not_ordered() {
        let a = with(4, 5);
        let b = with(8, 10);

        assert!(!a.is_better_than(&b));
        assert!(!b.is_better_than(&a));
        assert_eq!(a, b);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut accuracy = with(3, 4);
        accuracy.reset();

        assert_eq!(accuracy.total(), 0);
        assert_eq!(accuracy.accuracy(), 0.);
    }
}
