use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::LossFn;

/// Softmax cross entropy, averaged over the batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }

    /// Row wise softmax of `scores`.
    ///
    /// Each row is shifted by its maximum before exponentiating so large scores don't
    /// overflow.
    pub fn softmax(scores: ArrayView2<f32>) -> Array2<f32> {
        let mut probs = scores.to_owned();

        for mut row in probs.axis_iter_mut(Axis(0)) {
            let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
            row.mapv_inplace(|x| (x - max).exp());

            let sum = row.sum();
            row.mapv_inplace(|x| x / sum);
        }

        probs
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> f32 {
        if scores.nrows() == 0 {
            return 0.;
        }

        let total: f32 = scores
            .axis_iter(Axis(0))
            .zip(labels)
            .map(|(row, &label)| {
                let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
                let log_sum_exp = row.fold(0., |acc, &x| acc + (x - max).exp()).ln() + max;
                log_sum_exp - row[label]
            })
            .sum();

        total / scores.nrows() as f32
    }

    fn loss_prime(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> Array2<f32> {
        let mut d = Self::softmax(scores);

        for (mut row, &label) in d.axis_iter_mut(Axis(0)).zip(labels) {
            row[label] -= 1.;
        }

        let n = scores.nrows().max(1) as f32;
        d.mapv_inplace(|x| x / n);
        d
    }
}
