mod cross_entropy;

pub use cross_entropy::CrossEntropy;

use ndarray::{Array2, ArrayView1, ArrayView2};

/// A loss over raw class scores.
///
/// Implementors may assume that `labels` has one entry per row of `scores` and that every
/// label is a valid column index.
pub trait LossFn {
    /// The mean loss of the batch.
    fn loss(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> f32;

    /// The derivative of `loss` with respect to `scores`.
    fn loss_prime(&self, scores: ArrayView2<f32>, labels: ArrayView1<usize>) -> Array2<f32>;
}
