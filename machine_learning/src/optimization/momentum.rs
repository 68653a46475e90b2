use super::Optimizer;
use crate::{MlErr, Result};

/// Gradient descent with (optionally Nesterov) momentum.
///
/// Keeps one velocity entry per parameter, starting at zero. Each update computes
/// `v = momentum * v - learning_rate * grad` and then moves the parameters by `v`, or by
/// the look ahead step `momentum * v - learning_rate * grad` when Nesterov is enabled.
#[derive(Debug, Clone)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    nesterov: bool,
    velocity: Box<[f32]>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - The decay of the velocity between updates.
    /// * `nesterov` - Whether to use the Nesterov look ahead step.
    ///
    /// # Returns
    /// A new `GradientDescentWithMomentum` instance.
    pub fn new(len: usize, learning_rate: f32, momentum: f32, nesterov: bool) -> Self {
        Self {
            learning_rate,
            momentum,
            nesterov,
            velocity: vec![0.; len].into_boxed_slice(),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn nesterov(&self) -> bool {
        self.nesterov
    }

    /// Returns the current velocity.
    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        let expected = self.velocity.len();

        for (what, got) in [("gradient", grad.len()), ("parameters", params.len())] {
            if got != expected {
                return Err(MlErr::ShapeMismatch {
                    what,
                    got,
                    expected,
                });
            }
        }

        let lr = self.learning_rate;
        let mu = self.momentum;
        let nesterov = self.nesterov;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.velocity.iter_mut())
            .for_each(|((p, g), v)| {
                *v = mu * *v - lr * g;

                if nesterov {
                    *p += mu * *v - lr * g;
                } else {
                    *p += *v;
                }
            });

        Ok(())
    }
}
