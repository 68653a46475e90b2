use crate::Result;

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates the parameters according to the algorithm's learning rule.
    ///
    /// # Arguments
    /// * `grad` - The gradient of the loss with respect to `params`.
    /// * `params` - The parameters that are going to be modified.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad`, `params` and the
    /// optimizer's own state.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;
}
