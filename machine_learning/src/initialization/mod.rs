//! Initial values for a model's parameters.
//!
//! Generators hand out values in chunks until they are exhausted, which lets a model
//! initialize its packed parameter buffer piece by piece: the weights from one
//! generator and the biases from the next.

mod chained;
mod constant;
mod random;

pub use chained::ChainedParamGen;
pub use constant::ConstParamGen;
pub use random::RandParamGen;

/// A `ParamGen` generates values for the initial state of the model's parameters.
pub trait ParamGen {
    /// Samples at most `n` parameters.
    ///
    /// # Returns
    /// `None` once the generator is exhausted.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;

    /// Fills `params` with as many values as the generator can provide.
    ///
    /// # Returns
    /// The amount of parameters written.
    fn fill(&mut self, params: &mut [f32]) -> usize {
        let mut written = 0;

        while written < params.len() {
            let Some(values) = self.sample(params.len() - written) else {
                break;
            };

            params[written..written + values.len()].copy_from_slice(&values);
            written += values.len();
        }

        written
    }
}
