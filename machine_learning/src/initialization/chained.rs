use super::ParamGen;

/// A parameter generator that delegates to a sequence of generators.
///
/// Each generator is drained before moving on to the next one, so a chain can give
/// every region of a packed parameter buffer its own initialization.
pub struct ChainedParamGen {
    param_gens: Vec<Box<dyn ParamGen>>,
    curr: usize,
}

impl ChainedParamGen {
    /// Creates a new `ChainedParamGen`.
    ///
    /// # Arguments
    /// * `param_gens` - The generators, in the order they are drained.
    pub fn new(param_gens: Vec<Box<dyn ParamGen>>) -> Self {
        Self {
            param_gens,
            curr: 0,
        }
    }
}

impl ParamGen for ChainedParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        let mut sample = Vec::with_capacity(n);

        while sample.len() < n && self.curr < self.param_gens.len() {
            match self.param_gens[self.curr].sample(n - sample.len()) {
                Some(values) if !values.is_empty() => sample.extend(values),
                _ => self.curr += 1,
            }
        }

        (!sample.is_empty()).then_some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::{super::ConstParamGen, *};

    fn consts(values: &[(f32, usize)]) -> Vec<Box<dyn ParamGen>> {
        values
            .iter()
            .map(|&(value, limit)| Box::new(ConstParamGen::new(value, limit)) as Box<dyn ParamGen>)
            .collect()
    }

    #[test]
    fn empty() {
        let mut param_gen = ChainedParamGen::new(vec![]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn crosses_generator_boundaries() {
        let mut param_gen = ChainedParamGen::new(consts(&[(0., 1), (1., 3)]));

        assert_eq!(param_gen.sample(2).unwrap(), [0., 1.]);
        assert_eq!(param_gen.sample(2).unwrap(), [1., 1.]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn nests() {
        let mut param_gens = consts(&[(0., 1)]);
        param_gens.push(Box::new(ChainedParamGen::new(consts(&[(1., 1), (2., 1)]))));
        param_gens.extend(consts(&[(3., 1)]));

        let mut param_gen = ChainedParamGen::new(param_gens);
        assert_eq!(param_gen.sample(4).unwrap(), [0., 1., 2., 3.]);
        assert!(param_gen.sample(1).is_none());
    }
}
