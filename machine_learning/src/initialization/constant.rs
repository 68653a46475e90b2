use super::ParamGen;

/// A parameter generator that always generates the same value.
#[derive(Debug, Clone)]
pub struct ConstParamGen {
    value: f32,
    remaining: usize,
}

impl ConstParamGen {
    /// Creates a new `ConstParamGen`.
    ///
    /// # Arguments
    /// * `value` - The value to always generate.
    /// * `limit` - The maximum amount of times to generate that value.
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            remaining: limit,
        }
    }
}

impl ParamGen for ConstParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;
        Some(vec![self.value; n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_after_limit() {
        let mut param_gen = ConstParamGen::new(1., 10);

        assert_eq!(param_gen.sample(7).unwrap(), vec![1.; 7]);
        assert_eq!(param_gen.sample(7).unwrap(), vec![1.; 3]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn zero_limit_is_empty() {
        let mut param_gen = ConstParamGen::new(1., 0);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn fill_stops_when_exhausted() {
        let mut params = [9.; 4];
        let written = ConstParamGen::new(0., 3).fill(&mut params);

        assert_eq!(written, 3);
        assert_eq!(params, [0., 0., 0., 9.]);
    }
}
