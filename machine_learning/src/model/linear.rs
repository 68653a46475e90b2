use std::{cell::RefCell, rc::Rc};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, linalg};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    MlErr, Result,
    initialization::{ChainedParamGen, ConstParamGen, ParamGen, RandParamGen},
    loss::{CrossEntropy, LossFn},
    optimization::{GradientDescentWithMomentum, Optimizer},
};

/// Standard deviation of the initial weights.
const INIT_STD_DEV: f32 = 1e-2;

/// Seed used by `LinearClassifier::new`.
const DEFAULT_SEED: u64 = 0x5eed;

/// A linear map from feature vectors to class scores, trained with softmax cross entropy
/// and gradient descent with momentum.
///
/// The parameters live in one packed buffer, the `input_dim × num_classes` weights
/// first and the `num_classes` biases after them, so a single optimizer (and a single
/// velocity buffer) covers both.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    input_dim: usize,
    num_classes: usize,
    params: Box<[f32]>,
    grad: Box<[f32]>,
    loss_fn: CrossEntropy,
    optimizer: GradientDescentWithMomentum,
}

impl LinearClassifier {
    /// Creates a new `LinearClassifier` with a fixed initialization seed.
    ///
    /// # Arguments
    /// * `input_dim` - The length of the feature vectors.
    /// * `num_classes` - The amount of classes to score.
    /// * `learning_rate` - The step size of every update.
    /// * `momentum` - The decay of the velocity between updates.
    /// * `nesterov` - Whether to use the Nesterov look ahead step.
    ///
    /// # Errors
    /// `MlErr::InvalidConfig` if a dimension is zero, the learning rate is not a positive
    /// finite number or the momentum is negative or not finite.
    pub fn new(
        input_dim: usize,
        num_classes: usize,
        learning_rate: f32,
        momentum: f32,
        nesterov: bool,
    ) -> Result<Self> {
        Self::seeded(
            input_dim,
            num_classes,
            learning_rate,
            momentum,
            nesterov,
            DEFAULT_SEED,
        )
    }

    /// Creates a new `LinearClassifier` whose initial weights are drawn from `seed`.
    ///
    /// Weights start as small gaussian noise, biases and velocity start at zero.
    pub fn seeded(
        input_dim: usize,
        num_classes: usize,
        learning_rate: f32,
        momentum: f32,
        nesterov: bool,
        seed: u64,
    ) -> Result<Self> {
        if input_dim == 0 || num_classes == 0 {
            return Err(MlErr::InvalidConfig(format!(
                "classifier dimensions must be positive, got {input_dim} inputs and {num_classes} classes"
            )));
        }

        if !learning_rate.is_finite() || learning_rate <= 0. {
            return Err(MlErr::InvalidConfig(format!(
                "learning rate must be positive and finite, got {learning_rate}"
            )));
        }

        if !momentum.is_finite() || momentum < 0. {
            return Err(MlErr::InvalidConfig(format!(
                "momentum must be non negative and finite, got {momentum}"
            )));
        }

        let w_size = input_dim * num_classes;
        let size = w_size + num_classes;

        let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(seed)));
        let param_gens: Vec<Box<dyn ParamGen>> = vec![
            Box::new(RandParamGen::normal(rng, w_size, 0., INIT_STD_DEV)?),
            Box::new(ConstParamGen::new(0., num_classes)),
        ];
        let mut param_gen = ChainedParamGen::new(param_gens);

        let mut params = vec![0.; size].into_boxed_slice();
        param_gen.fill(&mut params);

        Ok(Self {
            input_dim,
            num_classes,
            params,
            grad: vec![0.; size].into_boxed_slice(),
            loss_fn: CrossEntropy::new(),
            optimizer: GradientDescentWithMomentum::new(size, learning_rate, momentum, nesterov),
        })
    }

    /// Performs one gradient descent step on the given batch.
    ///
    /// # Arguments
    /// * `features` - One feature vector per row, `input_dim` columns wide.
    /// * `labels` - The class of every row.
    ///
    /// # Returns
    /// The mean loss of the batch before the update. An empty batch leaves the classifier
    /// untouched and costs nothing.
    ///
    /// # Errors
    /// A shape error if the batch does not fit the classifier, or
    /// `MlErr::LabelOutOfRange` if a label is not a class index.
    pub fn train(&mut self, features: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<f32> {
        self.check_batch(features, labels)?;

        if labels.is_empty() {
            return Ok(0.);
        }

        let scores = self.scores(features)?;
        let loss = self.loss_fn.loss(scores.view(), labels);
        let d = self.loss_fn.loss_prime(scores.view(), labels);

        let (mut dw, mut db) = view_grad(self.input_dim, self.num_classes, &mut self.grad)?;
        linalg::general_mat_mul(1.0, &features.t(), &d, 0.0, &mut dw);
        db.assign(&d.sum_axis(Axis(0)));

        self.optimizer.update_params(&self.grad, &mut self.params)?;
        Ok(loss)
    }

    /// Predicts the class of every row of `features`.
    ///
    /// Ties between scores go to the lowest class index.
    pub fn predict(&self, features: ArrayView2<f32>) -> Result<Array1<usize>> {
        self.check_features(features)?;

        let scores = self.scores(features)?;
        let predictions = scores
            .axis_iter(Axis(0))
            .map(|row| {
                let mut best = 0;
                for (class, &score) in row.iter().enumerate().skip(1) {
                    if score > row[best] {
                        best = class;
                    }
                }
                best
            })
            .collect();

        Ok(predictions)
    }

    /// The mean loss of the classifier on a batch, without updating it.
    pub fn loss(&self, features: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<f32> {
        self.check_batch(features, labels)?;

        let scores = self.scores(features)?;
        Ok(self.loss_fn.loss(scores.view(), labels))
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.optimizer.learning_rate()
    }

    #[inline]
    pub fn momentum(&self) -> f32 {
        self.optimizer.momentum()
    }

    #[inline]
    pub fn nesterov(&self) -> bool {
        self.optimizer.nesterov()
    }

    /// The packed parameters, weights first.
    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// The `input_dim × num_classes` weight matrix.
    pub fn weights(&self) -> Result<ArrayView2<'_, f32>> {
        view_params(self.input_dim, self.num_classes, &self.params).map(|(w, _)| w)
    }

    /// The bias of every class.
    pub fn bias(&self) -> Result<ArrayView1<'_, f32>> {
        view_params(self.input_dim, self.num_classes, &self.params).map(|(_, b)| b)
    }

    fn scores(&self, features: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (w, b) = view_params(self.input_dim, self.num_classes, &self.params)?;

        let mut z = Array2::zeros((features.nrows(), self.num_classes));
        linalg::general_mat_mul(1.0, &features, &w, 0.0, &mut z);
        z += &b;
        Ok(z)
    }

    fn check_features(&self, features: ArrayView2<f32>) -> Result<()> {
        if features.ncols() != self.input_dim {
            return Err(MlErr::ShapeMismatch {
                what: "features",
                got: features.ncols(),
                expected: self.input_dim,
            });
        }

        Ok(())
    }

    fn check_batch(&self, features: ArrayView2<f32>, labels: ArrayView1<usize>) -> Result<()> {
        self.check_features(features)?;

        if labels.len() != features.nrows() {
            return Err(MlErr::ShapeMismatch {
                what: "labels",
                got: labels.len(),
                expected: features.nrows(),
            });
        }

        if let Some(&label) = labels.iter().find(|&&label| label >= self.num_classes) {
            return Err(MlErr::LabelOutOfRange {
                label,
                num_classes: self.num_classes,
            });
        }

        Ok(())
    }
}

/// Gives a view of the raw parameter slice as the weights and biases of the classifier.
fn view_params(
    input_dim: usize,
    num_classes: usize,
    params: &[f32],
) -> Result<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
    let (w_raw, b_raw) = params.split_at(input_dim * num_classes);
    let size_err = |_| MlErr::ShapeMismatch {
        what: "parameters",
        got: params.len(),
        expected: (input_dim + 1) * num_classes,
    };

    let w = ArrayView2::from_shape((input_dim, num_classes), w_raw).map_err(size_err)?;
    let b = ArrayView1::from_shape(num_classes, b_raw).map_err(size_err)?;
    Ok((w, b))
}

/// Gives a view of the raw gradient slice as the delta weights and delta biases.
fn view_grad(
    input_dim: usize,
    num_classes: usize,
    grad: &mut [f32],
) -> Result<(ArrayViewMut2<'_, f32>, ArrayViewMut1<'_, f32>)> {
    let len = grad.len();
    let size_err = |_| MlErr::ShapeMismatch {
        what: "gradient",
        got: len,
        expected: (input_dim + 1) * num_classes,
    };

    let (dw_raw, db_raw) = grad.split_at_mut(input_dim * num_classes);
    let dw = ArrayViewMut2::from_shape((input_dim, num_classes), dw_raw).map_err(size_err)?;
    let db = ArrayViewMut1::from_shape(num_classes, db_raw).map_err(size_err)?;
    Ok((dw, db))
}
