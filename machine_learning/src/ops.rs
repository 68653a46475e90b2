//! Preprocessing operations applied to one sample at a time.
//!
//! Every op is a pure function from a `Tensor` to a `Tensor`. Ops compose with `chain`,
//! which applies them in order, so `chain([add(1.), mul(2.)])` differs from
//! `chain([mul(2.), add(1.)])`.

use std::sync::Arc;

use crate::{
    MlErr, Result,
    dataset::{DType, Tensor},
};

/// A preprocessing operation.
pub type Op = Arc<dyn Fn(Tensor) -> Result<Tensor> + Send + Sync>;

/// Wraps a closure into an `Op`.
pub fn op<F>(f: F) -> Op
where
    F: Fn(Tensor) -> Result<Tensor> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Chains `ops` into a single op that applies them sequentially.
///
/// An empty chain is the identity.
pub fn chain<I>(ops: I) -> Op
where
    I: IntoIterator<Item = Op>,
{
    let ops: Vec<Op> = ops.into_iter().collect();
    op(move |sample| ops.iter().try_fold(sample, |sample, f| f(sample)))
}

/// Flattens a sample into a one dimensional vector.
pub fn vectorize() -> Op {
    op(|sample| Ok(sample.flatten()))
}

/// Converts the sample's elements to `dtype`.
pub fn type_cast(dtype: DType) -> Op {
    op(move |sample| Ok(sample.cast(dtype)))
}

/// Adds `value` to every element.
pub fn add(value: f64) -> Op {
    op(move |sample| Ok(sample.map_float(|x| x + value)))
}

/// Multiplies every element by `value`.
pub fn mul(value: f64) -> Op {
    op(move |sample| Ok(sample.map_float(|x| x * value)))
}

/// Turns an H×W×C sample into a C×H×W one.
///
/// Fails with a shape error if the sample is not three dimensional.
pub fn hwc2chw() -> Op {
    op(|sample| sample.permute(&[2, 0, 1]))
}

/// Mirrors an H×W×C sample horizontally.
///
/// Fails with a shape error if the sample is not three dimensional.
pub fn hflip() -> Op {
    op(|sample| {
        if sample.ndim() != 3 {
            return Err(MlErr::DimensionMismatch {
                what: "sample",
                got: sample.ndim(),
                expected: 3,
            });
        }

        sample.invert_axis(1)
    })
}

/// The chain used to feed raw `u8` images to a linear classifier: flatten, cast to
/// `f32` and map `[0, 255]` onto `[-1, 1]`.
pub fn normalize_u8_images() -> Op {
    chain([
        vectorize(),
        type_cast(DType::F32),
        add(-127.5),
        mul(1. / 127.5),
    ])
}
