use ndarray::{Array1, ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The element type of a `Tensor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    U8,
    F32,
    F64,
}

/// The feature array of a single sample.
///
/// Raw images arrive as `U8` and are turned into `F32` vectors by the preprocessing ops.
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    U8(ArrayD<u8>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl Tensor {
    /// Returns the element type of this tensor.
    pub fn dtype(&self) -> DType {
        match self {
            Tensor::U8(_) => DType::U8,
            Tensor::F32(_) => DType::F32,
            Tensor::F64(_) => DType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::U8(a) => a.shape(),
            Tensor::F32(a) => a.shape(),
            Tensor::F64(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Returns the total amount of elements.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the tensor into one axis following its logical (row major) order.
    pub fn flatten(self) -> Self {
        fn flat<T: Copy>(a: ArrayD<T>) -> ArrayD<T> {
            a.iter().copied().collect::<Array1<T>>().into_dyn()
        }

        match self {
            Tensor::U8(a) => Tensor::U8(flat(a)),
            Tensor::F32(a) => Tensor::F32(flat(a)),
            Tensor::F64(a) => Tensor::F64(flat(a)),
        }
    }

    /// Converts the elements to `dtype`.
    ///
    /// Values are kept up to the precision of the target type, conversions into `U8`
    /// saturate at the ends of its range.
    pub fn cast(self, dtype: DType) -> Self {
        match (self, dtype) {
            (t @ Tensor::U8(_), DType::U8) => t,
            (t @ Tensor::F32(_), DType::F32) => t,
            (t @ Tensor::F64(_), DType::F64) => t,
            (Tensor::U8(a), DType::F32) => Tensor::F32(a.mapv(f32::from)),
            (Tensor::U8(a), DType::F64) => Tensor::F64(a.mapv(f64::from)),
            (Tensor::F32(a), DType::U8) => Tensor::U8(a.mapv(|x| x as u8)),
            (Tensor::F32(a), DType::F64) => Tensor::F64(a.mapv(f64::from)),
            (Tensor::F64(a), DType::U8) => Tensor::U8(a.mapv(|x| x as u8)),
            (Tensor::F64(a), DType::F32) => Tensor::F32(a.mapv(|x| x as f32)),
        }
    }

    /// Applies `f` to every element.
    ///
    /// Integer tensors are promoted to `F64` first so the result never wraps around.
    pub fn map_float<F>(self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        match self {
            Tensor::U8(a) => Tensor::F64(a.mapv(|x| f(f64::from(x)))),
            Tensor::F32(a) => Tensor::F32(a.mapv_into(|x| f(f64::from(x)) as f32)),
            Tensor::F64(a) => Tensor::F64(a.mapv_into(f)),
        }
    }

    /// Reorders the axes, `axes[i]` being the old axis that becomes axis `i`.
    ///
    /// # Errors
    /// `MlErr::DimensionMismatch` if `axes` does not name every axis of the tensor.
    pub fn permute(self, axes: &[usize]) -> Result<Self> {
        if axes.len() != self.ndim() {
            return Err(MlErr::DimensionMismatch {
                what: "sample",
                got: self.ndim(),
                expected: axes.len(),
            });
        }

        fn permute<T: Clone>(a: ArrayD<T>, axes: &[usize]) -> ArrayD<T> {
            a.permuted_axes(IxDyn(axes))
                .as_standard_layout()
                .into_owned()
        }

        Ok(match self {
            Tensor::U8(a) => Tensor::U8(permute(a, axes)),
            Tensor::F32(a) => Tensor::F32(permute(a, axes)),
            Tensor::F64(a) => Tensor::F64(permute(a, axes)),
        })
    }

    /// Mirrors the tensor along `axis`.
    ///
    /// # Errors
    /// `MlErr::DimensionMismatch` if the tensor has no such axis.
    pub fn invert_axis(self, axis: usize) -> Result<Self> {
        if axis >= self.ndim() {
            return Err(MlErr::DimensionMismatch {
                what: "sample",
                got: self.ndim(),
                expected: axis + 1,
            });
        }

        fn invert<T: Clone>(mut a: ArrayD<T>, axis: usize) -> ArrayD<T> {
            a.invert_axis(Axis(axis));
            a.as_standard_layout().into_owned()
        }

        Ok(match self {
            Tensor::U8(a) => Tensor::U8(invert(a, axis)),
            Tensor::F32(a) => Tensor::F32(invert(a, axis)),
            Tensor::F64(a) => Tensor::F64(invert(a, axis)),
        })
    }

    /// Returns the elements of a one dimensional tensor as `f32`.
    ///
    /// # Errors
    /// `MlErr::DimensionMismatch` if the tensor was not vectorized.
    pub fn to_row(&self) -> Result<Array1<f32>> {
        if self.ndim() != 1 {
            return Err(MlErr::DimensionMismatch {
                what: "batch row",
                got: self.ndim(),
                expected: 1,
            });
        }

        let row = match self {
            Tensor::U8(a) => a.iter().map(|&x| f32::from(x)).collect(),
            Tensor::F32(a) => a.iter().copied().collect(),
            Tensor::F64(a) => a.iter().map(|&x| x as f32).collect(),
        };

        Ok(row)
    }
}

impl From<ArrayD<u8>> for Tensor {
    fn from(value: ArrayD<u8>) -> Self {
        Tensor::U8(value)
    }
}

impl From<ArrayD<f32>> for Tensor {
    fn from(value: ArrayD<f32>) -> Self {
        Tensor::F32(value)
    }
}

impl From<ArrayD<f64>> for Tensor {
    fn from(value: ArrayD<f64>) -> Self {
        Tensor::F64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn hwc() -> Tensor {
        // 2x2 image, 3 channels: value = 100 * h + 10 * w + c
        let data = (0..2)
            .flat_map(|h| (0..2).flat_map(move |w| (0..3).map(move |c| 100 * h + 10 * w + c)))
            .map(|v| v as u8)
            .collect();

        Tensor::U8(ArrayD::from_shape_vec(IxDyn(&[2, 2, 3]), data).unwrap())
    }

    #[test]
    fn flatten_keeps_row_major_order() {
        let flat = hwc().flatten();
        assert_eq!(flat.shape(), &[12]);

        let Tensor::U8(a) = flat else {
            panic!("dtype changed");
        };
        assert_eq!(a.as_slice().unwrap()[..4], [0, 1, 2, 10]);
    }

    #[test]
    fn cast_preserves_values() {
        let t = hwc().cast(DType::F32);
        assert_eq!(t.dtype(), DType::F32);

        let Tensor::F32(a) = t else {
            panic!("cast did not produce f32");
        };
        assert_eq!(a[[1, 1, 2]], 112.0);
    }

    #[test]
    fn cast_into_u8_saturates() {
        let t = Tensor::F64(ArrayD::from_shape_vec(IxDyn(&[2]), vec![-3.0, 300.0]).unwrap());
        let Tensor::U8(a) = t.cast(DType::U8) else {
            panic!("cast did not produce u8");
        };
        assert_eq!(a.as_slice().unwrap(), &[0, 255]);
    }

    #[test]
    fn map_float_promotes_integers() {
        let t = hwc().map_float(|x| x - 200.0);
        assert_eq!(t.dtype(), DType::F64);

        let Tensor::F64(a) = t else {
            panic!("u8 was not promoted");
        };
        assert_eq!(a[[0, 0, 0]], -200.0);
    }

    #[test]
    fn permute_moves_channels_first() {
        let t = hwc().permute(&[2, 0, 1]).unwrap();
        assert_eq!(t.shape(), &[3, 2, 2]);

        let Tensor::U8(a) = t else {
            panic!("dtype changed");
        };
        assert_eq!(a[[2, 1, 0]], 102);
    }

    #[test]
    fn permute_rejects_wrong_rank() {
        let err = hwc().flatten().permute(&[2, 0, 1]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn to_row_requires_vectorized_tensor() {
        assert!(hwc().to_row().is_err());
        assert_eq!(hwc().flatten().to_row().unwrap().len(), 12);
    }
}
