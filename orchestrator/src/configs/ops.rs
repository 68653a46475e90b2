use machine_learning::dataset::DType;
use serde::{Deserialize, Serialize};

/// One stage of the preprocessing chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpConfig {
    Vectorize,
    TypeCast { dtype: DType },
    Add { value: f64 },
    Mul { value: f64 },
    Hwc2chw,
    Hflip,
}

impl OpConfig {
    /// Flatten, cast to `f32` and map `[0, 255]` onto `[-1, 1]`.
    pub fn default_chain() -> Vec<Self> {
        vec![
            Self::Vectorize,
            Self::TypeCast { dtype: DType::F32 },
            Self::Add { value: -127.5 },
            Self::Mul { value: 1. / 127.5 },
        ]
    }
}
