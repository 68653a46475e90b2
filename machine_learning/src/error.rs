use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    /// A constructor received arguments it cannot work with.
    InvalidConfig(String),
    /// Two lengths that must agree do not.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// An array has a different amount of axes than required.
    DimensionMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A label is not a valid class index.
    LabelOutOfRange { label: usize, num_classes: usize },
    /// A dataset was indexed past its end.
    OutOfBounds { index: usize, len: usize },
}

impl MlErr {
    /// Whether this error is one of the shape related kinds.
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            MlErr::ShapeMismatch { .. } | MlErr::DimensionMismatch { .. }
        )
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::InvalidConfig(msg) => format!("invalid configuration: {msg}"),
            MlErr::ShapeMismatch {
                what,
                got,
                expected,
            } => format!("shape mismatch for {what}: got {got}, expected {expected}"),
            MlErr::DimensionMismatch {
                what,
                got,
                expected,
            } => format!("{what} has {got} dimensions, expected {expected}"),
            MlErr::LabelOutOfRange { label, num_classes } => {
                format!("label {label} is out of range for {num_classes} classes")
            }
            MlErr::OutOfBounds { index, len } => {
                format!("sample index {index} is out of bounds for a dataset of {len} samples")
            }
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {}
