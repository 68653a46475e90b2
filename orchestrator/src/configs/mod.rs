mod adapter;
mod dataset;
mod ops;
mod search;

pub use adapter::Adapter;
pub use dataset::{DatasetConfig, InlineSample};
pub use ops::OpConfig;
pub use search::SearchConfig;
