//! Numeric core: datasets, preprocessing, batching, a linear classifier and its training
//! machinery, and accuracy metrics.

pub mod batches;
pub mod dataset;
pub mod error;
pub mod initialization;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod ops;
pub mod optimization;

pub use error::{MlErr, Result};
