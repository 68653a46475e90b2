mod linear;

pub use linear::LinearClassifier;
